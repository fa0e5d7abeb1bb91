//! The byte-substitution cipher threaded through GEX and DAT containers.
//!
//! A cipher run is defined by a key seed and an additive flag. The seed
//! selects a 256-entry substitution table via a fixed swap schedule; the
//! additive flag mixes the running byte position into every lookup. The
//! stream wrappers here keep their state across region boundaries, because
//! the containers re-key the same cipher mid-stream: a GEX carries its key
//! seed as the first integer *inside* the enciphered body, read through the
//! identity configuration, after which the run is re-initialized in place.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::error::{Error, Result};

/// Seed of the identity configuration. `(seed - 248) mod 250 == 0` with the
/// additive flag clear makes the cipher a pass-through.
pub const IDENTITY_SEED: i32 = 248;

const TABLE_ROUNDS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encode,
    Decode,
}

/// Shared cipher state: seed, additive flag, byte counter, and the
/// substitution table for the stream's direction (a decode stream holds the
/// inverted table).
#[derive(Debug, Clone)]
struct KryptState {
    direction: Direction,
    seed: i32,
    additive: bool,
    counter: u64,
    identical: bool,
    table: [u8; 256],
}

/// Whether a (seed, additive) pair configures the pass-through cipher.
fn is_identity(seed: i32, additive: bool) -> bool {
    seed.wrapping_sub(IDENTITY_SEED) % 250 == 0 && !additive
}

/// Build the encode table for a seed: start from the identity permutation
/// and run the fixed swap schedule.
fn build_table(seed: i32) -> [u8; 256] {
    let a = (seed.rem_euclid(250) + 6) as i64;
    let b = (seed / 250) as i64;

    let mut table = [0u8; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = i as u8;
    }
    for i in 1..=TABLE_ROUNDS {
        let j = (i * a + b).rem_euclid(254) as usize + 1;
        table.swap(j, j + 1);
    }
    table
}

fn invert_table(table: &[u8; 256]) -> [u8; 256] {
    let mut inverse = [0u8; 256];
    for (i, &mapped) in table.iter().enumerate() {
        inverse[mapped as usize] = i as u8;
    }
    inverse
}

impl KryptState {
    fn new(direction: Direction) -> Self {
        let mut state = Self {
            direction,
            seed: IDENTITY_SEED,
            additive: false,
            counter: 0,
            identical: true,
            table: [0u8; 256],
        };
        state.init(IDENTITY_SEED, false);
        state
    }

    /// Re-key the cipher in place. Resets the byte counter; returns whether
    /// the new configuration is the identity (in which case no table is
    /// built and bytes pass through untouched).
    fn init(&mut self, seed: i32, additive: bool) -> bool {
        self.seed = seed;
        self.additive = additive;
        self.counter = 0;
        self.identical = is_identity(seed, additive);
        if self.identical {
            return true;
        }
        self.table = build_table(seed);
        if self.direction == Direction::Decode {
            self.table = invert_table(&self.table);
        }
        false
    }

    fn advance(&mut self, n: u64) {
        self.counter += n;
    }

    /// Encode a chunk in place. The byte at absolute position 0 of a cipher
    /// run is never transformed.
    fn encode(&mut self, buf: &mut [u8]) {
        let start = self.counter;
        if !self.identical {
            for (p, byte) in buf.iter_mut().enumerate() {
                let pos = start + p as u64;
                if pos == 0 {
                    continue;
                }
                *byte = if self.additive {
                    self.table[(*byte as u64).wrapping_add(pos) as u8 as usize]
                } else {
                    self.table[*byte as usize]
                };
            }
        }
        self.counter = start + buf.len() as u64;
    }

    /// Decode a chunk in place; the exact inverse of [`KryptState::encode`]
    /// under the inverted table.
    fn decode(&mut self, buf: &mut [u8]) {
        let start = self.counter;
        if !self.identical {
            for (p, byte) in buf.iter_mut().enumerate() {
                let pos = start + p as u64;
                if pos == 0 {
                    continue;
                }
                let mapped = self.table[*byte as usize];
                *byte = if self.additive {
                    (mapped as u64).wrapping_sub(pos) as u8
                } else {
                    mapped
                };
            }
        }
        self.counter = start + buf.len() as u64;
    }

    /// Apply a seek's logical delta to the byte counter. An additive cipher
    /// is only well-defined going forward; a backward seek past the start of
    /// the run is rejected.
    fn adjust_counter(&mut self, delta: i64) -> Result<()> {
        let target = self.counter as i64 + delta;
        if target < 0 && !self.identical && self.additive {
            return Err(Error::InvalidSeek);
        }
        self.counter = target.max(0) as u64;
        Ok(())
    }
}

/// Decode-direction cipher stream: bytes read through it come out
/// deciphered. Freshly constructed streams are in the identity
/// configuration, ready for a container to read the embedded key seed and
/// re-key in place.
pub struct KryptReader<R> {
    inner: R,
    state: KryptState,
}

impl<R> KryptReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: KryptState::new(Direction::Decode),
        }
    }

    /// Re-key the cipher mid-stream. Returns true when the new
    /// configuration is the identity pass-through.
    pub fn init_state(&mut self, seed: i32, additive: bool) -> bool {
        self.state.init(seed, additive)
    }

    /// Whether the current configuration passes bytes through unmodified.
    pub fn is_identity(&self) -> bool {
        self.state.identical
    }

    /// Bytes transported since the last re-key.
    pub fn byte_counter(&self) -> u64 {
        self.state.counter
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for KryptReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.state.decode(&mut buf[..n]);
        Ok(n)
    }
}

impl<R: Read + Seek> KryptReader<R> {
    /// Seek forward `n` bytes without deciphering them. The byte counter
    /// advances as if the bytes had been read.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.state.adjust_counter(n as i64)?;
        self.inner.seek(SeekFrom::Current(n as i64))?;
        Ok(())
    }
}

impl<R: Read + Seek> Seek for KryptReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let current = self.inner.stream_position()?;
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::Current(delta) => current as i64 + delta,
            SeekFrom::End(delta) => {
                let end = self.inner.seek(SeekFrom::End(0))?;
                self.inner.seek(SeekFrom::Start(current))?;
                end as i64 + delta
            }
        };
        self.state
            .adjust_counter(target - current as i64)
            .map_err(io::Error::other)?;
        self.inner.seek(SeekFrom::Start(target.max(0) as u64))
    }
}

/// Encode-direction cipher stream: bytes written through it land enciphered
/// on the inner stream. Construction and re-keying mirror [`KryptReader`].
pub struct KryptWriter<W> {
    inner: W,
    state: KryptState,
    scratch: Vec<u8>,
}

impl<W> KryptWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            state: KryptState::new(Direction::Encode),
            scratch: Vec::new(),
        }
    }

    /// Re-key the cipher mid-stream. Returns true when the new
    /// configuration is the identity pass-through.
    pub fn init_state(&mut self, seed: i32, additive: bool) -> bool {
        self.state.init(seed, additive)
    }

    /// Whether the current configuration passes bytes through unmodified.
    pub fn is_identity(&self) -> bool {
        self.state.identical
    }

    /// Bytes transported since the last re-key.
    pub fn byte_counter(&self) -> u64 {
        self.state.counter
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for KryptWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.state.identical {
            let n = self.inner.write(buf)?;
            self.state.advance(n as u64);
            return Ok(n);
        }
        self.scratch.clear();
        self.scratch.extend_from_slice(buf);
        self.state.encode(&mut self.scratch);
        self.inner.write_all(&self.scratch)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Seek> Seek for KryptWriter<W> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let current = self.inner.stream_position()?;
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::Current(delta) => current as i64 + delta,
            SeekFrom::End(delta) => {
                let end = self.inner.seek(SeekFrom::End(0))?;
                self.inner.seek(SeekFrom::Start(current))?;
                end as i64 + delta
            }
        };
        self.state
            .adjust_counter(target - current as i64)
            .map_err(io::Error::other)?;
        self.inner.seek(SeekFrom::Start(target.max(0) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_all(seed: i32, additive: bool, data: &[u8]) -> Vec<u8> {
        let mut w = KryptWriter::new(Vec::new());
        w.init_state(seed, additive);
        w.write_all(data).unwrap();
        w.into_inner()
    }

    fn decode_all(seed: i32, additive: bool, data: &[u8]) -> Vec<u8> {
        let mut r = KryptReader::new(data);
        r.init_state(seed, additive);
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn table_is_a_permutation_and_inverse_matches() {
        for seed in [3328, 28927, -4] {
            let forward = build_table(seed);
            let mut seen = [false; 256];
            for &byte in forward.iter() {
                assert!(!seen[byte as usize], "duplicate entry for seed {seed}");
                seen[byte as usize] = true;
            }

            let inverse = invert_table(&forward);
            for i in 0..256 {
                assert_eq!(inverse[forward[i] as usize] as usize, i);
            }
        }
    }

    #[test]
    fn identity_seeds_pass_through() {
        let data: Vec<u8> = (0..=255).collect();
        for seed in [248, 498, -2] {
            assert!(is_identity(seed, false));
            assert_eq!(encode_all(seed, false, &data), data);
        }
        // The additive flag defeats the identity reduction.
        assert!(!is_identity(248, true));
    }

    #[test]
    fn round_trip_across_seeds_and_modes() {
        let data: Vec<u8> = (0u16..1000).map(|i| (i * 7 + 13) as u8).collect();
        for seed in [248, 3328, 28927, -4] {
            for additive in [false, true] {
                let encoded = encode_all(seed, additive, &data);
                assert_eq!(decode_all(seed, additive, &encoded), data);
            }
        }
    }

    #[test]
    fn first_byte_is_exempt() {
        for seed in [3328, 28927] {
            for additive in [false, true] {
                let encoded = encode_all(seed, additive, &[10, 20, 30, 40]);
                assert_eq!(encoded[0], 10);
            }
        }
    }

    #[test]
    fn substitution_matches_the_table() {
        let table = build_table(3328);
        let encoded = encode_all(3328, false, &[10, 20, 30, 40]);
        assert_eq!(
            encoded,
            [
                10,
                table[20_usize],
                table[30_usize],
                table[40_usize],
            ]
        );
    }

    #[test]
    fn rekeying_restarts_the_run() {
        let mut w = KryptWriter::new(Vec::new());
        w.init_state(3328, false);
        w.write_all(&[1, 2, 3]).unwrap();
        assert_eq!(w.byte_counter(), 3);

        w.init_state(28927, false);
        assert_eq!(w.byte_counter(), 0);
        w.write_all(&[10, 20]).unwrap();

        let out = w.into_inner();
        // First byte after the re-key is exempt again.
        assert_eq!(out[3], 10);
        assert_eq!(out[4], build_table(28927)[20_usize]);
    }

    #[test]
    fn counter_still_advances_when_identical() {
        let mut w = KryptWriter::new(Vec::new());
        w.init_state(IDENTITY_SEED, false);
        w.write_all(&[0; 16]).unwrap();
        assert_eq!(w.byte_counter(), 16);
    }

    #[test]
    fn additive_backward_seek_is_rejected() {
        let data = encode_all(3328, true, &[0; 8]);
        let mut r = KryptReader::new(Cursor::new(data));
        r.init_state(3328, true);

        let mut buf = [0u8; 4];
        r.read_exact(&mut buf).unwrap();

        // Within the run: fine.
        r.seek(SeekFrom::Current(-2)).unwrap();
        assert_eq!(r.byte_counter(), 2);

        // Before the start of the run: invalid.
        assert!(r.seek(SeekFrom::Current(-3)).is_err());
    }

    #[test]
    fn skip_advances_the_counter() {
        let data = encode_all(28927, false, &[7; 12]);
        let mut r = KryptReader::new(Cursor::new(data));
        r.init_state(28927, false);
        r.skip(5).unwrap();
        assert_eq!(r.byte_counter(), 5);

        let mut rest = Vec::new();
        r.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, [7; 7]);
    }
}
