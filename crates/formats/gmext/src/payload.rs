//! Payload slots: the opaque byte blobs carried after the metadata tree.
//!
//! The payload region of a GEX or DAT is an ordered sequence of blocks,
//! each an independently zlib-compressed stream prefixed by its packed byte
//! length. Block count is implicit: it matches the slot list the caller
//! prepared. Payload bytes are never buffered wholesale; they are streamed
//! between the container and the caller-provided sources and sinks.

use std::io::{self, Read, Seek, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::trace;

use crate::error::Result;
use crate::krypt::KryptReader;
use crate::wire::{GmRead, GmWrite};

/// Where a payload slot's bytes come from during a save. `Skip` stands in
/// for a callback that declined the slot; it is encoded as a zero-length
/// block.
pub enum PayloadSource<'a> {
    Reader(Box<dyn Read + 'a>),
    Skip,
}

/// Where a payload slot's bytes go during a load. A `Skip` slot is seeked
/// past without decompression.
pub enum PayloadSink<'a> {
    Writer(Box<dyn Write + 'a>),
    Skip,
}

/// Compress one slot into a memory buffer, then emit its packed length and
/// bytes. The one-pass buffer is required because the length prefix is only
/// known after compression finishes.
pub(crate) fn write_block<W: Write>(
    w: &mut W,
    source: PayloadSource<'_>,
    level: Compression,
) -> Result<()> {
    match source {
        PayloadSource::Skip => {
            trace!("payload block skipped, writing empty block");
            w.write_int(0)
        }
        PayloadSource::Reader(mut reader) => {
            let mut encoder = ZlibEncoder::new(Vec::new(), level);
            io::copy(&mut reader, &mut encoder)?;
            let packed = encoder.finish()?;
            trace!("payload block packed to {} bytes", packed.len());
            w.write_int(packed.len() as i32)?;
            Ok(w.write_all(&packed)?)
        }
    }
}

/// Read one slot: inflate exactly `packed_len` bytes into the sink, or seek
/// past them when the sink is `Skip`. The reader never consumes past the
/// declared block length.
pub(crate) fn read_block<R: Read + Seek>(
    r: &mut KryptReader<R>,
    sink: PayloadSink<'_>,
) -> Result<()> {
    let packed_len = r.read_count()? as u64;
    match sink {
        PayloadSink::Skip => {
            trace!("payload block skipped, seeking past {packed_len} bytes");
            r.skip(packed_len)
        }
        PayloadSink::Writer(mut writer) => {
            if packed_len == 0 {
                return Ok(());
            }
            let mut decoder = ZlibDecoder::new(r.by_ref().take(packed_len));
            io::copy(&mut decoder, &mut writer)?;
            // Trailing bytes after the deflate stream still belong to the
            // block; leave the stream positioned at the block boundary.
            let leftover = decoder.into_inner().limit();
            if leftover > 0 {
                r.skip(leftover)?;
            }
            Ok(())
        }
    }
}

/// File-name component of a source hint; hints use either path separator.
pub(crate) fn file_name(path: &str) -> &str {
    match path.rfind(['\\', '/']) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Logical name handed to the payload callback: the basename of the source
/// hint, or the given fallback when the hint has none.
pub(crate) fn logical_name<'a>(source: &'a str, fallback: &'a str) -> &'a str {
    let base = file_name(source);
    if base.is_empty() {
        fallback
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn block_round_trip() {
        let payload = b"the quick brown fox".repeat(50);

        let mut packed = Vec::new();
        write_block(
            &mut packed,
            PayloadSource::Reader(Box::new(&payload[..])),
            Compression::default(),
        )
        .unwrap();

        let mut out = Vec::new();
        let mut r = KryptReader::new(Cursor::new(packed));
        read_block(&mut r, PayloadSink::Writer(Box::new(&mut out))).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn skipped_source_writes_an_empty_block() {
        let mut packed = Vec::new();
        write_block(&mut packed, PayloadSource::Skip, Compression::default()).unwrap();
        assert_eq!(packed, [0, 0, 0, 0]);

        let mut out = Vec::new();
        let mut r = KryptReader::new(Cursor::new(packed));
        read_block(&mut r, PayloadSink::Writer(Box::new(&mut out))).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn skipped_sink_lands_on_the_block_boundary() {
        let mut packed = Vec::new();
        write_block(
            &mut packed,
            PayloadSource::Reader(Box::new(&b"abc"[..])),
            Compression::default(),
        )
        .unwrap();
        packed.extend_from_slice(&1234i32.to_le_bytes());

        let mut r = KryptReader::new(Cursor::new(packed));
        read_block(&mut r, PayloadSink::Skip).unwrap();
        assert_eq!(r.read_int().unwrap(), 1234);
    }

    #[test]
    fn logical_names() {
        assert_eq!(logical_name("C:\\ext\\core.dll", "core"), "core.dll");
        assert_eq!(logical_name("a/b/c.bin", "x"), "c.bin");
        assert_eq!(logical_name("", "fallback"), "fallback");
        assert_eq!(logical_name("dir\\", "fallback"), "fallback");
    }
}
