//! File-level pipelines for the three container flavors.
//!
//! - **GED/GMP**: the prototype entry alone; no signature, no cipher, no
//!   payload region. Identified by filename suffix.
//! - **GEX**: a raw signature integer, then a cipher stream (starting in
//!   identity configuration) carrying the package entry, which re-keys the
//!   cipher mid-stream, followed by the payload region on the same cipher.
//! - **DAT**: the key seed through the identity cipher, a re-key, then the
//!   payload region. No metadata tree.
//!
//! Payload bytes are exchanged through a caller-supplied callback invoked
//! once per slot, in walk order: the help file first (when the prototype
//! names one), then every data entry. The callback receives the slot's
//! logical name and a mutable source hint it may rewrite to record where
//! the bytes actually came from or went.

use std::io::{Read, Seek, Write};

use flate2::Compression;
use log::debug;

use crate::entries::package::Package;
use crate::entries::prototype::Prototype;
use crate::error::{Error, Result};
use crate::krypt::{KryptReader, KryptWriter};
use crate::payload::{self, PayloadSink, PayloadSource};
use crate::wire::{GmRead, GmWrite};

/// First integer of every GEX file, outside the cipher.
pub const GEX_SIGNATURE: i32 = 1_234_321;

/// Read an editable project (GED/GMP): a bare prototype entry.
pub fn read_ged<R: Read>(r: &mut R) -> Result<Prototype> {
    Prototype::read_entry(r)
}

/// Write an editable project (GED/GMP).
pub fn write_ged<W: Write>(w: &mut W, prototype: &Prototype, optimize: bool) -> Result<()> {
    prototype.write_entry(w, optimize)
}

/// Read a compiled package (GEX).
///
/// `open_sink` is called once per payload slot in walk order with the
/// slot's logical name and its source hint; it returns where to stream the
/// inflated bytes, or [`PayloadSink::Skip`] to seek past the block. The
/// hint may be rewritten to record where the bytes were placed.
pub fn read_gex<'a, R, F>(r: R, mut open_sink: F) -> Result<Package>
where
    R: Read + Seek,
    F: FnMut(&str, &mut String) -> Result<PayloadSink<'a>>,
{
    let mut r = r;
    let signature = r.read_int()?;
    if signature != GEX_SIGNATURE {
        return Err(Error::InvalidSignature {
            expected: GEX_SIGNATURE,
            found: signature,
        });
    }

    let mut r = KryptReader::new(r);
    let mut package = Package::read_entry(&mut r)?;
    debug!(
        "read package '{}' (seed {})",
        package.prototype.name, package.key_seed
    );

    walk_payload(&mut package.prototype, |name, source| {
        let sink = open_sink(name, source)?;
        payload::read_block(&mut r, sink)
    })?;

    Ok(package)
}

/// Write a compiled package (GEX).
///
/// `open_source` mirrors `open_sink` of [`read_gex`]: called once per slot
/// in walk order, returning the bytes to compress into the block, or
/// [`PayloadSource::Skip`] to emit a zero-length block. Source hints
/// rewritten by the callback are recorded on the package, not in the file:
/// the metadata tree is already written by the time the walk begins.
pub fn write_gex<'a, W, F>(
    w: W,
    package: &mut Package,
    mut open_source: F,
    optimize: bool,
    level: Compression,
) -> Result<()>
where
    W: Write,
    F: FnMut(&str, &mut String) -> Result<PayloadSource<'a>>,
{
    let mut w = w;
    w.write_int(GEX_SIGNATURE)?;

    let mut w = KryptWriter::new(w);
    package.write_entry(&mut w, optimize)?;
    debug!(
        "wrote package '{}' (seed {})",
        package.prototype.name, package.key_seed
    );

    walk_payload(&mut package.prototype, |name, source| {
        let slot = open_source(name, source)?;
        payload::write_block(&mut w, slot, level)
    })?;

    w.flush()?;
    Ok(())
}

/// Read a generic data blob (DAT): one sink per prepared slot, in order.
pub fn read_dat<R: Read + Seek>(r: R, sinks: Vec<PayloadSink<'_>>) -> Result<()> {
    let mut r = KryptReader::new(r);
    let key_seed = r.read_int()?;
    r.init_state(key_seed, false);
    for sink in sinks {
        payload::read_block(&mut r, sink)?;
    }
    Ok(())
}

/// Write a generic data blob (DAT): one block per source, in order.
pub fn write_dat<W: Write>(
    w: W,
    key_seed: i32,
    sources: Vec<PayloadSource<'_>>,
    level: Compression,
) -> Result<()> {
    let mut w = KryptWriter::new(w);
    w.write_int(key_seed)?;
    w.init_state(key_seed, false);
    for source in sources {
        payload::write_block(&mut w, source, level)?;
    }
    w.flush()?;
    Ok(())
}

/// Visit every payload slot of a prototype in wire order: the help file
/// when non-empty, then each data entry. The visitor gets the slot's
/// logical name and mutable access to its source hint.
fn walk_payload<F>(prototype: &mut Prototype, mut visit: F) -> Result<()>
where
    F: FnMut(&str, &mut String) -> Result<()>,
{
    if !prototype.help_file.is_empty() {
        let name = payload::logical_name(&prototype.help_file, &prototype.temp_folder).to_string();
        visit(&name, &mut prototype.help_file)?;
    }
    for entry in &mut prototype.entries {
        let name = payload::logical_name(&entry.source, &entry.name).to_string();
        visit(&name, &mut entry.source)?;
    }
    Ok(())
}
