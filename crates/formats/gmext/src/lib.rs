//! Reader/writer for GameMaker 8 extension containers (GED/GMP, GEX, DAT).
//!
//! Three-layer architecture:
//! - **Layer 1** (`wire`/`krypt`): scalar wire primitives and the
//!   byte-substitution cipher streams
//! - **Layer 2** (`entry`/`entries`): the versioned entry tree (prototype,
//!   libraries, functions, constants, the GEX package root)
//! - **Layer 3** (`container`/`payload`): file-level pipelines (signature,
//!   cipher threading, zlib-compressed payload blocks)
//!
//! Round-trips are byte-exact: decoding a container and re-encoding it with
//! the same optimize setting reproduces the input.

pub mod container;
pub mod entries;
pub mod entry;
pub mod error;
pub mod krypt;
pub mod payload;
pub mod wire;

pub use container::{read_dat, read_ged, read_gex, write_dat, write_ged, write_gex, GEX_SIGNATURE};
pub use entries::{
    CallConvention, Constant, Content, DataEntry, Function, FunctionKind, Library, LibraryKind,
    Package, Prototype, ValueType,
};
pub use entry::{Dialect, Revision, DEFAULT_REVISION, GEX_REVISION};
pub use error::{Error, Result};
pub use krypt::{KryptReader, KryptWriter, IDENTITY_SEED};
pub use payload::{PayloadSink, PayloadSource};

pub use flate2::Compression;
