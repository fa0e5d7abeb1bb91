//! The versioned-entry protocol shared by every node of the metadata tree.
//!
//! Every serialized entry is prefixed by a 32-bit signed revision. Its
//! absolute value selects the wire dialect; a negative value on the write
//! side requests optimize mode (fields recoverable from defaults are
//! elided). Readers accept either sign.

use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::wire::{GmRead, GmWrite};

/// Revision of the default dialect, used by GED/GMP and inside GEX bodies.
pub const DEFAULT_REVISION: i32 = 700;

/// Revision of the GEX dialect, used only at the root of a GEX package.
pub const GEX_REVISION: i32 = 701;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Dialect 700.
    Default,
    /// Dialect 701.
    Gex,
}

impl Dialect {
    pub fn revision(self) -> i32 {
        match self {
            Dialect::Default => DEFAULT_REVISION,
            Dialect::Gex => GEX_REVISION,
        }
    }
}

/// Decoded entry prefix: the dialect plus the optimize request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision {
    pub dialect: Dialect,
    pub optimize: bool,
}

impl Revision {
    pub fn new(dialect: Dialect, optimize: bool) -> Self {
        Self { dialect, optimize }
    }

    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let raw = r.read_int()?;
        // unsigned_abs: i32::MIN has no i32 absolute value.
        let dialect = match raw.unsigned_abs() {
            x if x == DEFAULT_REVISION as u32 => Dialect::Default,
            x if x == GEX_REVISION as u32 => Dialect::Gex,
            _ => return Err(Error::UnsupportedRevision { revision: raw }),
        };
        Ok(Self {
            dialect,
            optimize: raw < 0,
        })
    }

    pub fn write<W: Write>(self, w: &mut W) -> Result<()> {
        let mut raw = self.dialect.revision();
        if self.optimize {
            raw = -raw;
        }
        w.write_int(raw)
    }

    /// The on-wire integer this prefix decodes from / encodes to.
    pub fn raw(self) -> i32 {
        if self.optimize {
            -self.dialect.revision()
        } else {
            self.dialect.revision()
        }
    }

    /// Reject any dialect other than the one the caller's entry speaks.
    pub fn require(self, dialect: Dialect) -> Result<Self> {
        if self.dialect != dialect {
            return Err(Error::UnsupportedRevision {
                revision: self.raw(),
            });
        }
        Ok(self)
    }
}
