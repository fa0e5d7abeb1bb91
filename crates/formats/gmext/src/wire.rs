//! Scalar wire primitives shared by every container flavor.
//!
//! The on-wire shapes are a 32-bit little-endian signed integer and a
//! length-prefixed byte string (u32 LE length + raw bytes, no terminator).

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};

use crate::error::Result;

/// Read-side wire primitives, available on any `io::Read`.
pub trait GmRead: Read {
    fn read_int(&mut self) -> Result<i32> {
        Ok(ReadBytesExt::read_i32::<LE>(self)?)
    }

    /// Booleans travel as a nonzero integer.
    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_int()? != 0)
    }

    /// List counts travel as signed integers but are never negative.
    fn read_count(&mut self) -> Result<usize> {
        let value = self.read_int()?;
        usize::try_from(value).map_err(|_| crate::error::Error::Parse {
            context: "list count",
            message: format!("negative count {value}"),
        })
    }

    fn read_string(&mut self) -> Result<String> {
        let len = ReadBytesExt::read_u32::<LE>(self)? as usize;
        let mut bytes = vec![0u8; len];
        self.read_exact(&mut bytes)?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl<R: Read + ?Sized> GmRead for R {}

/// Write-side wire primitives, available on any `io::Write`.
pub trait GmWrite: Write {
    fn write_int(&mut self, value: i32) -> Result<()> {
        Ok(WriteBytesExt::write_i32::<LE>(self, value)?)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_int(value as i32)
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        WriteBytesExt::write_u32::<LE>(self, value.len() as u32)?;
        Ok(self.write_all(value.as_bytes())?)
    }

    /// Skip-or-write integer: when `skip && !required` the fallback is
    /// written instead of the real value (optimize mode strips fields the
    /// reader can recover).
    fn write_int_or(&mut self, value: i32, fallback: i32, skip: bool, required: bool) -> Result<()> {
        if skip && !required {
            self.write_int(fallback)
        } else {
            self.write_int(value)
        }
    }

    /// Skip-or-write string counterpart of [`GmWrite::write_int_or`].
    fn write_string_or(
        &mut self,
        value: &str,
        fallback: &str,
        skip: bool,
        required: bool,
    ) -> Result<()> {
        if skip && !required {
            self.write_string(fallback)
        } else {
            self.write_string(value)
        }
    }
}

impl<W: Write + ?Sized> GmWrite for W {}
