use std::io::{Read, Write};

use crate::entry::{Dialect, Revision};
use crate::error::Result;
use crate::wire::{GmRead, GmWrite};

/// A named constant exposed by a library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constant {
    pub name: String,
    /// The constant's value, kept as the expression string the IDE shows.
    pub value: String,
    pub hidden: bool,
}

impl Constant {
    pub fn read_entry<R: Read>(r: &mut R) -> Result<Self> {
        Revision::read(r)?.require(Dialect::Default)?;
        Ok(Self {
            name: r.read_string()?,
            value: r.read_string()?,
            hidden: r.read_bool()?,
        })
    }

    pub fn write_entry<W: Write>(&self, w: &mut W, optimize: bool) -> Result<()> {
        Revision::new(Dialect::Default, optimize).write(w)?;
        w.write_string(&self.name)?;
        w.write_string(&self.value)?;
        w.write_bool(self.hidden)
    }
}
