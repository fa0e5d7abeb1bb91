use std::io::{Read, Write};

use crate::entries::prototype::Prototype;
use crate::entry::{Dialect, Revision};
use crate::error::{Error, Result};
use crate::krypt::{KryptReader, KryptWriter};
use crate::wire::{GmRead, GmWrite};

/// The GEX root entry: the key seed of the surrounding cipher plus the
/// prototype it protects.
///
/// The seed is the first integer *inside* the enciphered region, so both
/// directions require the cipher to already be active in its identity
/// configuration; the seed then re-keys the same stream in place. This is
/// why the entry works on the concrete cipher wrappers rather than plain
/// `Read`/`Write`.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub key_seed: i32,
    pub prototype: Prototype,
}

impl Package {
    pub fn new(key_seed: i32, prototype: Prototype) -> Self {
        Self {
            key_seed,
            prototype,
        }
    }

    pub fn read_entry<R: Read>(r: &mut KryptReader<R>) -> Result<Self> {
        Revision::read(r)?.require(Dialect::Gex)?;
        if !r.is_identity() {
            return Err(Error::CipherNotIdentity {
                context: "package key seed",
            });
        }
        let key_seed = r.read_int()?;
        r.init_state(key_seed, false);
        let prototype = Prototype::read_entry(r)?;
        Ok(Self {
            key_seed,
            prototype,
        })
    }

    pub fn write_entry<W: Write>(&self, w: &mut KryptWriter<W>, optimize: bool) -> Result<()> {
        Revision::new(Dialect::Gex, optimize).write(w)?;
        if !w.is_identity() {
            return Err(Error::CipherNotIdentity {
                context: "package key seed",
            });
        }
        w.write_int(self.key_seed)?;
        w.init_state(self.key_seed, false);
        self.prototype.write_entry(w, optimize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rekeys_the_cipher_in_place() {
        let package = Package::new(3328, Prototype::new("Ext"));

        let mut w = KryptWriter::new(Vec::new());
        package.write_entry(&mut w, false).unwrap();
        assert!(!w.is_identity());
        let bytes = w.into_inner();

        let mut r = KryptReader::new(&bytes[..]);
        let back = Package::read_entry(&mut r).unwrap();
        assert_eq!(back, package);
    }

    #[test]
    fn rejects_an_already_keyed_cipher() {
        let package = Package::new(3328, Prototype::new("Ext"));
        let mut w = KryptWriter::new(Vec::new());
        w.init_state(9999, false);
        let err = package.write_entry(&mut w, false).unwrap_err();
        assert!(matches!(err, Error::CipherNotIdentity { .. }));
    }
}
