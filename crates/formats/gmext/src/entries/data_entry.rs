use std::io::{Read, Write};

use crate::entries::constant::Constant;
use crate::entries::function::Function;
use crate::entry::{Dialect, Revision};
use crate::error::{Error, Result};
use crate::wire::{GmRead, GmWrite};

/// Which function variant a library content instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    Native,
    Script,
}

/// Function and constant tables shared by the two library content variants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    pub init_fn: String,
    pub exit_fn: String,
    pub functions: Vec<Function>,
    pub constants: Vec<Constant>,
}

impl Library {
    fn read_body<R: Read>(r: &mut R, kind: LibraryKind) -> Result<Self> {
        let init_fn = r.read_string()?;
        let exit_fn = r.read_string()?;

        let count = r.read_count()?;
        let mut functions = Vec::with_capacity(count);
        for _ in 0..count {
            functions.push(Function::read_entry(r, kind)?);
        }

        let count = r.read_count()?;
        let mut constants = Vec::with_capacity(count);
        for _ in 0..count {
            constants.push(Constant::read_entry(r)?);
        }

        Ok(Self {
            init_fn,
            exit_fn,
            functions,
            constants,
        })
    }

    fn write_body<W: Write>(&self, w: &mut W, optimize: bool) -> Result<()> {
        w.write_string(&self.init_fn)?;
        w.write_string(&self.exit_fn)?;
        w.write_int(self.functions.len() as i32)?;
        for function in &self.functions {
            function.write_entry(w, optimize)?;
        }
        w.write_int(self.constants.len() as i32)?;
        for constant in &self.constants {
            constant.write_entry(w, optimize)?;
        }
        Ok(())
    }
}

/// The four concrete payload-descriptor flavors.
///
/// On the wire the tag follows the data-entry header: 1 = native library,
/// 2 = script library, 3 = binary plugin, 4 = simple binary. Reading also
/// accepts the GM4HTML5 quirk tags 0 and 5 (native library) and 6 (simple
/// binary); writing emits only 1..=4.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    NativeLibrary(Library),
    ScriptLibrary(Library),
    BinaryPlugin,
    Binary,
}

impl Content {
    /// The tag emitted on write.
    pub fn kind(&self) -> i32 {
        match self {
            Content::NativeLibrary(_) => 1,
            Content::ScriptLibrary(_) => 2,
            Content::BinaryPlugin => 3,
            Content::Binary => 4,
        }
    }

    fn read_body<R: Read>(r: &mut R, kind: i32) -> Result<Self> {
        match kind {
            0 | 1 | 5 => Ok(Content::NativeLibrary(Library::read_body(r, LibraryKind::Native)?)),
            2 => Ok(Content::ScriptLibrary(Library::read_body(r, LibraryKind::Script)?)),
            3 => {
                read_empty_metadata(r)?;
                Ok(Content::BinaryPlugin)
            }
            4 | 6 => {
                read_empty_metadata(r)?;
                Ok(Content::Binary)
            }
            other => Err(Error::Parse {
                context: "content kind",
                message: format!("unknown tag {other}"),
            }),
        }
    }

    fn write_body<W: Write>(&self, w: &mut W, optimize: bool) -> Result<()> {
        match self {
            Content::NativeLibrary(library) | Content::ScriptLibrary(library) => {
                library.write_body(w, optimize)
            }
            Content::BinaryPlugin | Content::Binary => {
                w.write_string("")?;
                w.write_string("")?;
                w.write_int(0)?;
                w.write_int(0)
            }
        }
    }
}

/// Binary contents carry the same four metadata fields as a library, all
/// required to be empty.
fn read_empty_metadata<R: Read>(r: &mut R) -> Result<()> {
    if !r.read_string()?.is_empty() {
        return Err(Error::BinaryMetadata { field: "init function" });
    }
    if !r.read_string()?.is_empty() {
        return Err(Error::BinaryMetadata { field: "exit function" });
    }
    if r.read_int()? != 0 {
        return Err(Error::BinaryMetadata { field: "function count" });
    }
    if r.read_int()? != 0 {
        return Err(Error::BinaryMetadata { field: "constant count" });
    }
    Ok(())
}

/// One payload slot's descriptor: a logical name, a source hint (typically a
/// path or URL consumed by the payload callback), and the owned content.
#[derive(Debug, Clone, PartialEq)]
pub struct DataEntry {
    pub name: String,
    pub source: String,
    pub content: Content,
}

impl DataEntry {
    pub fn new(name: impl Into<String>, source: impl Into<String>, content: Content) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            content,
        }
    }

    pub fn read_entry<R: Read>(r: &mut R) -> Result<Self> {
        Revision::read(r)?.require(Dialect::Default)?;
        let name = r.read_string()?;
        let source = r.read_string()?;
        let kind = r.read_int()?;
        let content = Content::read_body(r, kind)?;
        Ok(Self {
            name,
            source,
            content,
        })
    }

    pub fn write_entry<W: Write>(&self, w: &mut W, optimize: bool) -> Result<()> {
        Revision::new(Dialect::Default, optimize).write(w)?;
        w.write_string(&self.name)?;
        w.write_string_or(&self.source, "", optimize, false)?;
        w.write_int(self.content.kind())?;
        self.content.write_body(w, optimize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_round_trip() {
        let entry = DataEntry::new(
            "core.dll",
            "C:\\ext\\core.dll",
            Content::NativeLibrary(Library {
                init_fn: "ext_init".into(),
                exit_fn: "ext_done".into(),
                functions: vec![Function::native("ext_ping")],
                constants: vec![Constant {
                    name: "EXT_OK".into(),
                    value: "1".into(),
                    hidden: false,
                }],
            }),
        );

        let mut buf = Vec::new();
        entry.write_entry(&mut buf, false).unwrap();
        let back = DataEntry::read_entry(&mut &buf[..]).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn binary_metadata_must_be_empty() {
        let mut buf = Vec::new();
        Revision::new(Dialect::Default, false).write(&mut buf).unwrap();
        buf.write_string("data.bin").unwrap();
        buf.write_string("").unwrap();
        buf.write_int(3).unwrap();
        buf.write_string("not_empty").unwrap();
        buf.write_string("").unwrap();
        buf.write_int(0).unwrap();
        buf.write_int(0).unwrap();

        let err = DataEntry::read_entry(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, Error::BinaryMetadata { .. }));
    }

    #[test]
    fn quirk_tags_coerce_on_read() {
        for (tag, expected) in [(0, 1), (5, 1), (6, 4)] {
            let mut buf = Vec::new();
            Revision::new(Dialect::Default, false).write(&mut buf).unwrap();
            buf.write_string("slot").unwrap();
            buf.write_string("").unwrap();
            buf.write_int(tag).unwrap();
            buf.write_string("").unwrap();
            buf.write_string("").unwrap();
            buf.write_int(0).unwrap();
            buf.write_int(0).unwrap();

            let entry = DataEntry::read_entry(&mut &buf[..]).unwrap();
            assert_eq!(entry.content.kind(), expected);
        }
    }
}
