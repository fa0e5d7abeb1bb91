use std::io::{Read, Write};

use log::debug;

use crate::entries::data_entry::DataEntry;
use crate::entry::{Dialect, Revision};
use crate::error::Result;
use crate::wire::{GmRead, GmWrite};

/// The extension manifest: identity fields, dependency list, and the
/// ordered data entries whose payloads follow in a GEX.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    /// Whether the IDE lets the user edit the extension. Stripped to false
    /// in optimize mode; defaults to true.
    pub editable: bool,
    pub name: String,
    /// Folder the runner unpacks payloads into.
    pub temp_folder: String,
    pub version: String,
    pub author: String,
    pub date: String,
    pub license: String,
    pub description: String,
    /// Path of the bundled help file; empty when there is none.
    pub help_file: String,
    pub hidden: bool,
    pub dependencies: Vec<String>,
    pub entries: Vec<DataEntry>,
}

impl Default for Prototype {
    fn default() -> Self {
        Self {
            editable: true,
            name: String::new(),
            temp_folder: String::new(),
            version: String::new(),
            author: String::new(),
            date: String::new(),
            license: String::new(),
            description: String::new(),
            help_file: String::new(),
            hidden: false,
            dependencies: Vec::new(),
            entries: Vec::new(),
        }
    }
}

impl Prototype {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn read_entry<R: Read>(r: &mut R) -> Result<Self> {
        Revision::read(r)?.require(Dialect::Default)?;
        Self::read_body(r)
    }

    fn read_body<R: Read>(r: &mut R) -> Result<Self> {
        let editable = r.read_bool()?;
        let name = r.read_string()?;
        let temp_folder = r.read_string()?;
        let version = r.read_string()?;
        let author = r.read_string()?;
        let date = r.read_string()?;
        let license = r.read_string()?;
        let description = r.read_string()?;
        let help_file = r.read_string()?;
        let hidden = r.read_bool()?;

        let count = r.read_count()?;
        let mut dependencies = Vec::with_capacity(count);
        for _ in 0..count {
            dependencies.push(r.read_string()?);
        }

        let count = r.read_count()?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(DataEntry::read_entry(r)?);
        }

        debug!(
            "read prototype '{}' ({} dependencies, {} data entries)",
            name,
            dependencies.len(),
            entries.len()
        );

        Ok(Self {
            editable,
            name,
            temp_folder,
            version,
            author,
            date,
            license,
            description,
            help_file,
            hidden,
            dependencies,
            entries,
        })
    }

    pub fn write_entry<W: Write>(&self, w: &mut W, optimize: bool) -> Result<()> {
        Revision::new(Dialect::Default, optimize).write(w)?;
        w.write_int_or(self.editable as i32, 0, optimize, false)?;
        w.write_string(&self.name)?;
        w.write_string(&self.temp_folder)?;
        w.write_string(&self.version)?;
        w.write_string(&self.author)?;
        w.write_string(&self.date)?;
        w.write_string(&self.license)?;
        w.write_string(&self.description)?;
        // The IDE only shells out on the help file's extension, so optimize
        // mode keeps nothing else of the path.
        w.write_string_or(&self.help_file, file_extension(&self.help_file), optimize, false)?;
        w.write_bool(self.hidden)?;

        w.write_int(self.dependencies.len() as i32)?;
        for dependency in &self.dependencies {
            w.write_string(dependency)?;
        }

        w.write_int(self.entries.len() as i32)?;
        for entry in &self.entries {
            entry.write_entry(w, optimize)?;
        }
        Ok(())
    }
}

/// Extension of the last path component, dot included; empty when there is
/// none. Source hints use either separator.
fn file_extension(path: &str) -> &str {
    let start = path.rfind(['\\', '/']).map_or(0, |i| i + 1);
    match path[start..].rfind('.') {
        Some(dot) => &path[start + dot..],
        None => "",
    }
}
