//! Typed entries of the metadata tree, one module per entity.

pub mod constant;
pub mod data_entry;
pub mod function;
pub mod package;
pub mod prototype;

pub use constant::Constant;
pub use data_entry::{Content, DataEntry, Library, LibraryKind};
pub use function::{CallConvention, Function, FunctionKind, ValueType, ARG_SLOTS};
pub use package::Package;
pub use prototype::Prototype;
