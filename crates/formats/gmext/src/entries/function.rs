use std::io::{Read, Write};

use log::warn;

use crate::entries::data_entry::LibraryKind;
use crate::entry::{Dialect, Revision};
use crate::error::{Error, Result};
use crate::wire::{GmRead, GmWrite};

/// Number of argument-type slots on the wire. Only the first up-to-16 are
/// meaningful; the 17th slot is written but never used.
pub const ARG_SLOTS: usize = 17;

/// Invoke-type value written for every script function.
const SCRIPT_INVOKE: i32 = 2;

/// Calling convention of a native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallConvention {
    Stdcall,
    Cdecl,
}

impl CallConvention {
    pub fn to_wire(self) -> i32 {
        match self {
            CallConvention::Stdcall => 11,
            CallConvention::Cdecl => 12,
        }
    }

    pub fn from_wire(value: i32) -> Result<Self> {
        match value {
            11 => Ok(CallConvention::Stdcall),
            12 => Ok(CallConvention::Cdecl),
            other => Err(Error::Parse {
                context: "calling convention",
                message: format!("unknown value {other}"),
            }),
        }
    }
}

/// Type of an argument or result value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Real,
}

impl ValueType {
    pub fn to_wire(self) -> i32 {
        match self {
            ValueType::String => 1,
            ValueType::Real => 2,
        }
    }

    pub fn from_wire(value: i32) -> Result<Self> {
        match value {
            1 => Ok(ValueType::String),
            2 => Ok(ValueType::Real),
            other => Err(Error::Parse {
                context: "value type",
                message: format!("unknown value {other}"),
            }),
        }
    }
}

/// A function exported by a library, native or script.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    /// Exported symbol; empty means "use the name".
    pub symbol: String,
    pub help_line: String,
    pub hidden: bool,
    /// Declared argument count, 0..=16. Zero when a script function is
    /// any-arity.
    pub arg_count: u32,
    pub kind: FunctionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionKind {
    Native {
        convention: CallConvention,
        result: ValueType,
        arg_types: [ValueType; ARG_SLOTS],
    },
    Script {
        /// When set, the wire argument count is -1 and the stored count 0.
        any_arity: bool,
    },
}

impl Function {
    /// A native function with real arguments and a real result.
    pub fn native(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: String::new(),
            help_line: String::new(),
            hidden: false,
            arg_count: 0,
            kind: FunctionKind::Native {
                convention: CallConvention::Stdcall,
                result: ValueType::Real,
                arg_types: [ValueType::Real; ARG_SLOTS],
            },
        }
    }

    /// A script function of fixed arity.
    pub fn script(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: String::new(),
            help_line: String::new(),
            hidden: false,
            arg_count: 0,
            kind: FunctionKind::Script { any_arity: false },
        }
    }

    pub fn read_entry<R: Read>(r: &mut R, library: LibraryKind) -> Result<Self> {
        Revision::read(r)?.require(Dialect::Default)?;
        let name = r.read_string()?;
        let symbol = r.read_string()?;
        let invoke = r.read_int()?;
        let help_line = r.read_string()?;
        let hidden = r.read_bool()?;
        let wire_args = r.read_int()?;
        let mut raw_types = [0i32; ARG_SLOTS];
        for slot in &mut raw_types {
            *slot = r.read_int()?;
        }
        let raw_result = r.read_int()?;

        let (arg_count, kind) = match library {
            LibraryKind::Native => {
                let mut arg_types = [ValueType::Real; ARG_SLOTS];
                for (slot, &raw) in arg_types.iter_mut().zip(raw_types.iter()) {
                    *slot = ValueType::from_wire(raw)?;
                }
                (
                    wire_args.max(0) as u32,
                    FunctionKind::Native {
                        convention: CallConvention::from_wire(invoke)?,
                        result: ValueType::from_wire(raw_result)?,
                        arg_types,
                    },
                )
            }
            LibraryKind::Script => {
                // A GameMaker 8 bundled extension writes a stray invoke type
                // here; tolerate any value.
                if invoke != SCRIPT_INVOKE {
                    warn!("script function '{name}' has invoke type {invoke}");
                }
                let any_arity = wire_args == -1;
                (
                    if any_arity { 0 } else { wire_args.max(0) as u32 },
                    FunctionKind::Script { any_arity },
                )
            }
        };

        Ok(Self {
            name,
            symbol,
            help_line,
            hidden,
            arg_count,
            kind,
        })
    }

    pub fn write_entry<W: Write>(&self, w: &mut W, optimize: bool) -> Result<()> {
        Revision::new(Dialect::Default, optimize).write(w)?;
        w.write_string(&self.name)?;
        w.write_string_or(&self.symbol, "", optimize && self.symbol == self.name, false)?;

        match &self.kind {
            FunctionKind::Native { convention, .. } => w.write_int(convention.to_wire())?,
            FunctionKind::Script { .. } => w.write_int(SCRIPT_INVOKE)?,
        }

        w.write_string_or(&self.help_line, "", optimize && self.hidden, false)?;
        w.write_bool(self.hidden)?;

        match &self.kind {
            FunctionKind::Native { arg_types, result, .. } => {
                w.write_int(self.arg_count as i32)?;
                for value_type in arg_types {
                    w.write_int(value_type.to_wire())?;
                }
                w.write_int(result.to_wire())?;
            }
            FunctionKind::Script { any_arity } => {
                let wire_args = if *any_arity { -1 } else { self.arg_count as i32 };
                w.write_int(wire_args)?;
                for _ in 0..ARG_SLOTS {
                    w.write_int(ValueType::Real.to_wire())?;
                }
                w.write_int(ValueType::Real.to_wire())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_round_trip() {
        let mut function = Function::native("ext_add");
        function.symbol = "ExtAdd".into();
        function.help_line = "ext_add(a, b)".into();
        function.arg_count = 2;
        if let FunctionKind::Native { convention, arg_types, .. } = &mut function.kind {
            *convention = CallConvention::Cdecl;
            arg_types[0] = ValueType::String;
        }

        let mut buf = Vec::new();
        function.write_entry(&mut buf, false).unwrap();
        let back = Function::read_entry(&mut &buf[..], LibraryKind::Native).unwrap();
        assert_eq!(back, function);
    }

    #[test]
    fn script_any_arity_travels_as_minus_one() {
        let mut function = Function::script("scr_varargs");
        function.kind = FunctionKind::Script { any_arity: true };

        let mut buf = Vec::new();
        function.write_entry(&mut buf, false).unwrap();

        // revision(4) + name(4 + 11) + symbol(4) + invoke(4) + help(4) + hidden(4)
        let arg_offset = 4 + 4 + 11 + 4 + 4 + 4 + 4;
        assert_eq!(buf[arg_offset..arg_offset + 4], (-1i32).to_le_bytes());

        let back = Function::read_entry(&mut &buf[..], LibraryKind::Script).unwrap();
        assert_eq!(back.arg_count, 0);
        assert_eq!(back.kind, FunctionKind::Script { any_arity: true });
    }

    #[test]
    fn optimize_strips_redundant_symbol_and_help() {
        let mut function = Function::native("ext_tick");
        function.symbol = "ext_tick".into();
        function.help_line = "internal".into();
        function.hidden = true;

        let mut buf = Vec::new();
        function.write_entry(&mut buf, true).unwrap();
        let back = Function::read_entry(&mut &buf[..], LibraryKind::Native).unwrap();
        assert_eq!(back.symbol, "");
        assert_eq!(back.help_line, "");
    }
}
