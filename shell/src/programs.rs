//! Programs the shell can start
//!
//! `new` takes either a program name from the table or the code address of
//! an entry function, as printed by the linker's symbol table.

use hal::EntryPoint;

use crate::error::ShellError;
use crate::parser::parse_int;

/// A named process entry point
#[derive(Debug, Clone, Copy)]
pub struct Program {
    pub name: &'static str,
    pub entry: EntryPoint,
}

impl Program {
    pub const fn new(name: &'static str, entry: EntryPoint) -> Self {
        Self { name, entry }
    }

    /// Code address of the entry function
    pub fn address(&self) -> usize {
        self.entry as usize
    }
}

/// Looks `token` up by name, or by address if it reads as a number
pub fn resolve(programs: &[Program], token: &str) -> Result<EntryPoint, ShellError> {
    let by_name = programs.iter().find(|program| program.name == token);
    let found = by_name.or_else(|| {
        let address = usize::try_from(parse_int(token)?).ok()?;
        programs.iter().find(|program| program.address() == address)
    });
    found
        .map(|program| program.entry)
        .ok_or(ShellError::UnknownProgram)
}
