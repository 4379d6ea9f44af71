//! Statement list as JSON, for tools that lay the code out themselves.

use crate::model::TranslatedProgram;
use std::io::{self, Write};

pub fn emit(program: &TranslatedProgram, out: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &program.statements())?;
    writeln!(out)
}
