//! Compiler orchestration: the crate's front door.

use crate::codegen;
use crate::error::CoreError;
use crate::lexer;
use crate::parser;
use crate::span::Source;

/// Compile one source buffer to NASM x86-64 assembly text.
///
/// Runs tokenize, parse, and generate in order; the first failing stage
/// short-circuits and later stages never run. Each call owns its own
/// cursor, token list, tree, and symbol table, so compilations are
/// independent units of work.
pub fn compile_asm(source: &Source) -> Result<String, CoreError> {
    let tokens = lexer::tokenize(source)?;
    let program = parser::parse(tokens)?;
    codegen::generate(&program)
}
