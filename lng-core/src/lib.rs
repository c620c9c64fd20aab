//! Core compiler pipeline for the LNG language.
//!
//! The pipeline is:
//!
//!   source .lng
//!     -> lexer   (tokens)
//!     -> parser  (AST)
//!     -> codegen (NASM x86-64 assembly text)
//!
//! Assembling and linking the emitted text is the caller's business; the
//! CLI drives `nasm` and `ld` and should be the only place that does.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod span;
pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Back-end: code generation and compiler orchestration
// ---------------------------------------------------------------------

pub mod codegen;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::compile_asm;
pub use error::CoreError;
pub use span::Source;
