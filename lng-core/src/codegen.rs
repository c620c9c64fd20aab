//! Code generation: lower the AST into NASM x86-64 assembly.
//!
//! The emitter is a stack machine: every expression leaves exactly one
//! value on the operand stack and consumes exactly as many as it has
//! operands, so any expression nets one push. Statements leave the stack
//! empty. Variables live in 8-byte slots of a zero-initialized `.bss`
//! region reserved after the instruction stream, once the slot count is
//! known.
//!
//! The emitted program is meant for `nasm -felf64` plus `ld`; it talks to
//! the kernel directly (`write`, `exit`) and does not link against libc.

use std::collections::HashMap;

use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::diagnostic::Diagnostic;
use crate::error::CoreError;
use crate::span::Span;

/// Runtime routine that writes the signed decimal form of `rdi` plus a
/// trailing newline to stdout via the raw write syscall. The digit loop
/// divides unsigned, so the magnitude of `i64::MIN` survives the `neg`.
const PRINT_ROUTINE: &str = "\
print:
    sub     rsp, 40
    mov     byte [rsp + 31], 10
    lea     rcx, [rsp + 30]
    mov     rax, rdi
    mov     r9, 10
    xor     r8d, r8d
    test    rax, rax
    jns     .digit
    mov     r8d, 1
    neg     rax
.digit:
    xor     edx, edx
    div     r9
    add     edx, '0'
    mov     [rcx], dl
    dec     rcx
    test    rax, rax
    jnz     .digit
    test    r8d, r8d
    jz      .write
    mov     byte [rcx], '-'
    dec     rcx
.write:
    lea     rsi, [rcx + 1]
    lea     rdx, [rsp + 32]
    sub     rdx, rsi
    mov     rax, 1
    mov     rdi, 1
    syscall
    add     rsp, 40
    ret
";

/// Emit assembly for a whole program.
pub fn generate(program: &Program) -> Result<String, CoreError> {
    let mut codegen = CodeGen {
        asm: String::new(),
        slots: HashMap::new(),
    };
    codegen.emit_prologue();
    for stmt in &program.statements {
        codegen.emit_stmt(stmt)?;
    }
    codegen.emit_epilogue();
    Ok(codegen.asm)
}

struct CodeGen {
    asm: String,
    /// Variable name to byte offset into the data segment, one 8-byte
    /// slot per variable, assigned in first-declaration order.
    slots: HashMap<String, usize>,
}

impl CodeGen {
    fn emit_prologue(&mut self) {
        self.line("segment .text");
        self.asm.push_str(PRINT_ROUTINE);
        self.line("global _start");
        self.line("_start:");
    }

    fn emit_epilogue(&mut self) {
        self.comment("exit");
        self.ins("mov     rax, 60");
        self.ins("xor     rdi, rdi");
        self.ins("syscall");
        self.line("");
        self.line("segment .bss");
        self.line(&format!("mem: resb {}", self.slots.len() * 8));
    }

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), CoreError> {
        match stmt {
            Stmt::Declare { name, span, init } => {
                if self.slots.contains_key(name) {
                    return Err(CoreError::Semantic(Diagnostic::new(
                        "Compile Error",
                        format!("Variable redefinition: '{name}'"),
                        *span,
                    )));
                }
                // The slot exists while the initializer runs; reading the
                // variable there yields its zero-initialized value.
                let offset = self.slots.len() * 8;
                self.slots.insert(name.clone(), offset);

                self.comment(&format!("declare {name}"));
                self.emit_expr(init)?;
                self.ins("pop     rax");
                self.ins(&format!("mov     [mem + {offset}], rax"));
            }
            Stmt::Print(expr) => {
                self.emit_expr(expr)?;
                self.comment("print");
                self.ins("pop     rdi");
                self.ins("call    print");
            }
            Stmt::Expr(expr) => {
                self.emit_expr(expr)?;
                // Discard the statement's value; the operand stack is
                // empty between statements.
                self.comment("drop");
                self.ins("add     rsp, 8");
            }
        }
        Ok(())
    }

    fn emit_expr(&mut self, expr: &Expr) -> Result<(), CoreError> {
        match expr {
            Expr::Int(value) => {
                // push imm would sign-extend a 32-bit immediate; go
                // through rax so the full i64 range is representable.
                self.comment(&format!("push {value}"));
                self.ins(&format!("mov     rax, {value}"));
                self.ins("push    rax");
            }
            Expr::Binary { op, left, right } => {
                self.emit_expr(left)?;
                self.emit_expr(right)?;
                self.comment(match op {
                    BinaryOp::Add => "add",
                    BinaryOp::Sub => "sub",
                    BinaryOp::Mul => "mul",
                    BinaryOp::Div => "div",
                });
                self.ins("pop     rbx");
                self.ins("pop     rax");
                match op {
                    BinaryOp::Add => self.ins("add     rax, rbx"),
                    BinaryOp::Sub => self.ins("sub     rax, rbx"),
                    BinaryOp::Mul => self.ins("imul    rax, rbx"),
                    BinaryOp::Div => {
                        // Divisor of zero raises #DE at run time.
                        self.ins("cqo");
                        self.ins("idiv    rbx");
                    }
                }
                self.ins("push    rax");
            }
            Expr::Unary { op, operand } => {
                self.emit_expr(operand)?;
                match op {
                    UnaryOp::Neg => {
                        self.comment("neg");
                        self.ins("pop     rax");
                        self.ins("neg     rax");
                        self.ins("push    rax");
                    }
                    // Unary plus passes the operand through untouched.
                    UnaryOp::Pos => {}
                }
            }
            Expr::Assign { name, span, value } => {
                let offset = self.slot(name, *span)?;
                self.emit_expr(value)?;
                self.comment(&format!("store {name}"));
                self.ins("pop     rax");
                self.ins(&format!("mov     [mem + {offset}], rax"));
                self.ins("push    rax");
            }
            Expr::Var { name, span } => {
                let offset = self.slot(name, *span)?;
                self.comment(&format!("load {name}"));
                self.ins(&format!("mov     rax, [mem + {offset}]"));
                self.ins("push    rax");
            }
        }
        Ok(())
    }

    fn slot(&self, name: &str, span: Span) -> Result<usize, CoreError> {
        self.slots.get(name).copied().ok_or_else(|| {
            CoreError::Semantic(Diagnostic::new(
                "Compile Error",
                format!("Variable not defined: '{name}'"),
                span,
            ))
        })
    }

    fn comment(&mut self, text: &str) {
        self.line(&format!("    ;; -- {text} --"));
    }

    fn ins(&mut self, text: &str) {
        self.line(&format!("    {text}"));
    }

    fn line(&mut self, text: &str) {
        self.asm.push_str(text);
        self.asm.push('\n');
    }
}
