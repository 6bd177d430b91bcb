mod calls;
mod expr;
mod helpers;
mod primary;
mod stmt;

use crate::ast::{Program, Stmt};
use crate::lexer::{Token, TokenKind};
use crate::value::RuntimeError;

pub(crate) struct Parser {
    pub(super) tokens: Vec<Token>,
    pub(super) pos: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(crate) fn parse_program(&mut self) -> Result<Program, RuntimeError> {
        let mut stmts: Vec<Stmt> = Vec::new();
        while !self.check(&TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Program { stmts })
    }
}
