use std::rc::Rc;

use super::Parser;
use crate::ast::{BinOp, Expr};
use crate::lexer::TokenKind;
use crate::value::RuntimeError;

impl Parser {
    pub(super) fn parse_primary(&mut self) -> Result<Expr, RuntimeError> {
        let start = self.peek().start;
        match self.peek_kind().clone() {
            TokenKind::Num(n) => {
                self.advance();
                Ok(Expr::Num(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::RawStr(source) => {
                self.advance();
                Ok(Expr::Pattern { source, start })
            }
            TokenKind::FStrStart(_) => self.parse_fstring(start),
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Ident { name, start })
            }
            TokenKind::Pub | TokenKind::Priv
                if self.peek_next_kind() == Some(&TokenKind::LParen) =>
            {
                self.advance();
                let params = self.parse_params()?;
                let decos = self.parse_decorators()?;
                let body = self.parse_block()?;
                Ok(Expr::Func {
                    name: None,
                    params,
                    body: Rc::new(body),
                    decos,
                    is_struct: false,
                    start,
                })
            }
            TokenKind::Type => {
                self.advance();
                Ok(Expr::TypeAtom { start })
            }
            TokenKind::If => self.parse_if_expr(),
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                if !self.match_kind(TokenKind::RBracket) {
                    loop {
                        items.push(self.parse_expr()?);
                        if self.match_kind(TokenKind::RBracket) {
                            break;
                        }
                        self.consume(TokenKind::Comma, "Expected ','")?;
                    }
                }
                Ok(Expr::List(items))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.consume(TokenKind::RParen, "Expected ')'")?;
                Ok(expr)
            }
            TokenKind::LBrace => {
                self.advance();
                if self.match_kind(TokenKind::Colon) {
                    let mut stmts = Vec::new();
                    while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
                        stmts.push(self.parse_stmt()?);
                    }
                    self.consume(TokenKind::RBrace, "Expected '}'")?;
                    return Ok(Expr::DynamicIdent {
                        expr: Box::new(Expr::Block(stmts)),
                        start,
                    });
                }
                let mut stmts = Vec::new();
                while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
                    stmts.push(self.parse_stmt()?);
                }
                self.consume(TokenKind::RBrace, "Expected '}'")?;
                Ok(Expr::Block(stmts))
            }
            TokenKind::Dollar => {
                let mut levels = 0;
                while self.match_kind(TokenKind::Dollar) {
                    levels += 1;
                }
                Ok(Expr::ScopeRef { levels, start })
            }
            TokenKind::PrivId(name) => {
                self.advance();
                Ok(Expr::PrivRead {
                    levels: 1,
                    name,
                    start,
                })
            }
            TokenKind::Backslash => {
                let mut levels = 0;
                while self.match_kind(TokenKind::Backslash) {
                    levels += 1;
                }
                let (name, _) = self.consume_ident("Expected name of private var")?;
                Ok(Expr::PrivRead {
                    levels,
                    name,
                    start,
                })
            }
            _ => Err(self.error_at("Expected expression")),
        }
    }

    pub(super) fn parse_if_expr(&mut self) -> Result<Expr, RuntimeError> {
        let start = self.peek().start;
        self.consume(TokenKind::If, "Expected 'if'")?;
        let cond = self.parse_expr()?;
        let then = self.parse_block()?;
        let els = if self.match_ident("else") {
            if self.check(&TokenKind::If) {
                let nested = self.parse_if_expr()?;
                Some(vec![crate::ast::Stmt::Expr {
                    expr: nested,
                    start,
                }])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Expr::If {
            cond: Box::new(cond),
            then,
            els,
            start,
        })
    }

    /// f-strings evaluate as a left fold of string concatenation over their
    /// literal and expression segments.
    fn parse_fstring(&mut self, start: usize) -> Result<Expr, RuntimeError> {
        let mut parts: Vec<Expr> = Vec::new();
        loop {
            match self.peek_kind().clone() {
                TokenKind::FStrStart(text) | TokenKind::FStrMiddle(text) => {
                    self.advance();
                    parts.push(Expr::Str(text));
                }
                TokenKind::FStrEnd(text) => {
                    self.advance();
                    parts.push(Expr::Str(text));
                    break;
                }
                _ => parts.push(self.parse_expr()?),
            }
        }
        let mut iter = parts.into_iter();
        let mut expr = iter.next().unwrap_or(Expr::Str(String::new()));
        for part in iter {
            expr = Expr::Binary {
                op: BinOp::Add,
                left: Box::new(expr),
                right: Box::new(part),
                start,
            };
        }
        Ok(expr)
    }
}
