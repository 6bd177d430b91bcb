use super::Parser;
use crate::lexer::{Token, TokenKind};
use crate::value::RuntimeError;

impl Parser {
    pub(super) fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(super) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(super) fn peek_next_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    pub(super) fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(super) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(&kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn consume(&mut self, kind: TokenKind, msg: &str) -> Result<Token, RuntimeError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at(msg))
        }
    }

    /// Soft keywords stay ordinary identifiers everywhere else.
    pub(super) fn check_ident(&self, word: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Ident(name) if name == word)
    }

    pub(super) fn match_ident(&mut self, word: &str) -> bool {
        if self.check_ident(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn consume_ident(&mut self, msg: &str) -> Result<(String, usize), RuntimeError> {
        match self.peek_kind() {
            TokenKind::Ident(_) => {
                let token = self.advance();
                match token.kind {
                    TokenKind::Ident(name) => Ok((name, token.start)),
                    _ => unreachable!(),
                }
            }
            _ => Err(self.error_at(msg)),
        }
    }

    pub(super) fn consume_semi(&mut self) -> Result<(), RuntimeError> {
        if self.match_kind(TokenKind::Semicolon) || self.check(&TokenKind::RBrace) {
            Ok(())
        } else {
            Err(self.error_at("Expected ';'"))
        }
    }

    pub(super) fn match_semi(&mut self) {
        self.match_kind(TokenKind::Semicolon);
    }

    pub(super) fn error_at(&self, msg: &str) -> RuntimeError {
        RuntimeError::syntax(msg).with_span(self.peek().start)
    }
}
