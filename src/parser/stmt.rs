use std::rc::Rc;

use super::Parser;
use crate::ast::{DeclKind, Expr, ImportNames, Stmt, Target, VersionOp, VersionReq};
use crate::lexer::TokenKind;
use crate::runtime::version::Version;
use crate::value::RuntimeError;

impl Parser {
    pub(super) fn parse_stmt(&mut self) -> Result<Stmt, RuntimeError> {
        let start = self.peek().start;

        if self.check(&TokenKind::LBrace) && self.peek_next_kind() != Some(&TokenKind::Colon) {
            let body = self.parse_block()?;
            self.match_semi();
            return Ok(Stmt::Block(body));
        }
        if self.check(&TokenKind::Var) || self.check(&TokenKind::Let) {
            let kind = if matches!(self.peek_kind(), TokenKind::Var) {
                DeclKind::Var
            } else {
                DeclKind::Let
            };
            self.advance();
            return self.parse_decl_tail(kind, start);
        }
        if self.check(&TokenKind::Pub) || self.check(&TokenKind::Priv) {
            let kind = if matches!(self.peek_kind(), TokenKind::Pub) {
                DeclKind::Pub
            } else {
                DeclKind::Priv
            };
            if self.peek_next_kind() == Some(&TokenKind::Type) {
                self.advance();
                return self.parse_type_decl(kind, start);
            }
            if self.peek_next_kind() == Some(&TokenKind::LParen) {
                // anonymous function expression in statement position
                let expr = self.parse_expr()?;
                self.consume_semi()?;
                return Ok(Stmt::Expr { expr, start });
            }
            self.advance();
            return self.parse_decl_tail(kind, start);
        }
        if self.check(&TokenKind::Type) && matches!(self.peek_next_kind(), Some(TokenKind::Ident(_)))
        {
            return self.parse_type_decl(DeclKind::Pub, start);
        }
        if let Some(stmt) = self.parse_callable_decl(start)? {
            return Ok(stmt);
        }
        if self.check_ident("prop") || self.check_ident("property") {
            if matches!(self.peek_next_kind(), Some(TokenKind::Ident(_))) {
                self.advance();
                let (name, name_start) = self.consume_ident("Expected property name")?;
                let body = self.parse_block()?;
                self.match_semi();
                return Ok(Stmt::Decl {
                    kind: DeclKind::Pub,
                    target: Target::Name {
                        name: name.clone(),
                        start: name_start,
                    },
                    value: Some(Expr::Property {
                        name,
                        body: Rc::new(body),
                        start,
                    }),
                    start,
                });
            }
        }
        if self.check(&TokenKind::If) {
            let expr = self.parse_if_expr()?;
            self.match_semi();
            return Ok(Stmt::Expr { expr, start });
        }
        if self.match_kind(TokenKind::While) {
            let cond = self.parse_expr()?;
            let body = self.parse_block()?;
            self.match_semi();
            return Ok(Stmt::While { cond, body, start });
        }
        if self.match_kind(TokenKind::For) {
            let (var, _) = self.consume_ident("Expected name of variable for loop iteration")?;
            if !self.match_ident("in") {
                return Err(self.error_at("Expected 'in'"));
            }
            let iterable = self.parse_expr()?;
            let body = self.parse_block()?;
            self.match_semi();
            return Ok(Stmt::For {
                var,
                iterable,
                body,
                start,
            });
        }
        if self.match_kind(TokenKind::Return) {
            let value = if self.check(&TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.consume_semi()?;
            return Ok(Stmt::Return { value, start });
        }
        if self.match_kind(TokenKind::Break) {
            let amount = if self.check(&TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.consume_semi()?;
            return Ok(Stmt::Break { amount, start });
        }
        if self.match_kind(TokenKind::Continue) {
            let amount = if self.check(&TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.consume_semi()?;
            return Ok(Stmt::Continue { amount, start });
        }
        if self.match_kind(TokenKind::Raise) {
            let value = self.parse_expr()?;
            self.consume_semi()?;
            return Ok(Stmt::Raise { value, start });
        }
        if self.match_kind(TokenKind::Del) {
            let (name, _) = self.consume_ident("Expected ID for deletion")?;
            self.consume_semi()?;
            return Ok(Stmt::Del { name, start });
        }
        if self.match_kind(TokenKind::Req) {
            return self.parse_req(start);
        }
        if self.match_kind(TokenKind::Try) {
            return self.parse_try(start);
        }
        if self.check_ident("switch") {
            self.advance();
            return self.parse_switch(start);
        }

        let expr = self.parse_expr()?;
        if self.match_kind(TokenKind::Tilde) {
            let body = self.parse_block()?;
            self.match_semi();
            return Ok(Stmt::Edit {
                target: expr,
                body,
                start,
            });
        }
        self.consume_semi()?;
        Ok(Stmt::Expr { expr, start })
    }

    pub(super) fn parse_block(&mut self) -> Result<Vec<Stmt>, RuntimeError> {
        self.consume(TokenKind::LBrace, "Expected '{'")?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        self.consume(TokenKind::RBrace, "Expected '}'")?;
        Ok(stmts)
    }

    fn parse_decl_tail(&mut self, kind: DeclKind, start: usize) -> Result<Stmt, RuntimeError> {
        let target = self.parse_target("Expected variable name")?;
        let value = if self.match_kind(TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.consume_semi()?;
        Ok(Stmt::Decl {
            kind,
            target,
            value,
            start,
        })
    }

    pub(super) fn parse_target(&mut self, msg: &str) -> Result<Target, RuntimeError> {
        let start = self.peek().start;
        if self.check(&TokenKind::LBrace) && self.peek_next_kind() == Some(&TokenKind::Colon) {
            self.advance();
            self.advance();
            let mut stmts = Vec::new();
            while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
                stmts.push(self.parse_stmt()?);
            }
            self.consume(TokenKind::RBrace, "Expected '}'")?;
            return Ok(Target::Dynamic {
                expr: Box::new(Expr::Block(stmts)),
                start,
            });
        }
        let (name, name_start) = self.consume_ident(msg)?;
        Ok(Target::Name {
            name,
            start: name_start,
        })
    }

    /// `func`, `spec` and `struct` definitions. Soft keywords: the word must
    /// be followed by a name (or dynamic name) to count as a declaration.
    fn parse_callable_decl(&mut self, start: usize) -> Result<Option<Stmt>, RuntimeError> {
        let word = match self.peek_kind() {
            TokenKind::Ident(w) if w == "func" || w == "spec" || w == "struct" => w.clone(),
            _ => return Ok(None),
        };
        let named = matches!(self.peek_next_kind(), Some(TokenKind::Ident(_)))
            || self.peek_next_kind() == Some(&TokenKind::LBrace);
        if !named {
            return Ok(None);
        }
        self.advance();
        let target = self.parse_target("Expected function name")?;
        let name = match &target {
            Target::Name { name, .. } => Some(name.clone()),
            Target::Dynamic { .. } => None,
        };

        let mut bind_target = target;
        if self.match_kind(TokenKind::At) {
            let (alias, alias_start) = self.consume_ident("Expected name for var declaration")?;
            bind_target = Target::Name {
                name: alias,
                start: alias_start,
            };
        }

        let params = self.parse_params()?;
        let decos = self.parse_decorators()?;
        let body = self.parse_block()?;
        self.match_semi();

        let kind = if word == "spec" {
            DeclKind::Spec
        } else {
            DeclKind::Pub
        };
        Ok(Some(Stmt::Decl {
            kind,
            target: bind_target,
            value: Some(Expr::Func {
                name,
                params,
                body: Rc::new(body),
                decos,
                is_struct: word == "struct",
                start,
            }),
            start,
        }))
    }

    fn parse_type_decl(&mut self, kind: DeclKind, start: usize) -> Result<Stmt, RuntimeError> {
        self.consume(TokenKind::Type, "Expected 'type'")?;
        let (name, name_start) = self.consume_ident("Expected name for new type")?;
        let mut bind_target = Target::Name {
            name: name.clone(),
            start: name_start,
        };
        if self.match_kind(TokenKind::At) {
            let (alias, alias_start) =
                self.consume_ident("Expected ID for var type declaration")?;
            bind_target = Target::Name {
                name: alias,
                start: alias_start,
            };
        }

        let mut check = None;
        if self.check(&TokenKind::LParen) {
            let params = self.parse_params()?;
            let body = self.parse_block()?;
            check = Some(Box::new(Expr::Func {
                name: Some("check".to_string()),
                params,
                body: Rc::new(body),
                decos: Vec::new(),
                is_struct: false,
                start,
            }));
        }

        let static_body = if check.is_some() {
            if self.match_kind(TokenKind::Tilde) {
                Some(self.parse_block()?)
            } else {
                None
            }
        } else if self.check(&TokenKind::LBrace) {
            Some(self.parse_block()?)
        } else {
            None
        };

        let init = if self.check(&TokenKind::Minus) && self.peek_next_kind() == Some(&TokenKind::Grtr)
        {
            self.advance();
            self.advance();
            let params = self.parse_params()?;
            let body = self.parse_block()?;
            Some(Box::new(Expr::Func {
                name: Some("init".to_string()),
                params,
                body: Rc::new(body),
                decos: Vec::new(),
                is_struct: false,
                start,
            }))
        } else {
            None
        };

        self.consume_semi()?;
        Ok(Stmt::Decl {
            kind,
            target: bind_target,
            value: Some(Expr::TypeDecl {
                name,
                check,
                static_body,
                init,
                start,
            }),
            start,
        })
    }

    fn parse_try(&mut self, start: usize) -> Result<Stmt, RuntimeError> {
        let body = self.parse_block()?;
        let catch = if self.match_ident("catch") {
            let name = match self.peek_kind() {
                TokenKind::Ident(_) => Some(self.consume_ident("Expected error var name")?.0),
                _ => None,
            };
            Some((name, self.parse_block()?))
        } else {
            None
        };
        let els = if self.match_ident("else") {
            Some(self.parse_block()?)
        } else {
            None
        };
        self.match_semi();
        Ok(Stmt::Try {
            body,
            catch,
            els,
            start,
        })
    }

    fn parse_switch(&mut self, start: usize) -> Result<Stmt, RuntimeError> {
        let subject = self.parse_expr()?;
        self.consume(TokenKind::LBrace, "Expected '{'")?;
        let mut cases = Vec::new();
        let mut default = None;
        while self.match_ident("case") {
            if self.check(&TokenKind::LBrace) {
                if default.is_some() {
                    return Err(self.error_at("A plain case has already been registered"));
                }
                default = Some(self.parse_block()?);
            } else {
                let pattern = self.parse_expr()?;
                let body = self.parse_block()?;
                cases.push((pattern, body));
            }
        }
        self.consume(TokenKind::RBrace, "Expected '}'")?;
        if cases.is_empty() {
            return Err(RuntimeError::syntax("Switch/Case requires at least 1 case")
                .with_span(start));
        }
        self.match_semi();
        Ok(Stmt::Switch {
            subject,
            cases,
            default,
            start,
        })
    }

    fn parse_req(&mut self, start: usize) -> Result<Stmt, RuntimeError> {
        // version assertion forms come first: req v1.2; req +v1; req v1 - v2;
        if let Some(stmt) = self.parse_version_req(start)? {
            return Ok(stmt);
        }

        if self.match_kind(TokenKind::LParen) {
            let mut members = Vec::new();
            members.push(self.consume_ident("Expected ID")?.0);
            while self.match_kind(TokenKind::Comma) {
                members.push(self.consume_ident("Expected ID")?.0);
            }
            self.consume(TokenKind::RParen, "Expected ')'")?;
            if !self.match_kind(TokenKind::At) {
                return Err(self.error_at("Expected '@ source' for specific imports"));
            }
            let (source, source_is_url) = self.parse_req_source()?;
            self.consume_semi()?;
            return Ok(Stmt::Import {
                names: ImportNames::Members(members),
                source,
                source_is_url,
                start,
            });
        }

        let (name, _) = self.consume_ident("Expected name of import")?;
        let (source, source_is_url) = if self.match_kind(TokenKind::At) {
            self.parse_req_source()?
        } else {
            (name.clone(), false)
        };
        self.consume_semi()?;
        Ok(Stmt::Import {
            names: ImportNames::Single(name),
            source,
            source_is_url,
            start,
        })
    }

    fn parse_req_source(&mut self) -> Result<(String, bool), RuntimeError> {
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, false))
            }
            TokenKind::Str(url) => {
                self.advance();
                Ok((url, true))
            }
            _ => Err(self.error_at("Expected Source after @ symbol in req statement")),
        }
    }

    fn parse_version_req(&mut self, start: usize) -> Result<Option<Stmt>, RuntimeError> {
        let req = if self.check(&TokenKind::Plus)
            && matches!(self.peek_next_kind(), Some(TokenKind::Version(_)))
        {
            self.advance();
            VersionReq {
                op: VersionOp::Min,
                low: self.parse_version_literal()?,
                high: None,
            }
        } else if self.check(&TokenKind::Minus)
            && matches!(self.peek_next_kind(), Some(TokenKind::Version(_)))
        {
            self.advance();
            VersionReq {
                op: VersionOp::Max,
                low: self.parse_version_literal()?,
                high: None,
            }
        } else if matches!(self.peek_kind(), TokenKind::Version(_)) {
            let low = self.parse_version_literal()?;
            if self.check(&TokenKind::Minus)
                && matches!(self.peek_next_kind(), Some(TokenKind::Version(_)))
            {
                self.advance();
                VersionReq {
                    op: VersionOp::Range,
                    low,
                    high: Some(self.parse_version_literal()?),
                }
            } else if self.match_kind(TokenKind::Plus) {
                VersionReq {
                    op: VersionOp::Min,
                    low,
                    high: None,
                }
            } else {
                VersionReq {
                    op: VersionOp::Exact,
                    low,
                    high: None,
                }
            }
        } else {
            return Ok(None);
        };
        self.consume_semi()?;
        Ok(Some(Stmt::VersionCheck { req, start }))
    }

    fn parse_version_literal(&mut self) -> Result<Version, RuntimeError> {
        match self.peek_kind().clone() {
            TokenKind::Version(parts) => {
                self.advance();
                Ok(Version::from_parts(parts))
            }
            _ => Err(self.error_at("Expected version literal")),
        }
    }
}
