use super::Parser;
use crate::ast::{CallArg, Expr, ParamDef, ParamKind};
use crate::lexer::TokenKind;
use crate::value::RuntimeError;

impl Parser {
    pub(super) fn parse_postfix(&mut self) -> Result<Expr, RuntimeError> {
        let mut expr = self.parse_primary()?;
        loop {
            let start = self.peek().start;
            if self.match_kind(TokenKind::LParen) {
                let args = self.parse_args(TokenKind::RParen)?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    start,
                };
            } else if self.match_kind(TokenKind::LBracket) {
                let args = self.parse_args(TokenKind::RBracket)?;
                expr = Expr::AltCall {
                    callee: Box::new(expr),
                    args,
                    start,
                };
            } else if self.match_kind(TokenKind::Dot) {
                let (name, _) = self.consume_ident("Expected attribute name")?;
                expr = Expr::GetAttr {
                    obj: Box::new(expr),
                    name,
                    start,
                };
            } else if self.check(&TokenKind::Colon)
                && matches!(self.peek_next_kind(), Some(TokenKind::Ident(_)))
            {
                self.advance();
                let (spec, _) = self.consume_ident("Expected format input")?;
                expr = Expr::Format {
                    obj: Box::new(expr),
                    spec,
                    start,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_args(&mut self, end: TokenKind) -> Result<Vec<CallArg>, RuntimeError> {
        let mut args = Vec::new();
        if self.match_kind(end.clone()) {
            return Ok(args);
        }
        let mut saw_kw = false;
        loop {
            if self.match_kind(TokenKind::Ellipsis) {
                args.push(CallArg::KwSpread(self.parse_expr()?));
                saw_kw = true;
            } else if self.match_kind(TokenKind::DotDot) {
                args.push(CallArg::Spread(self.parse_expr()?));
            } else if matches!(self.peek_kind(), TokenKind::Ident(_))
                && self.peek_next_kind() == Some(&TokenKind::Eq)
            {
                let (name, _) = self.consume_ident("Expected keyword name")?;
                self.advance();
                let value = self.parse_expr()?;
                args.push(CallArg::Kw { name, value });
                saw_kw = true;
            } else {
                // An assignment in argument position is a keyword argument;
                // `{:expr} = value` comes through here as a dynamic name.
                match self.parse_expr()? {
                    Expr::Assign { target, value, .. } => {
                        match target {
                            crate::ast::Target::Dynamic { expr, .. } => {
                                args.push(CallArg::DynKw {
                                    name: expr,
                                    value: *value,
                                });
                            }
                            crate::ast::Target::Name { name, .. } => {
                                args.push(CallArg::Kw {
                                    name,
                                    value: *value,
                                });
                            }
                        }
                        saw_kw = true;
                    }
                    value => {
                        if saw_kw {
                            return Err(
                                self.error_at("Positional argument follows keyword argument")
                            );
                        }
                        args.push(CallArg::Pos(value));
                    }
                }
            }
            if self.match_kind(end.clone()) {
                break;
            }
            self.consume(TokenKind::Comma, "Expected ','")?;
        }
        Ok(args)
    }

    pub(super) fn parse_params(&mut self) -> Result<Vec<ParamDef>, RuntimeError> {
        self.consume(TokenKind::LParen, "Expected '('")?;
        let mut params = Vec::new();
        if self.match_kind(TokenKind::RParen) {
            return Ok(params);
        }
        let mut defaulted = false;
        let mut vararg_seen = false;
        let mut varkw_seen = false;
        loop {
            if varkw_seen {
                return Err(self.error_at("No params can follow varkwarg"));
            }
            let kind = if self.match_kind(TokenKind::DotDot) {
                vararg_seen = true;
                ParamKind::VarArg
            } else if self.match_kind(TokenKind::Ellipsis) {
                varkw_seen = true;
                ParamKind::VarKwArg
            } else if vararg_seen {
                ParamKind::KwOnly
            } else {
                ParamKind::Normal
            };
            let (name, _) = self.consume_ident("Expected name of arg")?;
            let default = if self.match_kind(TokenKind::Eq) {
                defaulted = true;
                Some(self.parse_expr()?)
            } else {
                if defaulted && kind == ParamKind::Normal {
                    return Err(self.error_at("Non-default arg following a default arg"));
                }
                None
            };
            params.push(ParamDef {
                name,
                default,
                kind,
            });
            if self.match_kind(TokenKind::RParen) {
                break;
            }
            self.consume(TokenKind::Comma, "Expected ','")?;
        }
        Ok(params)
    }

    /// Optional `[deco, deco]` list between a parameter list and a body.
    pub(super) fn parse_decorators(&mut self) -> Result<Vec<Expr>, RuntimeError> {
        let mut decos = Vec::new();
        if !self.match_kind(TokenKind::LBracket) {
            return Ok(decos);
        }
        if self.match_kind(TokenKind::RBracket) {
            return Ok(decos);
        }
        loop {
            decos.push(self.parse_expr()?);
            if self.match_kind(TokenKind::RBracket) {
                break;
            }
            self.consume(TokenKind::Comma, "Expected ','")?;
        }
        Ok(decos)
    }
}
