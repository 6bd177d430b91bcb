use super::Parser;
use crate::ast::{BinOp, Expr, LogicOp, Target, UnaryOp};
use crate::lexer::TokenKind;
use crate::value::RuntimeError;

impl Parser {
    pub(super) fn parse_expr(&mut self) -> Result<Expr, RuntimeError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, RuntimeError> {
        let left = self.parse_or_or()?;
        let compound = match self.peek_kind() {
            TokenKind::Eq => None,
            TokenKind::PlusEq => Some(BinOp::Add),
            TokenKind::MinusEq => Some(BinOp::Sub),
            TokenKind::StarEq => Some(BinOp::Mul),
            TokenKind::SlashEq => Some(BinOp::Div),
            TokenKind::StarStarEq => Some(BinOp::Pow),
            _ => return Ok(left),
        };
        let op_start = self.advance().start;
        let target = match &left {
            Expr::Ident { name, start } => Target::Name {
                name: name.clone(),
                start: *start,
            },
            Expr::DynamicIdent { expr, start } => Target::Dynamic {
                expr: expr.clone(),
                start: *start,
            },
            _ => {
                return Err(RuntimeError::syntax(
                    "Invalid assignment, name must be an ID or Dynamic ID",
                )
                .with_span(op_start));
            }
        };
        let value = self.parse_assignment()?;
        let value = match compound {
            Some(op) => Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(value),
                start: op_start,
            },
            None => value,
        };
        Ok(Expr::Assign {
            target,
            value: Box::new(value),
            start: op_start,
        })
    }

    fn parse_or_or(&mut self) -> Result<Expr, RuntimeError> {
        let mut expr = self.parse_and_and()?;
        while self.match_kind(TokenKind::PipePipe) {
            let right = self.parse_and_and()?;
            expr = Expr::Logic {
                op: LogicOp::OrOr,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_and_and(&mut self) -> Result<Expr, RuntimeError> {
        let mut expr = self.parse_pipe()?;
        while self.match_kind(TokenKind::AmpAmp) {
            let right = self.parse_pipe()?;
            expr = Expr::Logic {
                op: LogicOp::AndAnd,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_pipe(&mut self) -> Result<Expr, RuntimeError> {
        let mut expr = self.parse_amp()?;
        loop {
            let start = self.peek().start;
            if !self.match_kind(TokenKind::Pipe) {
                break;
            }
            let right = self.parse_amp()?;
            expr = Expr::Binary {
                op: BinOp::Or,
                left: Box::new(expr),
                right: Box::new(right),
                start,
            };
        }
        Ok(expr)
    }

    fn parse_amp(&mut self) -> Result<Expr, RuntimeError> {
        let mut expr = self.parse_equality()?;
        loop {
            let start = self.peek().start;
            if !self.match_kind(TokenKind::Amp) {
                break;
            }
            let right = self.parse_equality()?;
            expr = Expr::Binary {
                op: BinOp::And,
                left: Box::new(expr),
                right: Box::new(right),
                start,
            };
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Expr, RuntimeError> {
        let mut expr = self.parse_relational()?;
        loop {
            let start = self.peek().start;
            let op = if self.match_kind(TokenKind::EqEq) {
                BinOp::Eq
            } else if self.match_kind(TokenKind::NotEq) {
                BinOp::Ne
            } else if self.match_kind(TokenKind::EqEqEq) {
                BinOp::IdEq
            } else {
                break;
            };
            let right = self.parse_relational()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                start,
            };
        }
        Ok(expr)
    }

    fn parse_relational(&mut self) -> Result<Expr, RuntimeError> {
        let mut expr = self.parse_additive()?;
        loop {
            let start = self.peek().start;
            let op = if self.match_kind(TokenKind::Less) {
                BinOp::Lt
            } else if self.match_kind(TokenKind::LessEq) {
                BinOp::Le
            } else if self.match_kind(TokenKind::Grtr) {
                BinOp::Gt
            } else if self.match_kind(TokenKind::GrtrEq) {
                BinOp::Ge
            } else if self.match_ident("in") {
                BinOp::In
            } else if self.match_ident("contains") {
                BinOp::Contains
            } else {
                break;
            };
            let right = self.parse_additive()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                start,
            };
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> Result<Expr, RuntimeError> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let start = self.peek().start;
            let op = if self.match_kind(TokenKind::Plus) {
                BinOp::Add
            } else if self.match_kind(TokenKind::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let right = self.parse_multiplicative()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                start,
            };
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, RuntimeError> {
        let mut expr = self.parse_power()?;
        loop {
            let start = self.peek().start;
            let op = if self.match_kind(TokenKind::Star) {
                BinOp::Mul
            } else if self.match_kind(TokenKind::Slash) {
                BinOp::Div
            } else {
                break;
            };
            let right = self.parse_power()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                start,
            };
        }
        Ok(expr)
    }

    fn parse_power(&mut self) -> Result<Expr, RuntimeError> {
        let left = self.parse_unary()?;
        let start = self.peek().start;
        if self.match_kind(TokenKind::StarStar) {
            let right = self.parse_power()?;
            return Ok(Expr::Binary {
                op: BinOp::Pow,
                left: Box::new(left),
                right: Box::new(right),
                start,
            });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, RuntimeError> {
        let start = self.peek().start;
        let op = if self.match_kind(TokenKind::Plus) {
            UnaryOp::Pos
        } else if self.match_kind(TokenKind::Minus) {
            UnaryOp::Neg
        } else if self.match_kind(TokenKind::Bang) {
            UnaryOp::Not
        } else if self.match_kind(TokenKind::BangBang) {
            UnaryOp::Bool
        } else {
            return self.parse_postfix();
        };
        let expr = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
            start,
        })
    }
}
