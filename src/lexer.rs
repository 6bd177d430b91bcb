use crate::value::RuntimeError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Num(f64),
    Str(String),
    RawStr(String),
    FStrStart(String),
    FStrMiddle(String),
    FStrEnd(String),
    Version(Vec<u64>),
    Ident(String),
    /// `$name`: private attribute read in the current bound scope.
    PrivId(String),
    Var,
    Let,
    Pub,
    Priv,
    Del,
    Req,
    Return,
    If,
    While,
    For,
    Break,
    Continue,
    Try,
    Raise,
    Type,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    StarStarEq,
    Eq,
    EqEq,
    EqEqEq,
    NotEq,
    Less,
    LessEq,
    Grtr,
    GrtrEq,
    Bang,
    BangBang,
    AmpAmp,
    Amp,
    PipePipe,
    Pipe,
    Tilde,
    Dot,
    DotDot,
    Ellipsis,
    At,
    Colon,
    Semicolon,
    Comma,
    Dollar,
    Backslash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Eof,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) start: usize,
    pub(crate) line: usize,
}

fn keyword(ident: &str) -> Option<TokenKind> {
    Some(match ident {
        "var" => TokenKind::Var,
        "let" => TokenKind::Let,
        "pub" => TokenKind::Pub,
        "priv" => TokenKind::Priv,
        "del" => TokenKind::Del,
        "req" => TokenKind::Req,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "try" => TokenKind::Try,
        "raise" => TokenKind::Raise,
        "type" => TokenKind::Type,
        _ => return None,
    })
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        _ => c,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub(crate) struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    pub(crate) fn new(input: &str) -> Self {
        Self {
            src: input.chars().collect(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    pub(crate) fn tokenize(mut self) -> Result<Vec<Token>, RuntimeError> {
        loop {
            self.skip_ws_and_comments();
            if self.pos >= self.src.len() {
                let at = self.pos;
                self.push(TokenKind::Eof, at);
                return Ok(self.tokens);
            }
            self.scan_token()?;
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            start,
            line: self.line,
        });
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> char {
        let c = self.src[self.pos];
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(c) if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                _ => break,
            }
        }
    }

    fn scan_token(&mut self) -> Result<(), RuntimeError> {
        let start = self.pos;
        let c = self.bump();
        let kind = match c {
            'f' | 'F' if matches!(self.peek(), Some('"') | Some('\'') | Some('`')) => {
                self.pos = start;
                return self.scan_fstring();
            }
            'r' | 'R' if matches!(self.peek(), Some('"') | Some('\'') | Some('`')) => {
                let quote = self.bump();
                let mut s = String::new();
                loop {
                    match self.peek() {
                        None => {
                            return Err(RuntimeError::lexical("Unterminated string")
                                .with_span(start));
                        }
                        Some(c) if c == quote => {
                            self.pos += 1;
                            break;
                        }
                        Some(c) => {
                            s.push(c);
                            self.bump();
                        }
                    }
                }
                TokenKind::RawStr(s)
            }
            '"' | '\'' | '`' => {
                let mut s = String::new();
                loop {
                    match self.peek() {
                        None => {
                            return Err(RuntimeError::lexical("Unterminated string")
                                .with_span(start));
                        }
                        Some(c) if c == '"' || c == '\'' || c == '`' => {
                            if c == self.src[start] {
                                self.pos += 1;
                                break;
                            }
                            s.push(c);
                            self.bump();
                        }
                        Some('\\') => {
                            self.pos += 1;
                            if let Some(n) = self.peek() {
                                self.bump();
                                s.push(unescape(n));
                            }
                        }
                        Some(c) => {
                            s.push(c);
                            self.bump();
                        }
                    }
                }
                TokenKind::Str(s)
            }
            '0'..='9' => {
                self.pos = start;
                self.scan_number()
            }
            '$' => {
                if self.peek().map(is_ident_start).unwrap_or(false) {
                    TokenKind::PrivId(self.read_ident())
                } else {
                    TokenKind::Dollar
                }
            }
            '\\' => TokenKind::Backslash,
            '+' => {
                if self.match_char('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.match_char('=') {
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.match_char('*') {
                    if self.match_char('=') {
                        TokenKind::StarStarEq
                    } else {
                        TokenKind::StarStar
                    }
                } else if self.match_char('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.match_char('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '=' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.match_char('=') {
                    TokenKind::NotEq
                } else if self.match_char('!') {
                    TokenKind::BangBang
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.match_char('=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.match_char('=') {
                    TokenKind::GrtrEq
                } else {
                    TokenKind::Grtr
                }
            }
            '&' => {
                if self.match_char('&') {
                    TokenKind::AmpAmp
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                if self.match_char('|') {
                    TokenKind::PipePipe
                } else {
                    TokenKind::Pipe
                }
            }
            '.' => {
                if self.match_char('.') {
                    if self.match_char('.') {
                        TokenKind::Ellipsis
                    } else {
                        TokenKind::DotDot
                    }
                } else {
                    TokenKind::Dot
                }
            }
            '~' => TokenKind::Tilde,
            '@' => TokenKind::At,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            c if is_ident_start(c) => {
                self.pos = start;
                let ident = self.read_ident();
                if let Some(kw) = keyword(&ident) {
                    kw
                } else if ident.len() > 1
                    && ident.starts_with('v')
                    && ident[1..].chars().all(|c| c.is_ascii_digit())
                {
                    self.read_version(ident[1..].parse().unwrap_or(0))
                } else {
                    TokenKind::Ident(ident)
                }
            }
            other => {
                return Err(
                    RuntimeError::lexical(format!("Unknown character {:?}", other))
                        .with_span(start),
                );
            }
        };
        self.push(kind, start);
        Ok(())
    }

    fn read_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if is_ident_char(c) {
                ident.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        ident
    }

    fn read_version(&mut self, major: u64) -> TokenKind {
        let mut parts = vec![major];
        while self.peek() == Some('.') && self.peek_next().map(|c| c.is_ascii_digit()).unwrap_or(false)
        {
            self.pos += 1;
            let mut num = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    num.push(c);
                    self.pos += 1;
                } else {
                    break;
                }
            }
            parts.push(num.parse().unwrap_or(0));
        }
        TokenKind::Version(parts)
    }

    fn scan_number(&mut self) -> TokenKind {
        let mut num = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                num.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_next().map(|c| c.is_ascii_digit()).unwrap_or(false)
        {
            num.push('.');
            self.pos += 1;
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    num.push(c);
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mark = self.pos;
            let mut exp = String::from("e");
            self.pos += 1;
            if matches!(self.peek(), Some('+') | Some('-')) {
                exp.push(self.src[self.pos]);
                self.pos += 1;
            }
            if self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        exp.push(c);
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                num.push_str(&exp);
            } else {
                self.pos = mark;
            }
        }
        TokenKind::Num(num.parse().unwrap_or(0.0))
    }

    /// Tokenize an f-string: literal chunks become FStrStart/Middle/End tokens
    /// and each `{…}` segment is tokenized in place between them.
    fn scan_fstring(&mut self) -> Result<(), RuntimeError> {
        let fstr_start = self.pos;
        self.pos += 1; // 'f'
        let quote = self.bump();
        let mut text = String::new();
        let mut text_start = self.pos;
        let mut opened = false;
        loop {
            let Some(c) = self.peek() else {
                return Err(
                    RuntimeError::lexical("Unterminated string").with_span(fstr_start)
                );
            };
            if c == quote {
                self.pos += 1;
                let kind = if opened {
                    TokenKind::FStrEnd(text)
                } else {
                    TokenKind::Str(text)
                };
                self.push(kind, text_start);
                return Ok(());
            }
            if c == '\\' {
                self.pos += 1;
                if let Some(n) = self.peek() {
                    self.bump();
                    text.push(unescape(n));
                }
                continue;
            }
            if c == '{' {
                let kind = if opened {
                    TokenKind::FStrMiddle(std::mem::take(&mut text))
                } else {
                    TokenKind::FStrStart(std::mem::take(&mut text))
                };
                self.push(kind, text_start);
                opened = true;
                self.pos += 1;
                let mut depth = 1usize;
                loop {
                    self.skip_ws_and_comments();
                    let Some(inner) = self.peek() else {
                        return Err(RuntimeError::lexical("Unterminated string")
                            .with_span(fstr_start));
                    };
                    if inner == '}' && depth == 1 {
                        self.pos += 1;
                        break;
                    }
                    self.scan_token()?;
                    match self.tokens.last().map(|t| &t.kind) {
                        Some(TokenKind::LBrace) => depth += 1,
                        Some(TokenKind::RBrace) => depth -= 1,
                        _ => {}
                    }
                }
                text_start = self.pos;
                continue;
            }
            text.push(c);
            self.bump();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Lexer, TokenKind};

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn scans_simple_statement() {
        assert_eq!(
            kinds("var x = 5;"),
            vec![
                TokenKind::Var,
                TokenKind::Ident("x".into()),
                TokenKind::Eq,
                TokenKind::Num(5.0),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_fstring_parts() {
        let toks = kinds("f\"a{x}b\"");
        assert_eq!(
            toks,
            vec![
                TokenKind::FStrStart("a".into()),
                TokenKind::Ident("x".into()),
                TokenKind::FStrEnd("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn fstring_without_segments_is_plain_string() {
        assert_eq!(
            kinds("f\"plain\""),
            vec![TokenKind::Str("plain".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn scans_version_literal() {
        assert_eq!(
            kinds("req v1.2;"),
            vec![
                TokenKind::Req,
                TokenKind::Version(vec![1, 2]),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("# nothing here\n1;"),
            vec![TokenKind::Num(1.0), TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_rejected() {
        assert!(Lexer::new("\"oops").tokenize().is_err());
    }
}
