//! Lexer for the Go subset.
//!
//! Tracks 1-based line and byte-column positions for every token and applies
//! Go's automatic semicolon insertion: a newline (or end of input) terminates
//! a statement when the last token could end one. Comments are discarded; a
//! block comment that spans a newline counts as a line break for insertion
//! purposes, same as the upstream toolchain.

use anyhow::{bail, Result};

use crate::domain::position::{CodeRange, SourcePos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
    Ident,
    Int,
    Float,
    Imag,
    Char,
    Str,

    // Keywords.
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    // Operators and punctuation.
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    AmpCaret,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    ShlAssign,
    ShrAssign,
    AmpCaretAssign,
    LAnd,
    LOr,
    Arrow,
    Inc,
    Dec,
    EqEq,
    Lt,
    Gt,
    Assign,
    Not,
    NotEq,
    LtEq,
    GtEq,
    Define,
    Ellipsis,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semi,
    Colon,

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokKind,
    /// Source text of the token; empty for inserted semicolons and EOF.
    pub text: String,
    pub span: CodeRange,
}

fn keyword(ident: &str) -> Option<TokKind> {
    Some(match ident {
        "break" => TokKind::Break,
        "case" => TokKind::Case,
        "chan" => TokKind::Chan,
        "const" => TokKind::Const,
        "continue" => TokKind::Continue,
        "default" => TokKind::Default,
        "defer" => TokKind::Defer,
        "else" => TokKind::Else,
        "fallthrough" => TokKind::Fallthrough,
        "for" => TokKind::For,
        "func" => TokKind::Func,
        "go" => TokKind::Go,
        "goto" => TokKind::Goto,
        "if" => TokKind::If,
        "import" => TokKind::Import,
        "interface" => TokKind::Interface,
        "map" => TokKind::Map,
        "package" => TokKind::Package,
        "range" => TokKind::Range,
        "return" => TokKind::Return,
        "select" => TokKind::Select,
        "struct" => TokKind::Struct,
        "switch" => TokKind::Switch,
        "type" => TokKind::Type,
        "var" => TokKind::Var,
        _ => return None,
    })
}

/// True when a token may be the last token of a statement, i.e. a following
/// newline inserts a semicolon.
fn ends_statement(kind: TokKind) -> bool {
    matches!(
        kind,
        TokKind::Ident
            | TokKind::Int
            | TokKind::Float
            | TokKind::Imag
            | TokKind::Char
            | TokKind::Str
            | TokKind::Break
            | TokKind::Continue
            | TokKind::Fallthrough
            | TokKind::Return
            | TokKind::Inc
            | TokKind::Dec
            | TokKind::RParen
            | TokKind::RBrack
            | TokKind::RBrace
    )
}

pub struct Lexer<'a> {
    src: &'a [u8],
    offset: usize,
    line: u32,
    col: u32,
    last_kind: Option<TokKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer { src: src.as_bytes(), offset: 0, line: 1, col: 1, last_kind: None }
    }

    /// Lex the whole input, semicolons inserted, terminated by an Eof token.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn pos(&self) -> SourcePos {
        SourcePos::new(self.line, self.col)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.offset).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.offset + ahead).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.offset += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    /// Skip whitespace and comments. Returns true if a line break (or a
    /// newline-spanning block comment) was crossed.
    fn skip_trivia(&mut self) -> Result<bool> {
        let mut crossed_newline = false;
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') => {
                    self.bump();
                }
                Some(b'\n') => {
                    crossed_newline = true;
                    self.bump();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let start = self.pos();
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            None => bail!("{}: unterminated block comment", start),
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(b'\n') => {
                                crossed_newline = true;
                                self.bump();
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(crossed_newline),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        let crossed_newline = self.skip_trivia()?;

        // Automatic semicolon insertion at line breaks and end of input.
        if (crossed_newline || self.peek().is_none())
            && self.last_kind.map_or(false, ends_statement)
        {
            self.last_kind = Some(TokKind::Semi);
            let here = self.pos();
            return Ok(Token {
                kind: TokKind::Semi,
                text: String::new(),
                span: CodeRange::new(here, here),
            });
        }

        let start = self.pos();
        let Some(b) = self.peek() else {
            self.last_kind = Some(TokKind::Eof);
            return Ok(Token {
                kind: TokKind::Eof,
                text: String::new(),
                span: CodeRange::new(start, start),
            });
        };

        let token = match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_ident(start),
            b'0'..=b'9' => self.lex_number(start)?,
            b'.' if matches!(self.peek_at(1), Some(b'0'..=b'9')) => self.lex_number(start)?,
            b'"' => self.lex_string(start)?,
            b'`' => self.lex_raw_string(start)?,
            b'\'' => self.lex_char(start)?,
            _ => self.lex_operator(start)?,
        };
        self.last_kind = Some(token.kind);
        Ok(token)
    }

    fn lex_ident(&mut self, start: SourcePos) -> Token {
        let begin = self.offset;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.bump();
            } else {
                break;
            }
        }
        let text = String::from_utf8_lossy(&self.src[begin..self.offset]).into_owned();
        let kind = keyword(&text).unwrap_or(TokKind::Ident);
        Token { kind, text, span: CodeRange::new(start, self.pos()) }
    }

    fn lex_number(&mut self, start: SourcePos) -> Result<Token> {
        let begin = self.offset;
        let mut kind = TokKind::Int;

        if self.peek() == Some(b'0')
            && matches!(self.peek_at(1), Some(b'x') | Some(b'X') | Some(b'b') | Some(b'B') | Some(b'o') | Some(b'O'))
        {
            self.bump();
            self.bump();
            while let Some(b) = self.peek() {
                if b.is_ascii_hexdigit() || b == b'_' {
                    self.bump();
                } else {
                    break;
                }
            }
        } else {
            while let Some(b) = self.peek() {
                if b.is_ascii_digit() || b == b'_' {
                    self.bump();
                } else {
                    break;
                }
            }
            if self.peek() == Some(b'.') && !matches!(self.peek_at(1), Some(b'.')) {
                kind = TokKind::Float;
                self.bump();
                while let Some(b) = self.peek() {
                    if b.is_ascii_digit() || b == b'_' {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
            if matches!(self.peek(), Some(b'e') | Some(b'E')) {
                kind = TokKind::Float;
                self.bump();
                if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                    self.bump();
                }
                while let Some(b) = self.peek() {
                    if b.is_ascii_digit() {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }
        if self.peek() == Some(b'i') {
            kind = TokKind::Imag;
            self.bump();
        }

        let text = String::from_utf8_lossy(&self.src[begin..self.offset]).into_owned();
        Ok(Token { kind, text, span: CodeRange::new(start, self.pos()) })
    }

    fn lex_string(&mut self, start: SourcePos) -> Result<Token> {
        let begin = self.offset;
        self.bump(); // opening quote
        loop {
            match self.peek() {
                None | Some(b'\n') => bail!("{}: unterminated string literal", start),
                Some(b'\\') => {
                    self.bump();
                    self.bump();
                }
                Some(b'"') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        let text = String::from_utf8_lossy(&self.src[begin..self.offset]).into_owned();
        Ok(Token { kind: TokKind::Str, text, span: CodeRange::new(start, self.pos()) })
    }

    fn lex_raw_string(&mut self, start: SourcePos) -> Result<Token> {
        let begin = self.offset;
        self.bump(); // opening backquote
        loop {
            match self.peek() {
                None => bail!("{}: unterminated raw string literal", start),
                Some(b'`') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        let text = String::from_utf8_lossy(&self.src[begin..self.offset]).into_owned();
        Ok(Token { kind: TokKind::Str, text, span: CodeRange::new(start, self.pos()) })
    }

    fn lex_char(&mut self, start: SourcePos) -> Result<Token> {
        let begin = self.offset;
        self.bump(); // opening quote
        loop {
            match self.peek() {
                None | Some(b'\n') => bail!("{}: unterminated rune literal", start),
                Some(b'\\') => {
                    self.bump();
                    self.bump();
                }
                Some(b'\'') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        let text = String::from_utf8_lossy(&self.src[begin..self.offset]).into_owned();
        Ok(Token { kind: TokKind::Char, text, span: CodeRange::new(start, self.pos()) })
    }

    fn lex_operator(&mut self, start: SourcePos) -> Result<Token> {
        use TokKind::*;

        let begin = self.offset;
        let b = self.bump().expect("caller checked non-empty");
        let one_more = |lexer: &mut Self, kind: TokKind| -> TokKind {
            lexer.bump();
            kind
        };

        let kind = match b {
            b'+' => match self.peek() {
                Some(b'+') => one_more(self, Inc),
                Some(b'=') => one_more(self, PlusAssign),
                _ => Plus,
            },
            b'-' => match self.peek() {
                Some(b'-') => one_more(self, Dec),
                Some(b'=') => one_more(self, MinusAssign),
                _ => Minus,
            },
            b'*' => match self.peek() {
                Some(b'=') => one_more(self, StarAssign),
                _ => Star,
            },
            b'/' => match self.peek() {
                Some(b'=') => one_more(self, SlashAssign),
                _ => Slash,
            },
            b'%' => match self.peek() {
                Some(b'=') => one_more(self, PercentAssign),
                _ => Percent,
            },
            b'&' => match self.peek() {
                Some(b'&') => one_more(self, LAnd),
                Some(b'=') => one_more(self, AmpAssign),
                Some(b'^') => {
                    self.bump();
                    match self.peek() {
                        Some(b'=') => one_more(self, AmpCaretAssign),
                        _ => AmpCaret,
                    }
                }
                _ => Amp,
            },
            b'|' => match self.peek() {
                Some(b'|') => one_more(self, LOr),
                Some(b'=') => one_more(self, PipeAssign),
                _ => Pipe,
            },
            b'^' => match self.peek() {
                Some(b'=') => one_more(self, CaretAssign),
                _ => Caret,
            },
            b'<' => match self.peek() {
                Some(b'-') => one_more(self, Arrow),
                Some(b'=') => one_more(self, LtEq),
                Some(b'<') => {
                    self.bump();
                    match self.peek() {
                        Some(b'=') => one_more(self, ShlAssign),
                        _ => Shl,
                    }
                }
                _ => Lt,
            },
            b'>' => match self.peek() {
                Some(b'=') => one_more(self, GtEq),
                Some(b'>') => {
                    self.bump();
                    match self.peek() {
                        Some(b'=') => one_more(self, ShrAssign),
                        _ => Shr,
                    }
                }
                _ => Gt,
            },
            b'=' => match self.peek() {
                Some(b'=') => one_more(self, EqEq),
                _ => Assign,
            },
            b'!' => match self.peek() {
                Some(b'=') => one_more(self, NotEq),
                _ => Not,
            },
            b':' => match self.peek() {
                Some(b'=') => one_more(self, Define),
                _ => Colon,
            },
            b'.' => {
                if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') {
                    self.bump();
                    self.bump();
                    Ellipsis
                } else {
                    Dot
                }
            }
            b'(' => LParen,
            b')' => RParen,
            b'[' => LBrack,
            b']' => RBrack,
            b'{' => LBrace,
            b'}' => RBrace,
            b',' => Comma,
            b';' => Semi,
            _ => bail!("{}: unexpected character `{}`", start, b as char),
        };

        let text = String::from_utf8_lossy(&self.src[begin..self.offset]).into_owned();
        Ok(Token { kind, text, span: CodeRange::new(start, self.pos()) })
    }
}
