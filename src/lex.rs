// SPDX: CC0-1.0

use crate::eval::OperatorTyp;
use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    // yes, silly, but atomic operations are cheap for this use case
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    /// Span of length 1 just past the end of `src`, for errors that belong to
    /// the end of the input.
    #[inline]
    pub fn end_of(src: Arc<String>) -> Self {
        let start = src.len();
        Self::new(src, start, 1)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        let end = (self.start + self.len).min(self.src.len());
        self.src.get(self.start.min(end)..end).unwrap_or("")
    }

    pub fn shift_right(&mut self, by: usize) {
        self.len += by;
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokTyp {
    Ident,
    Number,
    Op(OperatorTyp),
    Comma,
    OpenParen,
    CloseParen,

    // unsupported tokens
    XGreater,
    XLess,
    XEqual,
    XPipe,
    XOpenSquareBracket,
    XCloseSquareBracket,
    XOpenCurly,
    XCloseCurly,
}

impl TokTyp {
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Ident
            | Self::Number
            | Self::Op(_)
            | Self::Comma
            | Self::OpenParen
            | Self::CloseParen => false,

            // unsupported tokens
            Self::XGreater
            | Self::XLess
            | Self::XEqual
            | Self::XPipe
            | Self::XOpenSquareBracket
            | Self::XCloseSquareBracket
            | Self::XOpenCurly
            | Self::XCloseCurly => true,
        }
    }

    /// Whether a `-` following this token is a binary subtraction.
    const fn ends_operand(&self) -> bool {
        matches!(self, Self::Ident | Self::Number | Self::CloseParen)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexErrTyp {
    InvalidChar,
    Unsupported(TokTyp),
}

impl fmt::Display for LexErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar => write!(f, "invalid character"),
            Self::Unsupported(_) => write!(f, "unsupported character"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub typ: LexErrTyp,
    pub loc: SubStr,
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    cur: Peekable<CharIndices<'src>>,
    prev: Option<TokTyp>,
    has_errored: bool, // tells iter to yield None after error
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
            prev: None,
            has_errored: false,
        }
    }

    fn trim_whitespace(&mut self) {
        while let Some((_, chr)) = self.cur.peek() {
            if chr.is_whitespace() {
                self.cur.next();
            } else {
                break;
            }
        }
    }

    fn consume_unambiguous(&mut self) -> Option<Tok> {
        let (idx, chr) = self.cur.peek().copied()?;
        let typ = match chr {
            '+' => TokTyp::Op(OperatorTyp::Add),
            '*' => TokTyp::Op(OperatorTyp::Mul),
            '/' => TokTyp::Op(OperatorTyp::Div),
            '^' => TokTyp::Op(OperatorTyp::Pow),
            '-' => {
                // distinguish subtraction from negation
                if self.prev.map(|typ| typ.ends_operand()).unwrap_or(false) {
                    TokTyp::Op(OperatorTyp::Sub)
                } else {
                    TokTyp::Op(OperatorTyp::Neg)
                }
            }
            ',' => TokTyp::Comma,
            '(' => TokTyp::OpenParen,
            ')' => TokTyp::CloseParen,

            '>' => TokTyp::XGreater,
            '<' => TokTyp::XLess,
            '=' => TokTyp::XEqual,
            '|' => TokTyp::XPipe,
            '[' => TokTyp::XOpenSquareBracket,
            ']' => TokTyp::XCloseSquareBracket,
            '{' => TokTyp::XOpenCurly,
            '}' => TokTyp::XCloseCurly,
            _ => return None,
        };
        self.cur.next(); // consume because we only peeked
        Some(Tok {
            typ,
            loc: SubStr::new(Arc::clone(self.src), idx, chr.len_utf8()),
        })
    }

    fn consume_by<P>(&mut self, next_idx: usize, typ: TokTyp, predicate: P) -> Option<Tok>
    where
        P: Fn(char) -> bool,
    {
        let mut tok = Tok {
            typ,
            loc: SubStr::new(Arc::clone(self.src), next_idx, 0),
        };
        while let Some((_, chr)) = self.cur.peek().copied() {
            if predicate(chr) {
                tok.loc.shift_right(chr.len_utf8());
                self.cur.next();
            } else {
                break;
            }
        }
        if tok.loc.is_empty() {
            // there is no next token of type `typ`
            None
        } else {
            Some(tok)
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }

        self.trim_whitespace();

        let (next_idx, next_chr) = self.cur.peek().copied()?;
        let tok = if let Some(tok) = self.consume_unambiguous() {
            Some(tok)
        } else if next_chr.is_ascii_alphabetic() {
            // identifiers start with a letter, may continue with digits (log10)
            self.consume_by(next_idx, TokTyp::Ident, |chr| chr.is_ascii_alphanumeric())
        } else {
            self.consume_by(next_idx, TokTyp::Number, |chr| {
                chr.is_ascii_digit() || chr == '.'
            })
        };

        let ret = match tok {
            Some(tok) if tok.typ.is_unsupported() => Err(LexErr {
                typ: LexErrTyp::Unsupported(tok.typ),
                loc: tok.loc,
            }),
            Some(tok) => Ok(tok),
            None => Err(LexErr {
                typ: LexErrTyp::InvalidChar,
                loc: SubStr::new(Arc::clone(self.src), next_idx, next_chr.len_utf8()),
            }),
        };
        match ret {
            Ok(ref tok) => self.prev = Some(tok.typ),
            Err(_) => self.has_errored = true,
        }
        Some(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typs(src: &str) -> Vec<Result<TokTyp, LexErrTyp>> {
        let src = Arc::new(String::from(src));
        Lexer::new(&src)
            .map(|tok| tok.map(|tok| tok.typ).map_err(|err| err.typ))
            .collect()
    }

    #[test]
    fn minus_after_operand_is_subtraction() {
        assert_eq!(
            typs("x-1"),
            vec![
                Ok(TokTyp::Ident),
                Ok(TokTyp::Op(OperatorTyp::Sub)),
                Ok(TokTyp::Number)
            ]
        );
        assert_eq!(
            typs("(x) - 1")[3],
            Ok(TokTyp::Op(OperatorTyp::Sub)),
        );
    }

    #[test]
    fn minus_at_start_or_after_operator_is_negation() {
        assert_eq!(typs("-pi")[0], Ok(TokTyp::Op(OperatorTyp::Neg)));
        assert_eq!(typs("2*-x")[2], Ok(TokTyp::Op(OperatorTyp::Neg)));
        assert_eq!(typs("f(-1)")[2], Ok(TokTyp::Op(OperatorTyp::Neg)));
        assert_eq!(typs("max(1, -1)")[4], Ok(TokTyp::Op(OperatorTyp::Neg)));
    }

    #[test]
    fn identifiers_may_contain_digits() {
        let src = Arc::new(String::from("log10(x2)"));
        let toks: Vec<_> = Lexer::new(&src).collect::<Result<_, _>>().unwrap();
        assert_eq!(toks[0].loc.get(), "log10");
        assert_eq!(toks[2].loc.get(), "x2");
    }

    #[test]
    fn unsupported_character_stops_lexing() {
        let src = Arc::new(String::from("1 < x + 2"));
        let toks: Vec<_> = Lexer::new(&src).collect();
        assert_eq!(toks.len(), 2);
        let err = toks[1].clone().unwrap_err();
        assert_eq!(err.typ, LexErrTyp::Unsupported(TokTyp::XLess));
        assert_eq!(err.loc.start(), 2);
    }

    #[test]
    fn invalid_character_is_located() {
        let src = Arc::new(String::from("x $ 2"));
        let err = Lexer::new(&src)
            .find_map(|tok| tok.err())
            .expect("lexing should fail");
        assert_eq!(err.typ, LexErrTyp::InvalidChar);
        assert_eq!(err.loc.start(), 2);
        assert_eq!(err.loc.get(), "$");
    }
}
