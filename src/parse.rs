// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm)

use crate::{
    eval::{Associativity, Ident, Idents, Operation, OperationTyp, OperatorTyp, Program},
    lex::{LexErr, LexErrTyp, Lexer, SubStr, TokTyp},
    Number,
};
use core::{fmt, num::ParseFloatError};

#[derive(Debug)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ParenMismatch,
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
        }
    }
}

#[derive(Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Fun,
    OpenParen,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
}

impl ShuntOp {
    /// Whether this stacked operation must be emitted before pushing `o1`.
    fn binds_before(&self, o1: OperatorTyp) -> bool {
        match self.typ {
            ShuntOpTyp::OpenParen => false,
            // function application without parentheses binds tightest (`sin x + 1`)
            ShuntOpTyp::Fun => true,
            ShuntOpTyp::Operator(o2) => {
                (o2.precedence() > o1.precedence())
                    || ((o1.precedence() == o2.precedence())
                        && (o1.associativity() == Associativity::Left))
            }
        }
    }

    fn into_output(self) -> Option<Operation> {
        let typ = match self.typ {
            ShuntOpTyp::Operator(typ) => OperationTyp::Operator(typ),
            ShuntOpTyp::Fun => OperationTyp::Ident,
            ShuntOpTyp::OpenParen => return None,
        };
        Some(Operation { typ, loc: self.loc })
    }
}

/// Pops operators into `out` until an open parenthesis is on top of `ops`.
fn drain_to_paren(ops: &mut Vec<ShuntOp>, out: &mut Vec<Operation>) {
    while let Some(op) = ops.pop() {
        if op.typ == ShuntOpTyp::OpenParen {
            ops.push(op);
            break;
        }
        out.extend(op.into_output());
    }
}

pub fn parse(lex: Lexer<'_>, idents: &Idents) -> Result<Program, ParseErr> {
    let mut out: Vec<Operation> = Vec::new(); // output
    let mut ops: Vec<ShuntOp> = Vec::new(); // operator stack

    for tok in lex {
        let tok = tok?;
        match tok.typ {
            TokTyp::Number => {
                let num: Number = match tok.loc.get().parse() {
                    Ok(val) => val,
                    Err(err) => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParseNum(err),
                            loc: tok.loc,
                        })
                    }
                };
                out.push(Operation {
                    typ: OperationTyp::Val(num),
                    loc: tok.loc,
                });
            }

            TokTyp::Ident => {
                if let Some(Ident::Fun(_)) = idents.get(&tok.loc.clone().into()) {
                    ops.push(ShuntOp {
                        typ: ShuntOpTyp::Fun,
                        loc: tok.loc,
                    });
                } else {
                    // unknown identifiers are emitted as variables and
                    // reported by `Program::check`
                    out.push(Operation {
                        typ: OperationTyp::Ident,
                        loc: tok.loc,
                    });
                }
            }

            TokTyp::Op(o1) => {
                if !o1.is_prefix() {
                    while let Some(o2) = ops.last() {
                        if !o2.binds_before(o1) {
                            break;
                        }
                        if let Some(op) = ops.pop().and_then(ShuntOp::into_output) {
                            out.push(op);
                        }
                    }
                }
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::Operator(o1),
                    loc: tok.loc,
                });
            }

            TokTyp::Comma => drain_to_paren(&mut ops, &mut out),

            TokTyp::OpenParen => {
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::OpenParen,
                    loc: tok.loc,
                });
            }

            TokTyp::CloseParen => {
                drain_to_paren(&mut ops, &mut out);

                if ops.pop().is_none() {
                    return Err(ParseErr {
                        typ: ParseErrTyp::ParenMismatch,
                        loc: tok.loc,
                    });
                }

                // handle functions
                if let Some(ShuntOp {
                    typ: ShuntOpTyp::Fun,
                    ..
                }) = ops.last()
                {
                    out.extend(ops.pop().and_then(ShuntOp::into_output));
                }
            }

            TokTyp::XGreater
            | TokTyp::XLess
            | TokTyp::XEqual
            | TokTyp::XPipe
            | TokTyp::XOpenSquareBracket
            | TokTyp::XCloseSquareBracket
            | TokTyp::XOpenCurly
            | TokTyp::XCloseCurly => unreachable!("unsupported token survived until parsing"),
        }
    }

    while let Some(op) = ops.pop() {
        let loc = op.loc.clone();
        match op.into_output() {
            Some(op) => out.push(op),
            None => {
                return Err(ParseErr {
                    typ: ParseErrTyp::ParenMismatch,
                    loc,
                })
            }
        }
    }

    Ok(Program::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib;
    use std::sync::Arc;

    fn rpn(src: &str) -> Result<Vec<String>, ParseErr> {
        let src = Arc::new(String::from(src));
        let prog = parse(Lexer::new(&src), &stdlib::standard_idents())?;
        Ok(prog.ops().map(|op| op.to_string()).collect())
    }

    #[test]
    fn emits_postfix_order() {
        assert_eq!(
            rpn("1 + 2 * x").unwrap(),
            ["push 1", "push 2", "call 'x'", "call 'mul'", "call 'add'"]
        );
    }

    #[test]
    fn function_calls_follow_their_arguments() {
        assert_eq!(
            rpn("max(1, sin(x))").unwrap(),
            ["push 1", "call 'x'", "call 'sin'", "call 'max'"]
        );
    }

    #[test]
    fn function_without_parentheses_binds_tightest() {
        assert_eq!(
            rpn("sin x + 1").unwrap(),
            ["call 'x'", "call 'sin'", "push 1", "call 'add'"]
        );
    }

    #[test]
    fn unmatched_close_paren_is_located() {
        let err = rpn("(1 + 2))").unwrap_err();
        assert!(matches!(err.typ, ParseErrTyp::ParenMismatch));
        assert_eq!(err.loc.start(), 7);
    }

    #[test]
    fn unmatched_open_paren_is_located() {
        let err = rpn("2 * (1 + 2").unwrap_err();
        assert!(matches!(err.typ, ParseErrTyp::ParenMismatch));
        assert_eq!(err.loc.start(), 4);
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err = rpn("1.2.3").unwrap_err();
        assert!(matches!(err.typ, ParseErrTyp::ParseNum(_)));
    }
}
