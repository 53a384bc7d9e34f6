// SPDX: CC0-1.0

use crate::{
    compile::{CompileErr, CompileErrTyp},
    lex::SubStr,
    Number,
};
use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Left,
    Right,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Coordinate function of a parametric equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    X,
    Y,
}

impl Component {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::X => "x(t)",
            Self::Y => "y(t)",
        }
    }
}

#[derive(Debug)]
pub enum BoundErr {
    Compile(CompileErrTyp),
    NotFinite(Number),
}

#[derive(Debug)]
pub enum EquationErrTyp {
    EmptyInput,
    InvalidDomainSyntax,
    UnknownDomainIdentifier {
        found: String,
    },
    DomainBoundEvaluationError {
        bound: Bound,
        cause: BoundErr,
    },
    EmptyParametricComponent {
        component: Component,
    },
    ExpressionCompileError {
        name: &'static str,
        offset: usize,
        cause: CompileErrTyp,
    },
}

impl fmt::Display for EquationErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "input is empty"),

            Self::InvalidDomainSyntax => {
                write!(f, "domain must be two-sided, like '{{ a < x < b }}'")
            }

            Self::UnknownDomainIdentifier { found } => write!(
                f,
                "unknown domain identifier '{found}', expected 'x' or 't'"
            ),

            Self::DomainBoundEvaluationError { bound, cause } => match cause {
                BoundErr::Compile(typ) => write!(f, "invalid {bound} domain bound: {typ}"),
                BoundErr::NotFinite(val) => {
                    write!(f, "{bound} domain bound evaluates to {val}, which is not finite")
                }
            },

            Self::EmptyParametricComponent { component } => write!(
                f,
                "{} is empty for parametric equation",
                component.name()
            ),

            Self::ExpressionCompileError {
                name,
                offset,
                cause,
            } => write!(
                f,
                "couldn't compile {name}: {cause} (at position {offset})"
            ),
        }
    }
}

/// Failure to turn user input into an equation or a curve.
///
/// `loc`, when present, spans the offending text inside the sub-expression it
/// was found in.
#[derive(Debug)]
pub struct EquationErr {
    pub typ: EquationErrTyp,
    pub loc: Option<SubStr>,
}

impl EquationErr {
    pub(crate) const fn new(typ: EquationErrTyp) -> Self {
        Self { typ, loc: None }
    }

    pub(crate) fn compile(name: &'static str, err: CompileErr) -> Self {
        Self {
            typ: EquationErrTyp::ExpressionCompileError {
                name,
                offset: err.offset(),
                cause: err.typ,
            },
            loc: Some(err.loc),
        }
    }

    pub(crate) fn bound(bound: Bound, err: CompileErr) -> Self {
        Self {
            typ: EquationErrTyp::DomainBoundEvaluationError {
                bound,
                cause: BoundErr::Compile(err.typ),
            },
            loc: Some(err.loc),
        }
    }
}

impl From<EquationErrTyp> for EquationErr {
    fn from(typ: EquationErrTyp) -> Self {
        Self::new(typ)
    }
}

impl fmt::Display for EquationErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)
    }
}

impl std::error::Error for EquationErr {}
