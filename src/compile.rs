// SPDX: CC0-1.0

//! Turns expression text into a reusable evaluator with (at most) one free
//! variable.

use crate::{
    eval::{self, EvalErr, EvalErrTyp, Ident, IdentKey, Idents, Program},
    lex::{Lexer, SubStr},
    parse::{self, ParseErr, ParseErrTyp},
    stdlib, Number,
};
use core::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum CompileErrTyp {
    Parse(ParseErrTyp),
    Eval(EvalErrTyp),
}

impl fmt::Display for CompileErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(typ) => write!(f, "{typ}"),
            Self::Eval(typ) => write!(f, "{typ}"),
        }
    }
}

/// Why an expression was rejected, and where.
#[derive(Debug)]
pub struct CompileErr {
    pub typ: CompileErrTyp,
    pub loc: SubStr,
}

impl CompileErr {
    /// Byte offset of the offending span within the compiled text.
    pub const fn offset(&self) -> usize {
        self.loc.start()
    }

    fn from_eval(err: EvalErr, src: &Arc<String>) -> Self {
        let loc = err
            .op
            .map(|op| op.loc)
            .unwrap_or_else(|| SubStr::end_of(Arc::clone(src)));
        Self {
            typ: CompileErrTyp::Eval(err.typ),
            loc,
        }
    }
}

impl From<ParseErr> for CompileErr {
    fn from(err: ParseErr) -> Self {
        Self {
            typ: CompileErrTyp::Parse(err.typ),
            loc: err.loc,
        }
    }
}

impl fmt::Display for CompileErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)
    }
}

impl std::error::Error for CompileErr {}

/// A checked program together with the identifier table it runs against.
///
/// Evaluation writes the free variable into its slot right before running the
/// program, hence `&mut self`.
#[derive(Debug)]
pub struct CompiledExpression {
    src: Arc<String>,
    prog: Program,
    idents: Idents,
    var: Option<&'static str>,
    stack: Vec<Number>,
}

impl CompiledExpression {
    pub fn source(&self) -> &str {
        &self.src
    }

    pub const fn program(&self) -> &Program {
        &self.prog
    }

    pub const fn var(&self) -> Option<&'static str> {
        self.var
    }

    pub(crate) fn eval_err(&self, err: EvalErr) -> CompileErr {
        CompileErr::from_eval(err, &self.src)
    }

    /// Evaluates the expression with the free variable set to `value`.
    ///
    /// Programs are checked when compiled, so this only fails if the table was
    /// tampered with in between.
    pub fn eval(&mut self, value: Number) -> Result<Number, EvalErr> {
        if let Some(slot) = self.var.and_then(|var| self.idents.get_mut(&IdentKey::from(var))) {
            *slot = Ident::Var(Some(value));
        }
        eval::eval(&self.prog, &self.idents, &mut self.stack)
    }
}

fn compile_with(src: &str, var: Option<&'static str>) -> Result<CompiledExpression, CompileErr> {
    let src = Arc::new(String::from(src));
    let mut idents = stdlib::standard_idents();
    if let Some(var) = var {
        idents.insert(var.into(), Ident::Var(None));
    }

    let prog = parse::parse(Lexer::new(&src), &idents)?;
    prog.check(&idents)
        .map_err(|err| CompileErr::from_eval(err, &src))?;
    log::debug!(
        "compiled '{src}' into {} operations (free variable: {var:?})",
        prog.ops().len()
    );

    Ok(CompiledExpression {
        src,
        prog,
        idents,
        var,
        stack: Vec::new(),
    })
}

/// Compiles `src` with `var` as its only free variable.
pub fn compile(src: &str, var: &'static str) -> Result<CompiledExpression, CompileErr> {
    compile_with(src, Some(var))
}

/// Compiles and evaluates a constant expression such as `-2*pi`.
pub fn interp(src: &str) -> Result<Number, CompileErr> {
    let mut expr = compile_with(src, None)?;
    let src = Arc::clone(&expr.src);
    expr.eval(Number::NAN)
        .map_err(|err| CompileErr::from_eval(err, &src))
}

/// Finds the known identifier whose name is closest to `text`, if any is close
/// enough to be worth suggesting.
pub fn similar_ident<'a>(idents: &'a Idents, text: &str) -> Option<(&'a IdentKey, &'a Ident)> {
    let text = text.to_ascii_lowercase();
    let (sim, kv) = idents
        .iter()
        .map(|(k, v)| {
            (
                strsim::normalized_damerau_levenshtein(&text, &k.get().to_ascii_lowercase()),
                (k, v),
            )
        })
        .reduce(|(acc_sim, acc_kv), (elem_sim, elem_kv)| {
            if elem_sim > acc_sim {
                (elem_sim, elem_kv)
            } else {
                (acc_sim, acc_kv)
            }
        })?;
    (sim > 0.3).then_some(kv)
}
