// SPDX: CC0-1.0

use crate::{
    compile::{self, CompileErrTyp, CompiledExpression},
    error::{BoundErr, EquationErr, EquationErrTyp},
    eval::EvalErrTyp,
    lex::{LexErrTyp, SubStr, TokTyp},
    parse::ParseErrTyp,
    stdlib, Point,
};
use anyhow::Context;
use core::{fmt, str::FromStr};
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Add,
    List,
    PrintProg,
    Plot,
    Clear,
    Preview,
    Settings,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::Add,
            Self::List,
            Self::Plot,
            Self::Clear,
            Self::Preview,
            Self::Settings,
            Self::PrintProg,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::Add => "add a graph, e.g. 'x^2', 'y^3 { -2 < y < 2 }' or '(cos(t), sin(t)) { 0 < t < tau }'",
            Self::List => "list graphs and how far each one is revealed",
            Self::PrintProg => "print programs compiled for the latest graph (for debugging)",
            Self::Plot => "plot the revealed part of every graph",
            Self::Clear => "remove all graphs",
            Self::Preview => "toggle preview mode, which reveals new graphs immediately",
            Self::Settings => "set sampling and animation parameters",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Add => "add",
            Self::List => "list",
            Self::PrintProg => "prog",
            Self::Plot => "plot",
            Self::Clear => "clear",
            Self::Preview => "preview",
            Self::Settings => "settings",
        }
    }
}

impl FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::exhaustive()
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or(())
    }
}

/// Prints `prompt` and reads one trimmed line from stdin.
pub fn input<W: Write>(mut out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    write!(out, "{prompt}")
        .and_then(|()| out.flush())
        .context("write to standard output failed")?;
    let mut line = String::new();
    stdin()
        .lock()
        .read_line(&mut line)
        .context("read from standard input failed")?;
    Ok(line.trim().to_string())
}

/// Reads a value, reporting parse failures. The outer error is I/O, the
/// inner one the parse failure (already printed). With `ignore_empty`, a
/// blank line yields `None`.
pub fn read_fromstr<W: Write, T: FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, T::Err>>
where
    T::Err: fmt::Display,
{
    let line = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && line.is_empty() {
        return Ok(Ok(None));
    }
    match line.parse::<T>() {
        Ok(val) => Ok(Ok(Some(val))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(line))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

/// Echoes the text `span` points into with carets below the span. Empty
/// spans still get one caret.
pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.start()),
        "^".repeat(span.len().max(1))
    )
}

pub fn dump_program<W: Write>(
    mut out: W,
    name: &str,
    expr: &CompiledExpression,
) -> io::Result<()> {
    writeln!(out, "{name} = {}:", expr.source())?;
    let mut ops = expr.program().ops().peekable();
    if ops.peek().is_none() {
        writeln!(out, "  (empty)")?;
    }
    for op in ops {
        writeln!(out, "  {op}")?;
    }
    Ok(())
}

pub fn graph_undefined<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: no graph is defined")
}

fn is_finite(p: &Point<f32>) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Whether `points` has anything gnuplot can draw.
pub fn is_plottable(points: &[Point<f32>]) -> bool {
    points.iter().any(is_finite)
}

/// Writes `points` as one gnuplot data block. Runs of non-finite points become
/// a single blank line, which breaks the line without ending the block.
pub fn write_data_block<W: Write>(mut out: W, points: &[Point<f32>]) -> io::Result<()> {
    let mut gap = false;
    for p in points {
        if is_finite(p) {
            writeln!(out, "{} {}", p.x, p.y)?;
            gap = false;
        } else if !gap {
            writeln!(out)?;
            gap = true;
        }
    }
    Ok(())
}

/// Prints a rejected equation: the underlined location if known, the error,
/// and a note on how to fix it where one applies.
pub fn report<W: Write>(mut out: W, err: &EquationErr) -> io::Result<()> {
    writeln!(out)?;
    if let Some(loc) = &err.loc {
        underline(&mut out, loc)?;
    }
    writeln!(out, "error: {err}")?;

    let cause = match &err.typ {
        EquationErrTyp::EmptyInput => return Ok(()),
        EquationErrTyp::InvalidDomainSyntax => {
            return writeln!(
                out,
                "note: bound the variable on both sides with '<' or '<=', e.g. '{{ -2 <= x <= 2 }}'"
            )
        }
        EquationErrTyp::UnknownDomainIdentifier { .. } => {
            return writeln!(
                out,
                "note: use 'x' for explicit graphs and 't' for parametric graphs"
            )
        }
        EquationErrTyp::EmptyParametricComponent { .. } => {
            return writeln!(out, "note: parametric graphs look like '(x(t), y(t))'")
        }
        EquationErrTyp::DomainBoundEvaluationError { cause, .. } => match cause {
            BoundErr::Compile(typ) => typ,
            BoundErr::NotFinite(_) => return Ok(()),
        },
        EquationErrTyp::ExpressionCompileError { cause, .. } => cause,
    };

    match cause {
        CompileErrTyp::Parse(ParseErrTyp::LexErr(LexErrTyp::InvalidChar)) => writeln!(
            out,
            "note: available tokens are numbers, alphanumeric identifiers, and symbols +-*/^,()"
        ),

        CompileErrTyp::Parse(ParseErrTyp::LexErr(LexErrTyp::Unsupported(typ))) => match typ {
            TokTyp::XGreater | TokTyp::XLess => writeln!(
                out,
                "note: inequalities belong in a domain clause after the expression, e.g. 'x^2 {{ 0 < x < 1 }}'"
            ),
            TokTyp::XEqual => writeln!(
                out,
                "note: enter only the right-hand side, e.g. 'x^2' for y = x^2"
            ),
            TokTyp::XPipe => writeln!(
                out,
                "note: use the 'abs' function to compute absolute value"
            ),
            TokTyp::XOpenSquareBracket | TokTyp::XCloseSquareBracket => {
                writeln!(out, "note: use parentheses for grouping")
            }
            _ => Ok(()),
        },

        CompileErrTyp::Parse(ParseErrTyp::ParseNum(_)) => {
            writeln!(out, "note: parsing as floating point number")
        }

        CompileErrTyp::Eval(EvalErrTyp::StackMismatch { .. }) => writeln!(
            out,
            "note: implicit multiplication is not supported, so for example '5x' would be '5*x'"
        ),

        CompileErrTyp::Eval(EvalErrTyp::UndefinedIdent { text }) => {
            let idents = stdlib::standard_idents();
            match compile::similar_ident(&idents, text.get()) {
                Some((key, ident)) => writeln!(
                    out,
                    "note: {} '{key}' has a similar name",
                    ident.describe()
                ),
                None => Ok(()),
            }
        }

        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Equation, Graph, Settings};

    fn reported(raw: &str) -> String {
        let err = Equation::parse(raw)
            .and_then(|equation| Graph::new(true).generate(&equation, &Settings::default()))
            .unwrap_err();
        let mut out = Vec::new();
        report(&mut out, &err).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn commands_round_trip_by_name() {
        for c in Command::exhaustive() {
            assert_eq!(c.name().parse::<Command>(), Ok(*c));
        }
        assert!("window".parse::<Command>().is_err());
    }

    #[test]
    fn underline_marks_span() {
        let src = Arc::new(String::from("1 + foo"));
        let mut out = Vec::new();
        underline(&mut out, &SubStr::new(Arc::clone(&src), 4, 3)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1 + foo\n    ^^^\n");

        let mut out = Vec::new();
        underline(&mut out, &SubStr::end_of(src)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1 + foo\n       ^\n");
    }

    #[test]
    fn report_suggests_similar_name() {
        let text = reported("sqrtt(x)");
        assert!(text.contains("sqrtt(x)\n^^^^^\n"), "{text}");
        assert!(text.contains("note: function 'sqrt' has a similar name"), "{text}");
    }

    #[test]
    fn report_explains_implicit_multiplication() {
        let text = reported("5x");
        assert!(text.contains("implicit multiplication"), "{text}");
    }

    #[test]
    fn report_points_at_equals() {
        let text = reported("y = x^2");
        assert!(text.contains("right-hand side"), "{text}");
    }

    #[test]
    fn report_domain_errors() {
        assert!(reported("x { 5 < x }").contains("both sides"));
        assert!(reported("x { 1 < z < 2 }").contains("'t' for parametric"));
    }

    #[test]
    fn data_blocks_break_at_non_finite_points() {
        let p = |x, y| Point { x, y };
        let points = [
            p(0.0, 1.0),
            p(0.5, f32::NAN),
            p(1.0, f32::INFINITY),
            p(1.5, 2.0),
            p(2.0, 2.5),
        ];
        assert!(is_plottable(&points));
        let mut out = Vec::new();
        write_data_block(&mut out, &points).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 1\n\n1.5 2\n2 2.5\n");
    }

    #[test]
    fn nothing_to_plot() {
        assert!(!is_plottable(&[]));
        assert!(!is_plottable(&[Point {
            x: 0.0,
            y: f32::NEG_INFINITY
        }]));

        let pole = Equation::parse("1/(x - x)").unwrap();
        let mut graph = Graph::new(false);
        graph.generate(&pole, &Settings::default()).unwrap();
        assert!(!is_plottable(graph.visible_points()));
    }

    #[test]
    fn dump_lists_operations() {
        let expr = compile::compile("x + 1", stdlib::X).unwrap();
        let mut out = Vec::new();
        dump_program(&mut out, "f(x)", &expr).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "f(x) = x + 1:\n  call 'x'\n  push 1\n  call 'add'\n"
        );
    }
}
