// SPDX: CC0-1.0

use crate::{
    domain,
    error::{Component, EquationErr, EquationErrTyp},
    Number, Settings,
};
use core::{fmt, ops::Range, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EquationKind {
    /// `x = f(y)`, stored as an expression in `x`
    ExplicitX,
    /// `y = f(x)`
    ExplicitY,
    /// `(x(t), y(t))`
    Parametric,
}

impl EquationKind {
    /// The coordinate an explicit equation computes; `None` for parametric
    /// equations, which compute both.
    pub const fn computed_axis(&self) -> Option<Axis> {
        match self {
            Self::ExplicitX => Some(Axis::X),
            Self::ExplicitY => Some(Axis::Y),
            Self::Parametric => None,
        }
    }
}

impl fmt::Display for EquationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExplicitX => write!(f, "x = f(y)"),
            Self::ExplicitY => write!(f, "y = f(x)"),
            Self::Parametric => write!(f, "parametric"),
        }
    }
}

/// The coordinate an explicit equation computes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Equation {
    source: String,
    expression_1: String,
    expression_2: String,
    domain_left: Number,
    domain_right: Number,
    kind: EquationKind,
}

impl Equation {
    /// Parses `raw` using the default domain of `Settings::default()`.
    pub fn parse(raw: &str) -> Result<Self, EquationErr> {
        Self::parse_with(raw, &Settings::default())
    }

    pub fn parse_with(raw: &str, settings: &Settings) -> Result<Self, EquationErr> {
        if raw.is_empty() {
            return Err(EquationErrTyp::EmptyInput.into());
        }

        let (expr, domain) = domain::split(raw, &settings.default_domain)?;
        let (kind, expression_1, expression_2) = if expr.contains(',') {
            let (x, y) = split_parametric(expr)?;
            (EquationKind::Parametric, x.to_string(), y.to_string())
        } else if uses_standalone_symbol(expr, 'y') {
            // x = f(y) is evaluated through the same single-variable path as y = f(x)
            (EquationKind::ExplicitX, replace_symbol(expr, 'y', 'x'), String::new())
        } else {
            (EquationKind::ExplicitY, expr.to_string(), String::new())
        };
        log::debug!(
            "classified '{raw}' as {kind} on [{}, {}]",
            domain.start,
            domain.end
        );

        Ok(Self {
            source: expr.to_string(),
            expression_1,
            expression_2,
            domain_left: domain.start,
            domain_right: domain.end,
            kind,
        })
    }

    /// The expression as typed, without its domain clause.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// `f` for explicit equations, `x(t)` for parametric ones.
    pub fn expression_1(&self) -> &str {
        &self.expression_1
    }

    /// `y(t)` for parametric equations, empty otherwise.
    pub fn expression_2(&self) -> &str {
        &self.expression_2
    }

    pub const fn domain_left(&self) -> Number {
        self.domain_left
    }

    pub const fn domain_right(&self) -> Number {
        self.domain_right
    }

    pub const fn domain(&self) -> Range<Number> {
        self.domain_left..self.domain_right
    }

    pub const fn kind(&self) -> EquationKind {
        self.kind
    }
}

impl FromStr for Equation {
    type Err = EquationErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EquationKind::ExplicitX => write!(f, "x = {}", self.expression_1.trim())?,
            EquationKind::ExplicitY => write!(f, "y = {}", self.expression_1.trim())?,
            EquationKind::Parametric => {
                write!(f, "({}, {})", self.expression_1, self.expression_2)?
            }
        }
        write!(f, " on [{}, {}]", self.domain_left, self.domain_right)
    }
}

fn split_parametric(expr: &str) -> Result<(&str, &str), EquationErr> {
    let expr = strip_outer_parens(expr);
    let (x, y) = expr.split_once(',').unwrap_or((expr, ""));
    let (x, y) = (x.trim(), y.trim());
    for (text, component) in [(x, Component::X), (y, Component::Y)] {
        if text.is_empty() {
            return Err(EquationErrTyp::EmptyParametricComponent { component }.into());
        }
    }
    Ok((x, y))
}

/// Whether `s` is a single parenthesized group, like `(a, (b))` but not
/// `(a) + (b)`.
pub fn is_fully_wrapped(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'(' || bytes[bytes.len() - 1] != b')' {
        return false;
    }

    let mut depth = 0isize;
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
        if depth == 0 && i != bytes.len() - 1 {
            return false;
        }
    }
    depth == 0
}

/// Removes every layer of parentheses that wraps all of `s`, along with
/// surrounding whitespace.
pub fn strip_outer_parens(mut s: &str) -> &str {
    s = s.trim();
    while is_fully_wrapped(s) {
        s = s[1..s.len() - 1].trim();
    }
    s
}

fn is_standalone_at(s: &str, idx: usize, len: usize) -> bool {
    let bytes = s.as_bytes();
    let left = idx == 0 || !bytes[idx - 1].is_ascii_alphanumeric();
    let right = bytes
        .get(idx + len)
        .map(|b| !b.is_ascii_alphanumeric())
        .unwrap_or(true);
    left && right
}

/// Whether `symbol` occurs in `s` other than as part of a longer identifier
/// (`y` in `y + 1` but not in `ymax` or `2y`).
pub fn uses_standalone_symbol(s: &str, symbol: char) -> bool {
    s.char_indices()
        .any(|(idx, chr)| chr == symbol && is_standalone_at(s, idx, chr.len_utf8()))
}

/// Replaces every standalone occurrence of `from` with `to`.
pub fn replace_symbol(s: &str, from: char, to: char) -> String {
    s.char_indices()
        .map(|(idx, chr)| {
            if chr == from && is_standalone_at(s, idx, chr.len_utf8()) {
                to
            } else {
                chr
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standalone_symbol_boundaries() {
        assert!(uses_standalone_symbol("y", 'y'));
        assert!(uses_standalone_symbol("y+1", 'y'));
        assert!(uses_standalone_symbol("1+y", 'y'));
        assert!(uses_standalone_symbol("sin(y)", 'y'));
        assert!(uses_standalone_symbol("ymax + y", 'y'));
        assert!(!uses_standalone_symbol("", 'y'));
        assert!(!uses_standalone_symbol("ymax", 'y'));
        assert!(!uses_standalone_symbol("3*yy", 'y'));
        assert!(!uses_standalone_symbol("2y", 'y'));
        assert!(!uses_standalone_symbol("y2", 'y'));
        assert!(!uses_standalone_symbol("x^2", 'y'));
    }

    #[test]
    fn replace_only_standalone() {
        assert_eq!(replace_symbol("y^2", 'y', 'x'), "x^2");
        assert_eq!(replace_symbol("ymax*y + y", 'y', 'x'), "ymax*x + x");
        assert_eq!(replace_symbol("sin(y)/y", 'y', 'x'), "sin(x)/x");
        assert_eq!(replace_symbol("yy", 'y', 'x'), "yy");
    }

    #[test]
    fn fully_wrapped() {
        assert!(is_fully_wrapped("()"));
        assert!(is_fully_wrapped("(a, b)"));
        assert!(is_fully_wrapped("((a), (b))"));
        assert!(!is_fully_wrapped("(a) + (b)"));
        assert!(!is_fully_wrapped("(a"));
        assert!(!is_fully_wrapped("a)"));
        assert!(!is_fully_wrapped(" (a)"));
        assert!(!is_fully_wrapped("("));
    }

    #[test]
    fn strips_every_wrapping_layer() {
        assert_eq!(strip_outer_parens(" ((a, b)) "), "a, b");
        assert_eq!(strip_outer_parens("( (a, b) )"), "a, b");
        assert_eq!(strip_outer_parens("(a), (b)"), "(a), (b)");
    }

    #[test]
    fn explicit_in_x() {
        let eq = Equation::parse("x^2").unwrap();
        assert_eq!(eq.kind(), EquationKind::ExplicitY);
        assert_eq!(eq.expression_1(), "x^2");
        assert_eq!(eq.expression_2(), "");
        assert_eq!(eq.domain(), -1.0..1.0);
    }

    #[test]
    fn explicit_in_y_is_rewritten() {
        let eq = Equation::parse("y^2").unwrap();
        assert_eq!(eq.kind(), EquationKind::ExplicitX);
        assert_eq!(eq.expression_1(), "x^2");
        assert_eq!(eq.domain(), -1.0..1.0);
    }

    #[test]
    fn computed_axis_matches_kind() {
        let axis = |raw| Equation::parse(raw).unwrap().kind().computed_axis();
        assert_eq!(axis("x^2"), Some(Axis::Y));
        assert_eq!(axis("y^2"), Some(Axis::X));
        assert_eq!(axis("(t, t)"), None);
    }

    #[test]
    fn source_keeps_typed_text() {
        let eq = Equation::parse("y^2 + ymax { 0 < x < 1 }").unwrap();
        assert_eq!(eq.source(), "y^2 + ymax ");
        assert_eq!(eq.expression_1(), "x^2 + ymax ");
    }

    #[test]
    fn longer_identifier_is_not_y() {
        let eq = Equation::parse("ymax + x").unwrap();
        assert_eq!(eq.kind(), EquationKind::ExplicitY);
        assert_eq!(eq.expression_1(), "ymax + x");
    }

    #[test]
    fn parametric_with_domain() {
        let eq: Equation = "(sin(t), cos(t)) { -pi <= t <= pi }".parse().unwrap();
        assert_eq!(eq.kind(), EquationKind::Parametric);
        assert_eq!(eq.expression_1(), "sin(t)");
        assert_eq!(eq.expression_2(), "cos(t)");
        assert!((eq.domain_left() + 3.1415926535).abs() < 1e-9);
        assert!((eq.domain_right() - 3.1415926535).abs() < 1e-9);
    }

    #[test]
    fn parametric_without_parentheses() {
        let eq = Equation::parse("t, t^2").unwrap();
        assert_eq!(eq.kind(), EquationKind::Parametric);
        assert_eq!(eq.expression_1(), "t");
        assert_eq!(eq.expression_2(), "t^2");
    }

    #[test]
    fn empty_parametric_component() {
        let err = Equation::parse("( , cos(t))").unwrap_err();
        assert!(matches!(
            err.typ,
            EquationErrTyp::EmptyParametricComponent {
                component: Component::X
            }
        ));
        let err = Equation::parse("(sin(t), )").unwrap_err();
        assert!(matches!(
            err.typ,
            EquationErrTyp::EmptyParametricComponent {
                component: Component::Y
            }
        ));
    }

    #[test]
    fn empty_input() {
        let err = Equation::parse("").unwrap_err();
        assert!(matches!(err.typ, EquationErrTyp::EmptyInput));
    }

    #[test]
    fn domain_errors_propagate() {
        let err = Equation::parse("x { 5 < x }").unwrap_err();
        assert!(matches!(err.typ, EquationErrTyp::InvalidDomainSyntax));
        let err = Equation::parse("x { 1 < z < 2 }").unwrap_err();
        assert!(matches!(
            err.typ,
            EquationErrTyp::UnknownDomainIdentifier { .. }
        ));
    }

    #[test]
    fn reversed_domain_is_normalized() {
        let eq = Equation::parse("x { 5 < x < -5 }").unwrap();
        assert_eq!(eq.domain_left(), -5.0);
        assert_eq!(eq.domain_right(), 5.0);
    }

    #[test]
    fn configured_default_domain() {
        let settings = Settings {
            default_domain: -10.0..10.0,
            ..Settings::default()
        };
        let eq = Equation::parse_with("x", &settings).unwrap();
        assert_eq!(eq.domain(), -10.0..10.0);
        let eq = Equation::parse_with("x { 0 < x < 1 }", &settings).unwrap();
        assert_eq!(eq.domain(), 0.0..1.0);
    }
}
