// SPDX: CC0-1.0

//! Domain clauses: the `{ a < x < b }` suffix of an equation.

use crate::{
    compile,
    error::{Bound, BoundErr, EquationErr, EquationErrTyp},
    Number,
};
use core::ops::Range;

/// Splits `raw` into its expression and sampling interval.
///
/// Input without a well-formed pair of braces (`{` before `}`) has no domain
/// clause and gets `default`. Anything after the closing brace is dropped.
pub fn split<'a>(
    raw: &'a str,
    default: &Range<Number>,
) -> Result<(&'a str, Range<Number>), EquationErr> {
    match (raw.find('{'), raw.find('}')) {
        (Some(l), Some(r)) if l < r => {
            let domain = parse(&raw[l + 1..r])?;
            Ok((&raw[..l], domain))
        }
        _ => Ok((raw, default.clone())),
    }
}

/// Evaluates the text between the braces of a domain clause. The returned
/// range is ordered (`start <= end`) and both ends are included.
pub fn parse(clause: &str) -> Result<Range<Number>, EquationErr> {
    let clause: String = clause.chars().filter(|chr| !chr.is_whitespace()).collect();
    // strictness is not modeled
    let clause = clause.replace("<=", "<").replace(">=", ">");

    let (first, last) = match (clause.find('<'), clause.rfind('<')) {
        (Some(first), Some(last)) if first != last => (first, last),
        _ => return Err(EquationErrTyp::InvalidDomainSyntax.into()),
    };

    let ident = &clause[first + 1..last];
    if ident != "x" && ident != "t" {
        return Err(EquationErrTyp::UnknownDomainIdentifier {
            found: ident.to_string(),
        }
        .into());
    }

    let left = eval_bound(&clause[..first], Bound::Left)?;
    let right = eval_bound(&clause[last + 1..], Bound::Right)?;
    log::debug!("domain clause '{clause}' evaluated to [{left}, {right}]");

    Ok(if right < left {
        right..left
    } else {
        left..right
    })
}

fn eval_bound(src: &str, bound: Bound) -> Result<Number, EquationErr> {
    let val = compile::interp(src).map_err(|err| EquationErr::bound(bound, err))?;
    if !val.is_finite() {
        return Err(EquationErrTyp::DomainBoundEvaluationError {
            bound,
            cause: BoundErr::NotFinite(val),
        }
        .into());
    }
    Ok(val)
}
