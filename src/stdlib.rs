// SPDX: CC0-1.0

use crate::{eval::*, Number};
use core::f64::consts;
use std::collections::HashMap; // assumes Number = f64

/// Free variable of explicit equations.
pub const X: &str = "x";
/// Free variable of parametric equations.
pub const T: &str = "t";

pub fn standard_idents() -> Idents {
    let mut ret = HashMap::new();

    // operators
    for op in [
        OperatorTyp::Neg,
        OperatorTyp::Add,
        OperatorTyp::Sub,
        OperatorTyp::Mul,
        OperatorTyp::Div,
        OperatorTyp::Pow,
    ] {
        let (name, fun) = op.fun();
        ret.insert(name.into(), Ident::Fun(fun));
    }

    ret.insert("abs".into(), Ident::Fun(Fun::new(1, abs)));
    ret.insert("sqrt".into(), Ident::Fun(Fun::new(1, sqrt)));
    ret.insert("exp".into(), Ident::Fun(Fun::new(1, exp)));
    ret.insert("ln".into(), Ident::Fun(Fun::new(1, ln)));
    ret.insert("log".into(), Ident::Fun(Fun::new(2, log)));
    ret.insert("log10".into(), Ident::Fun(Fun::new(1, log10)));
    ret.insert("floor".into(), Ident::Fun(Fun::new(1, floor)));
    ret.insert("ceil".into(), Ident::Fun(Fun::new(1, ceil)));
    ret.insert("min".into(), Ident::Fun(Fun::new(2, min)));
    ret.insert("max".into(), Ident::Fun(Fun::new(2, max)));

    // trig
    ret.insert("sin".into(), Ident::Fun(Fun::new(1, sin)));
    ret.insert("cos".into(), Ident::Fun(Fun::new(1, cos)));
    ret.insert("tan".into(), Ident::Fun(Fun::new(1, tan)));
    ret.insert("asin".into(), Ident::Fun(Fun::new(1, arcsin)));
    ret.insert("acos".into(), Ident::Fun(Fun::new(1, arccos)));
    ret.insert("atan".into(), Ident::Fun(Fun::new(1, arctan)));
    ret.insert("arcsin".into(), Ident::Fun(Fun::new(1, arcsin)));
    ret.insert("arccos".into(), Ident::Fun(Fun::new(1, arccos)));
    ret.insert("arctan".into(), Ident::Fun(Fun::new(1, arctan)));
    ret.insert("sinh".into(), Ident::Fun(Fun::new(1, sinh)));
    ret.insert("cosh".into(), Ident::Fun(Fun::new(1, cosh)));
    ret.insert("tanh".into(), Ident::Fun(Fun::new(1, tanh)));

    ret.insert("pi".into(), Ident::Const(consts::PI));
    ret.insert("tau".into(), Ident::Const(consts::TAU));
    ret.insert("e".into(), Ident::Const(consts::E));
    ret
}

// arity is checked by `eval` before any of these run
#[track_caller]
fn expect_n<const N: usize>(args: &[Number]) -> [Number; N] {
    debug_assert_eq!(args.len(), N);
    core::array::from_fn(|i| args.get(i).copied().unwrap_or(Number::NAN))
}

pub fn neg(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    -x
}

pub fn add(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x + y
}

pub fn sub(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x - y
}

pub fn mul(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x * y
}

pub fn div(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x / y
}

pub fn pow(args: &[Number]) -> Number {
    let [x, exp] = expect_n::<2>(args);
    x.powf(exp)
}

pub fn abs(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.abs()
}

pub fn sqrt(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sqrt()
}

pub fn exp(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.exp()
}

pub fn ln(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.ln()
}

pub fn log(args: &[Number]) -> Number {
    let [x, base] = expect_n::<2>(args);
    x.log(base)
}

pub fn log10(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.log10()
}

pub fn floor(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.floor()
}

pub fn ceil(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.ceil()
}

pub fn min(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x.min(y)
}

pub fn max(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x.max(y)
}

pub fn sin(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sin()
}

pub fn cos(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cos()
}

pub fn tan(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.tan()
}

pub fn arcsin(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.asin()
}

pub fn arccos(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.acos()
}

pub fn arctan(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.atan()
}

pub fn sinh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sinh()
}

pub fn cosh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cosh()
}

pub fn tanh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.tanh()
}
