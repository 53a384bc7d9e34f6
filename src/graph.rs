// SPDX: CC0-1.0

use crate::{
    compile::{self, CompiledExpression},
    equation::{Axis, Equation},
    error::{Component, EquationErr},
    lex::SubStr,
    reveal::Reveal,
    stdlib::{T, X},
    Number, Point, Settings,
};
use core::{convert::Infallible, ops::Range};
use std::sync::Arc;

/// Largest capacity reserved up front; longer walks grow the buffer as usual.
const MAX_PRESIZE: usize = 1 << 20;

/// Compiled form of an equation, mapping a domain value to a screen-space
/// point. Screen `y` grows downwards, so computed vertical values are negated.
#[derive(Debug)]
pub enum Sampler {
    Explicit {
        expr: CompiledExpression,
        name: &'static str,
        axis: Axis,
    },
    Parametric {
        x: CompiledExpression,
        y: CompiledExpression,
    },
}

impl Sampler {
    pub fn new(equation: &Equation) -> Result<Self, EquationErr> {
        let build = |src: &str, var, name| {
            compile::compile(src, var).map_err(|err| EquationErr::compile(name, err))
        };
        match equation.kind().computed_axis() {
            None => Ok(Self::Parametric {
                x: build(equation.expression_1(), T, Component::X.name())?,
                y: build(equation.expression_2(), T, Component::Y.name())?,
            }),
            Some(axis) => {
                let name = match axis {
                    Axis::X => "f(y)",
                    Axis::Y => "f(x)",
                };
                let expr = build(equation.expression_1(), X, name).map_err(|mut err| {
                    // x = f(y) compiles the text with y renamed to x, which
                    // keeps every offset, so point back at what was typed
                    if let Some(loc) = err.loc.as_mut() {
                        let typed = Arc::new(equation.source().to_string());
                        if typed.len() == loc.src().len() {
                            *loc = SubStr::new(typed, loc.start(), loc.len());
                        }
                    }
                    err
                })?;
                Ok(Self::Explicit { expr, name, axis })
            }
        }
    }

    pub fn sample(&mut self, t: Number) -> Result<Point<f32>, EquationErr> {
        fn eval(
            expr: &mut CompiledExpression,
            name: &'static str,
            t: Number,
        ) -> Result<Number, EquationErr> {
            expr.eval(t)
                .map_err(|err| EquationErr::compile(name, expr.eval_err(err)))
        }

        match self {
            Self::Explicit { expr, name, axis } => {
                let r = eval(expr, *name, t)?;
                Ok(explicit_point(t, r, *axis))
            }
            Self::Parametric { x, y } => Ok(Point {
                x: eval(x, Component::X.name(), t)? as f32,
                y: -eval(y, Component::Y.name(), t)? as f32,
            }),
        }
    }

    /// The compiled expressions, in component order.
    pub fn expressions(&self) -> Vec<(&'static str, &CompiledExpression)> {
        match self {
            Self::Explicit { expr, name, .. } => vec![(*name, expr)],
            Self::Parametric { x, y } => {
                vec![(Component::X.name(), x), (Component::Y.name(), y)]
            }
        }
    }
}

fn explicit_point(t: Number, r: Number, axis: Axis) -> Point<f32> {
    match axis {
        Axis::Y => Point {
            x: t as f32,
            y: -r as f32,
        },
        Axis::X => Point {
            x: r as f32,
            y: t as f32,
        },
    }
}

/// Upper bound on the number of samples [`sample_domain`] takes.
pub fn sample_count(domain: &Range<Number>, step: Number) -> usize {
    // float to int casts saturate
    let steps = ((domain.end - domain.start) / step).ceil().max(0.0) as usize;
    steps.saturating_add(1)
}

/// Evaluates `f` at `domain.start + i * step` for `i = 0, 1, ...` up to and
/// including `domain.end`. Points come out in order of increasing domain
/// value; values that are not finite are kept as they are.
pub fn sample_domain<F, E>(
    mut f: F,
    domain: &Range<Number>,
    step: Number,
) -> Result<Vec<Point<f32>>, E>
where
    F: FnMut(Number) -> Result<Point<f32>, E>,
{
    let count = sample_count(domain, step);
    let mut points = Vec::with_capacity(count.min(MAX_PRESIZE));

    let mut prev: Option<Number> = None;
    for i in 0..count {
        let t = domain.start + i as Number * step;
        if t > domain.end {
            break;
        }
        if let Some(prev) = prev.filter(|&prev| t <= prev) {
            log::warn!(
                "sampling stalled at {prev} with step {step}, stopping after {} points",
                points.len()
            );
            break;
        }
        points.push(f(t)?);
        prev = Some(t);
    }

    log::debug!(
        "sampled {} points on [{}, {}]",
        points.len(),
        domain.start,
        domain.end
    );
    Ok(points)
}

/// A sampled curve plus how much of it is revealed.
#[derive(Debug)]
pub struct Graph {
    points: Vec<Point<f32>>,
    reveal: Reveal,
    sampler: Option<Sampler>,
}

impl Graph {
    pub const fn new(animate: bool) -> Self {
        Self {
            points: Vec::new(),
            reveal: Reveal::new(animate),
            sampler: None,
        }
    }

    /// Compiles and samples `equation`. On failure the graph keeps its
    /// previous points.
    pub fn generate(&mut self, equation: &Equation, settings: &Settings) -> Result<(), EquationErr> {
        let mut sampler = Sampler::new(equation)?;
        self.points = sample_domain(|t| sampler.sample(t), &equation.domain(), settings.step)?;
        self.sampler = Some(sampler);
        Ok(())
    }

    /// Samples `y = function(x)` (`Axis::Y`) or `x = function(y)` (`Axis::X`).
    pub fn set_explicit_callback<F>(
        &mut self,
        mut function: F,
        domain: &Range<Number>,
        axis: Axis,
        step: Number,
    ) where
        F: FnMut(Number) -> Number,
    {
        let points = sample_domain(
            |t| Ok::<_, Infallible>(explicit_point(t, function(t), axis)),
            domain,
            step,
        );
        match points {
            Ok(points) => self.points = points,
            Err(never) => match never {},
        }
        self.sampler = None;
    }

    /// Samples a parametric `function` returning `(x(t), y(t))`.
    pub fn set_parametric_callback<F>(&mut self, mut function: F, domain: &Range<Number>, step: Number)
    where
        F: FnMut(Number) -> Point<Number>,
    {
        let points = sample_domain(
            |t| {
                let p = function(t);
                Ok::<_, Infallible>(Point {
                    x: p.x as f32,
                    y: -p.y as f32,
                })
            },
            domain,
            step,
        );
        match points {
            Ok(points) => self.points = points,
            Err(never) => match never {},
        }
        self.sampler = None;
    }

    pub fn update(&mut self, delta: f32, settings: &Settings) {
        self.reveal.update(delta, settings.animation_duration);
    }

    pub fn points(&self) -> &[Point<f32>] {
        &self.points
    }

    /// Leading points that are revealed so far.
    pub fn visible_points(&self) -> &[Point<f32>] {
        &self.points[..self.reveal.visible_len(self.points.len())]
    }

    pub const fn progress(&self) -> f32 {
        self.reveal.progress()
    }

    pub const fn sampler(&self) -> Option<&Sampler> {
        self.sampler.as_ref()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_STEP;
    use proptest::prelude::*;

    fn generated(raw: &str) -> Graph {
        let equation = Equation::parse(raw).unwrap();
        let mut graph = Graph::new(false);
        graph.generate(&equation, &Settings::default()).unwrap();
        graph
    }

    #[test]
    fn explicit_y_negates_vertical() {
        let graph = generated("x^2 { 0 < x < 1 }");
        let points = graph.points();
        // accumulated steps may land just past the right bound
        assert!((200..=201).contains(&points.len()));
        assert_eq!(points[0], Point { x: 0.0, y: -0.0 });
        let last = points[points.len() - 1];
        assert!(last.x > 0.99);
        assert!((last.y + last.x * last.x).abs() < 1e-4);
    }

    #[test]
    fn explicit_x_uses_horizontal_result() {
        let graph = generated("y^2 { 0 < x < 1 }");
        let p = graph.points()[100];
        assert!((p.y - 0.5).abs() < 1e-4);
        assert!((p.x - 0.25).abs() < 1e-4);
    }

    #[test]
    fn parametric_components() {
        let graph = generated("(cos(t), sin(t)) { 0 <= t <= pi }");
        let first = graph.points()[0];
        assert!((first.x - 1.0).abs() < 1e-6);
        assert!(first.y.abs() < 1e-6);
        // a quarter turn in, screen y points up
        let p = graph.points()[(core::f64::consts::FRAC_PI_2 / 0.005) as usize];
        assert!(p.y < -0.99);
    }

    #[test]
    fn regeneration_is_deterministic() {
        let equation = Equation::parse("sin(3*x)/x { -4 < x < 4 }").unwrap();
        let settings = Settings::default();
        let mut a = Graph::new(true);
        let mut b = Graph::new(true);
        a.generate(&equation, &settings).unwrap();
        b.generate(&equation, &settings).unwrap();
        let first = a.points().to_vec();
        a.generate(&equation, &settings).unwrap();
        let same = |p: &[Point<f32>], q: &[Point<f32>]| {
            p.len() == q.len()
                && p.iter()
                    .zip(q)
                    .all(|(p, q)| p.x.to_bits() == q.x.to_bits() && p.y.to_bits() == q.y.to_bits())
        };
        assert!(same(&first, a.points()));
        assert!(same(&first, b.points()));
    }

    #[test]
    fn non_finite_values_pass_through() {
        let graph = generated("1/(x - x) { -1 < x < 1 }");
        let points = graph.points();
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.y == f32::NEG_INFINITY));
        assert!(points.iter().all(|p| p.x.is_finite()));

        let graph = generated("sqrt(x) { -1 < x < 1 }");
        assert!(graph.points()[0].y.is_nan());
    }

    #[test]
    fn failed_generation_keeps_points() {
        let mut graph = generated("x");
        let before = graph.points().len();
        let equation = Equation::parse("x +").unwrap();
        let err = graph.generate(&equation, &Settings::default()).unwrap_err();
        assert!(matches!(
            err.typ,
            crate::error::EquationErrTyp::ExpressionCompileError { name: "f(x)", .. }
        ));
        assert_eq!(graph.points().len(), before);
    }

    #[test]
    fn parametric_error_names_component() {
        let equation = Equation::parse("(t, foo(t))").unwrap();
        let err = Graph::new(true)
            .generate(&equation, &Settings::default())
            .unwrap_err();
        match err.typ {
            crate::error::EquationErrTyp::ExpressionCompileError { name, offset, .. } => {
                assert_eq!(name, "y(t)");
                assert_eq!(offset, 0);
            }
            typ => panic!("unexpected error: {typ:?}"),
        }
    }

    #[test]
    fn configured_step() {
        let equation = Equation::parse("x { 0 < x < 1 }").unwrap();
        let settings = Settings {
            step: 0.25,
            ..Settings::default()
        };
        let mut graph = Graph::new(false);
        graph.generate(&equation, &settings).unwrap();
        let xs: Vec<f32> = graph.points().iter().map(|p| p.x).collect();
        assert_eq!(xs, [0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn callbacks() {
        let mut graph = Graph::new(false);
        graph.set_explicit_callback(|x| 2.0 * x, &(0.0..1.0), Axis::Y, 0.5);
        assert_eq!(
            graph.points(),
            [
                Point { x: 0.0, y: -0.0 },
                Point { x: 0.5, y: -1.0 },
                Point { x: 1.0, y: -2.0 }
            ]
        );
        assert!(graph.sampler().is_none());

        graph.set_parametric_callback(|t| Point { x: t, y: t + 1.0 }, &(0.0..0.5), 0.5);
        assert_eq!(
            graph.points(),
            [Point { x: 0.0, y: -1.0 }, Point { x: 0.5, y: -1.5 }]
        );
    }

    #[test]
    fn progress_follows_time() {
        let settings = Settings::default();
        let mut graph = generated("x");
        graph.update(0.3, &settings);
        assert_eq!(graph.progress(), 1.0);
        assert_eq!(graph.visible_points().len(), graph.points().len());

        let equation = Equation::parse("x").unwrap();
        let mut graph = Graph::new(true);
        graph.generate(&equation, &settings).unwrap();
        assert!(graph.visible_points().is_empty());
        graph.update(0.5, &settings);
        assert_eq!(graph.progress(), 0.5);
        assert_eq!(graph.visible_points().len(), graph.points().len() / 2);
        graph.update(0.75, &settings);
        assert_eq!(graph.progress(), 1.0);
    }

    #[test]
    fn stalled_walk_terminates() {
        let points = sample_domain(
            |t| Ok::<_, Infallible>(Point { x: t as f32, y: 0.0 }),
            &(1e20..2e20),
            0.005,
        )
        .unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn large_bounds_keep_the_sample_count() {
        let domain = 1099511627776.0..1099511627777.0;
        let mut ts = Vec::new();
        sample_domain(
            |t| {
                ts.push(t);
                Ok::<_, Infallible>(Point { x: 0.0, y: 0.0 })
            },
            &domain,
            DEFAULT_STEP,
        )
        .unwrap();
        assert!(ts.len() <= sample_count(&domain, DEFAULT_STEP));
        assert_eq!(ts.len(), 201);
        assert_eq!(ts[0], domain.start);
        assert_eq!(ts[ts.len() - 1], domain.end);

        let equation = Equation::parse("x { 1099511627776 < x < 1099511627777 }").unwrap();
        let mut graph = Graph::new(false);
        graph.generate(&equation, &Settings::default()).unwrap();
        assert_eq!(graph.points().len(), ts.len());
    }

    #[test]
    fn explicit_x_errors_show_typed_text() {
        let equation = Equation::parse("y^2 +").unwrap();
        let err = Graph::new(true)
            .generate(&equation, &Settings::default())
            .unwrap_err();
        let loc = err.loc.unwrap();
        assert_eq!(loc.src().as_str(), "y^2 +");
        assert_eq!(loc.get(), "+");
        assert_eq!(loc.start(), 4);
    }

    proptest! {
        #[test]
        fn samples_walk_the_domain(
            left in prop_oneof![-100.0f64..100.0, -1e12f64..1e12],
            width in 0.0f64..20.0,
        ) {
            let domain = left..left + width;
            let step = Settings::default().step;
            let mut ts = Vec::new();
            sample_domain(
                |t| {
                    ts.push(t);
                    Ok::<_, Infallible>(Point { x: 0.0, y: 0.0 })
                },
                &domain,
                step,
            )
            .unwrap();

            prop_assert!(!ts.is_empty());
            prop_assert!(ts.len() <= sample_count(&domain, step));
            prop_assert_eq!(ts[0], domain.start);
            prop_assert!(ts[ts.len() - 1] <= domain.end);
            for pair in ts.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }
}
