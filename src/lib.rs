// SPDX: CC0-1.0

pub mod compile;
pub mod domain;
pub mod equation;
pub mod error;
pub mod eval;
pub mod graph;
pub mod lex;
pub mod parse;
pub mod reveal;
pub mod shell;
pub mod stdlib;

pub use equation::{Axis, Equation, EquationKind};
pub use error::{EquationErr, EquationErrTyp};
pub use graph::{Graph, Sampler};

use core::{fmt, ops::Range};

pub type Number = f64;

/// Distance between consecutive samples, in domain units.
pub const DEFAULT_STEP: Number = 0.005;
/// Seconds a curve takes to be fully revealed.
pub const DEFAULT_ANIMATION_DURATION: f32 = 1.0;
/// Sampling interval of equations without a domain clause.
pub const DEFAULT_DOMAIN: Range<Number> = -1.0..1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub step: Number,
    pub animation_duration: f32,
    pub default_domain: Range<Number>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            animation_duration: DEFAULT_ANIMATION_DURATION,
            default_domain: DEFAULT_DOMAIN,
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("step", &self.step)
            .field("animation duration", &self.animation_duration)
            .field("default domain", &self.default_domain)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SettingsErr {
    Step(Number),
    AnimationDuration(f32),
    DefaultDomain(Range<Number>),
}

impl fmt::Display for SettingsErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step(step) => write!(f, "step must be positive and finite, got {step}"),
            Self::AnimationDuration(duration) => write!(
                f,
                "animation duration must be finite and not negative, got {duration}"
            ),
            Self::DefaultDomain(domain) => write!(
                f,
                "default domain must be finite with start <= end, got {domain:?}"
            ),
        }
    }
}

impl std::error::Error for SettingsErr {}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsErr> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(SettingsErr::Step(self.step));
        }
        if !(self.animation_duration.is_finite() && self.animation_duration >= 0.0) {
            return Err(SettingsErr::AnimationDuration(self.animation_duration));
        }
        let domain = &self.default_domain;
        if !(domain.start.is_finite() && domain.end.is_finite() && domain.start <= domain.end) {
            return Err(SettingsErr::DefaultDomain(domain.clone()));
        }
        Ok(())
    }
}
