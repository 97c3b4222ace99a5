//! Persisted settings layout of the surface configuration store.
//!
//! The engine reads these through [`SurfaceSettings::field_params`]; the
//! display-only keys (`colorMode`, `pointSize`, `damping`, `showTrails`,
//! `showGrid`, `autoRotate`) are carried so an exported file round-trips.

use crate::error::SettingsError;
use crate::eval::cache::Variables;
use crate::eval::fields::GOLDEN_RATIO;
use crate::eval::registry::FieldKind;
use crate::eval::surface::{AnimationMode, FieldParams};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{E, PI, SQRT_2};

pub const DEFAULT_EQUATION: &str = "2 * sin(x * 0.5 + t) + cos(z * 0.3 + t * 0.8)";

/// Functions `randomize` picks from.
pub const RANDOM_POOL: &[FieldKind] = &[
    FieldKind::Waves,
    FieldKind::Sin,
    FieldKind::Cos,
    FieldKind::Tan,
    FieldKind::Electric,
    FieldKind::Ripples,
    FieldKind::Spiral,
    FieldKind::Interference,
    FieldKind::Laplace,
    FieldKind::Fourier,
    FieldKind::Bessel,
    FieldKind::Legendre,
    FieldKind::Mandelbrot,
    FieldKind::Julia,
    FieldKind::Newton,
    FieldKind::Lorenz,
    FieldKind::Rossler,
    FieldKind::Henon,
    FieldKind::NavierStokes,
    FieldKind::Schrodinger,
    FieldKind::Fibonacci,
    FieldKind::Mobius,
    FieldKind::QuantumHarmonic,
];

/// How the renderer colours points. Not read by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Height,
    Velocity,
    Gradient,
    Rainbow,
}

impl ColorMode {
    pub const ALL: &'static [ColorMode] = &[
        ColorMode::Height,
        ColorMode::Velocity,
        ColorMode::Gradient,
        ColorMode::Rainbow,
    ];
}

/// Full settings object as exported to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurfaceSettings {
    pub math_function: FieldKind,
    pub amplitude: f64,
    pub frequency: f64,
    pub speed: f64,
    pub complexity: f64,
    pub color_mode: ColorMode,
    pub point_size: f64,
    pub resolution: u32,
    pub mouse_influence: f64,
    pub animation_mode: AnimationMode,
    pub turbulence: f64,
    pub damping: f64,
    pub show_trails: bool,
    pub show_grid: bool,
    pub auto_rotate: bool,
    pub custom_equation: String,
    pub equation_variables: Variables,
}

/// Variable bindings a fresh editor starts with.
pub fn default_variables() -> Variables {
    [
        ("A", 2.0),
        ("f", 0.8),
        ("s", 1.2),
        ("c", 1.0),
        ("pi", PI),
        ("e", E),
        ("phi", GOLDEN_RATIO),
        ("sqrt2", SQRT_2),
        ("sqrt3", 3f64.sqrt()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            math_function: FieldKind::Waves,
            amplitude: 2.0,
            frequency: 0.8,
            speed: 1.2,
            complexity: 1.0,
            color_mode: ColorMode::Height,
            point_size: 0.08,
            resolution: 80,
            mouse_influence: 1.5,
            animation_mode: AnimationMode::Smooth,
            turbulence: 0.3,
            damping: 0.05,
            show_trails: false,
            show_grid: false,
            auto_rotate: false,
            custom_equation: DEFAULT_EQUATION.to_string(),
            equation_variables: default_variables(),
        }
    }
}

impl SurfaceSettings {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Randomise the visual parameters. Resolution, toggles and the custom
    /// equation are left alone.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if let Some(kind) = RANDOM_POOL.choose(rng) {
            self.math_function = *kind;
        }
        self.amplitude = rng.random_range(1.0..5.0);
        self.frequency = rng.random_range(0.3..2.3);
        self.speed = rng.random_range(0.5..3.5);
        self.complexity = rng.random_range(0.5..2.5);
        self.point_size = rng.random_range(0.04..0.19);
        self.mouse_influence = rng.random_range(0.0..2.5);
        self.animation_mode = *[
            AnimationMode::Smooth,
            AnimationMode::Pulse,
            AnimationMode::Chaotic,
        ]
        .choose(rng)
        .unwrap_or(&AnimationMode::Smooth);
        self.turbulence = rng.random_range(0.0..1.5);
        if let Some(mode) = ColorMode::ALL.choose(rng) {
            self.color_mode = *mode;
        }
    }

    pub fn export_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Bind (or rebind) a custom-equation variable.
    pub fn set_equation_variable(&mut self, name: &str, value: f64) {
        self.equation_variables.insert(name.to_string(), value);
    }

    pub fn remove_equation_variable(&mut self, name: &str) -> Option<f64> {
        self.equation_variables.remove(name)
    }

    /// The engine's per-frame parameter view.
    pub fn field_params(&self) -> FieldParams {
        FieldParams {
            kind: self.math_function,
            amplitude: self.amplitude,
            frequency: self.frequency,
            speed: self.speed,
            complexity: self.complexity,
            turbulence: self.turbulence,
            mouse_influence: self.mouse_influence,
            animation_mode: self.animation_mode,
            custom_equation: self.custom_equation.clone(),
            equation_variables: self.equation_variables.clone(),
        }
    }
}
