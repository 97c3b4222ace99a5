// eval/surface.rs - Per-frame surface update
//
// Recomputes every vertex height from scratch each frame: grid position,
// pointer falloff, animation-mode modulation, the selected field, then
// turbulence. Rows are independent and evaluated in parallel with rayon;
// each worker draws from its own thread-local RNG.
//
// The custom equation (if active) is compiled once per frame before the
// parallel section and shared read-only across rows.

use crate::eval::cache::{CompiledEquation, EquationCompiler, Variables};
use crate::eval::fields::{self, FieldFn, FieldInput};
use crate::eval::grid::GridSpec;
use crate::eval::registry::{self, FieldKind};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pointer influence reaches zero at this distance.
pub const POINTER_RADIUS: f64 = 4.0;

/// Per-frame blend factor of the pointer smoothing.
pub const POINTER_SMOOTHING: f64 = 0.05;

const TURBULENCE_SCALE: f64 = 0.3;

// ── Animation mode ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationMode {
    #[default]
    Smooth,
    Pulse,
    Chaotic,
    Freeze,
}

impl AnimationMode {
    /// Multiplier applied to the pointer term. `Chaotic` takes one draw.
    #[inline]
    pub fn multiplier<R: Rng + ?Sized>(self, time: f64, rng: &mut R) -> f64 {
        match self {
            AnimationMode::Smooth => 1.0,
            AnimationMode::Pulse => 0.5 + 0.5 * (time * 2.0).sin(),
            AnimationMode::Chaotic => 0.7 + 0.3 * rng.random::<f64>(),
            AnimationMode::Freeze => 0.0,
        }
    }
}

// ── Parameters ─────────────────────────────────────────────────────

/// Read-only parameter snapshot for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldParams {
    pub kind: FieldKind,
    pub amplitude: f64,
    pub frequency: f64,
    pub speed: f64,
    pub complexity: f64,
    pub turbulence: f64,
    pub mouse_influence: f64,
    pub animation_mode: AnimationMode,
    pub custom_equation: String,
    pub equation_variables: Variables,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            kind: FieldKind::Waves,
            amplitude: 2.0,
            frequency: 0.8,
            speed: 1.2,
            complexity: 1.0,
            turbulence: 0.3,
            mouse_influence: 1.5,
            animation_mode: AnimationMode::Smooth,
            custom_equation: String::new(),
            equation_variables: Variables::new(),
        }
    }
}

// ── Pointer ────────────────────────────────────────────────────────

/// A point on the grid plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pointer {
    pub x: f64,
    pub z: f64,
}

impl Pointer {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }
}

/// Exponentially smoothed pointer. The update loop only reads `current`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerTracker {
    pub current: Pointer,
    pub target: Pointer,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map normalised device coordinates (-1..1) onto a plane of the given size.
    pub fn set_target_from_ndc(&mut self, ndc_x: f64, ndc_y: f64, width: f64, height: f64) {
        self.target = Pointer::new(ndc_x * width / 2.0, ndc_y * height / 2.0);
    }

    /// Move `current` one blend step toward `target`.
    pub fn step(&mut self) {
        self.current.x += (self.target.x - self.current.x) * POINTER_SMOOTHING;
        self.current.z += (self.target.z - self.current.z) * POINTER_SMOOTHING;
    }
}

/// Linear falloff: 1 at the pointer, 0 at `POINTER_RADIUS` and beyond.
#[inline]
pub fn pointer_falloff(distance: f64) -> f64 {
    (1.0 - distance / POINTER_RADIUS).max(0.0)
}

// ── Engine ─────────────────────────────────────────────────────────

/// Everything a row worker needs, resolved once per frame.
struct Frame<'a> {
    grid: GridSpec,
    params: &'a FieldParams,
    eval: FieldFn,
    custom: Option<Arc<CompiledEquation>>,
    pointer: Pointer,
    time: f64,
    pointer_wave: f64,
}

impl Frame<'_> {
    fn input(&self, x: f64, z: f64, mouse_effect: f64) -> FieldInput {
        FieldInput {
            x,
            z,
            time_speed: self.time * self.params.speed,
            freq: self.params.frequency * self.params.complexity,
            amplitude: self.params.amplitude,
            complexity: self.params.complexity,
            width: self.grid.width,
            mouse_effect,
        }
    }

    fn field(&self, input: &FieldInput) -> f64 {
        if self.params.kind == FieldKind::Custom {
            fields::custom(self.custom.as_deref(), input)
        } else {
            (self.eval)(input)
        }
    }

    fn height<R: Rng + ?Sized>(&self, i: usize, j: usize, rng: &mut R) -> f64 {
        let p = self.params;
        let (x, z) = self.grid.position(i, j);
        let distance = ((x - self.pointer.x).powi(2) + (z - self.pointer.z).powi(2)).sqrt();
        let radius = pointer_falloff(distance);

        let mut mouse_effect = radius * p.amplitude * p.mouse_influence * self.pointer_wave;
        mouse_effect *= p.animation_mode.multiplier(self.time, rng);

        let mut h = self.field(&self.input(x, z, mouse_effect));
        if p.turbulence > 0.0 {
            h += (rng.random::<f64>() - 0.5) * p.turbulence * p.amplitude * TURBULENCE_SCALE;
        }
        if h.is_finite() {
            h
        } else {
            0.0
        }
    }
}

/// Owns the equation compiler state and drives per-frame updates.
pub struct SurfaceEngine {
    compiler: EquationCompiler,
}

impl SurfaceEngine {
    pub fn new() -> Self {
        Self::with_compiler(EquationCompiler::new())
    }

    pub fn with_compiler(compiler: EquationCompiler) -> Self {
        Self { compiler }
    }

    pub fn compiler(&self) -> &EquationCompiler {
        &self.compiler
    }

    pub fn compiler_mut(&mut self) -> &mut EquationCompiler {
        &mut self.compiler
    }

    /// Rewrite the y component of every vertex in `buffer`.
    ///
    /// x and z are never written. A buffer shorter than the grid is updated
    /// as far as it goes.
    pub fn update(
        &mut self,
        buffer: &mut [f32],
        time: f64,
        pointer: Pointer,
        grid: GridSpec,
        params: &FieldParams,
    ) {
        let frame = self.frame(time, pointer, grid, params);
        let side = grid.side();

        buffer
            .par_chunks_mut(side * 3)
            .take(side)
            .enumerate()
            .for_each(|(i, row)| {
                let mut rng = rand::rng();
                for (j, vertex) in row.chunks_exact_mut(3).enumerate() {
                    vertex[1] = frame.height(i, j, &mut rng) as f32;
                }
            });
    }

    /// Field value at (x, z) with no pointer term and no turbulence.
    pub fn base_height(&mut self, x: f64, z: f64, time: f64, width: f64, params: &FieldParams) -> f64 {
        let grid = GridSpec::new(0, width);
        let frame = self.frame(time, Pointer::default(), grid, params);
        let h = frame.field(&frame.input(x, z, 0.0));
        if h.is_finite() {
            h
        } else {
            0.0
        }
    }

    fn frame<'a>(
        &mut self,
        time: f64,
        pointer: Pointer,
        grid: GridSpec,
        params: &'a FieldParams,
    ) -> Frame<'a> {
        let custom = if params.kind == FieldKind::Custom
            && !params.custom_equation.trim().is_empty()
        {
            self.compiler
                .compile(&params.custom_equation, &params.equation_variables)
                .ok()
        } else {
            None
        };
        Frame {
            grid,
            params,
            eval: registry::select(params.kind),
            custom,
            pointer,
            time,
            pointer_wave: (time * params.speed * 3.0).sin(),
        }
    }
}

impl Default for SurfaceEngine {
    fn default() -> Self {
        Self::new()
    }
}
