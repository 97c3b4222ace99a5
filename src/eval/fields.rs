// eval/fields.rs - Scalar field library
//
// One pure function per named surface. Every field has the same signature,
// `fn(&FieldInput) -> f64`, so the registry can hold them as plain function
// pointers. Each returns `base * amplitude + mouse_effect`; the pointer term
// is computed by the update loop and passed through untouched.
//
// Iterative fields (fractals, maps, truncated series) run a fixed number of
// steps, so evaluation always terminates.

use crate::eval::cache::{clamp_output, CompiledEquation};
use std::f64::consts::PI;

/// φ, used for the phase ratios of several harmonic fields.
pub const GOLDEN_RATIO: f64 = 1.618033988749;

pub const MANDELBROT_MAX_ITER: u32 = 20;
pub const JULIA_MAX_ITER: u32 = 50;
pub const NEWTON_ITER: u32 = 10;
pub const LOGISTIC_ITER: u32 = 10;

/// Per-vertex inputs shared by every field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldInput {
    pub x: f64,
    pub z: f64,
    /// `time * speed`
    pub time_speed: f64,
    /// `frequency * complexity`
    pub freq: f64,
    pub amplitude: f64,
    pub complexity: f64,
    /// Physical side length of the grid. Used to normalise coordinates.
    pub width: f64,
    /// Pointer term, already scaled by the animation mode.
    pub mouse_effect: f64,
}

pub type FieldFn = fn(&FieldInput) -> f64;

#[inline(always)]
fn radius(x: f64, z: f64) -> f64 {
    (x * x + z * z).sqrt()
}

// ── Harmonic family ─────────────────────────────────────────────────

/// Superposition of axis, diagonal and radial waves. Also the fallback.
pub fn waves(p: &FieldInput) -> f64 {
    let (x, z, ts) = (p.x, p.z, p.time_speed);
    let f = p.freq * p.complexity;
    let wave_x = (x * f + ts).sin() * 0.4;
    let wave_z = (z * f + ts * 1.414).sin() * 0.3;
    let cross = ((x + z) * f * 0.707 + ts * 0.866).sin() * 0.25;
    let radial = (radius(x, z) * f - ts * 2.0).sin() * 0.35;
    let modulation = (x * f * 0.5).sin() * (z * f * 0.5).cos() * (ts * 0.618).sin() * 0.15;
    (wave_x + wave_z + cross + radial + modulation) * p.amplitude + p.mouse_effect
}

pub fn sin(p: &FieldInput) -> f64 {
    let (x, z, ts, f, a) = (p.x, p.z, p.time_speed, p.freq, p.amplitude);
    let primary = (x * f + ts).sin() * a;
    let harmonic = (z * f + ts * 0.618).sin() * a * 0.382;
    let phase = ((x + z) * f * 0.5 + ts * 0.5).sin() * a * 0.236;
    primary + harmonic + phase + p.mouse_effect
}

pub fn cos(p: &FieldInput) -> f64 {
    let (x, z, ts, f, a) = (p.x, p.z, p.time_speed, p.freq, p.amplitude);
    let primary = (x * f + ts).cos() * a;
    let secondary = (z * f + ts * 0.707).cos() * a * 0.707;
    let modulated = (x * z * f * 0.1 + ts).cos() * a * 0.3;
    primary + secondary + modulated + p.mouse_effect
}

/// Arctangent of periodic terms, bounded to ±π/2 per component.
pub fn tan(p: &FieldInput) -> f64 {
    let (x, z, ts, a) = (p.x, p.z, p.time_speed, p.amplitude);
    // 1 / period, with period = π / (freq · complexity)
    let k = p.freq * p.complexity / PI;
    let tan_x = (x * k + ts).sin().atan() * a * 0.8;
    let tan_z = (z * k + ts * 0.75).sin().atan() * a * 0.6;
    let cross = (x * z * k * k + ts * 0.5).sin().atan() * a * 0.4;
    tan_x + tan_z + cross + p.mouse_effect
}

pub fn fourier(p: &FieldInput) -> f64 {
    let (x, z, ts, f) = (p.x, p.z, p.time_speed, p.freq);
    let mut sum = 0.0;
    for n in 1..=5 {
        let n = n as f64;
        sum += (n * f * x + ts).sin() / n + (n * f * z + ts * 1.2).sin() / n;
    }
    let modulation = (x * z * f * 0.1 + ts * 0.5).cos() * 0.3;
    (sum + modulation) * p.amplitude * 0.3 + p.mouse_effect
}

/// Damped cosine/sine approximations of J₀ and J₁ on the radial argument.
pub fn bessel(p: &FieldInput) -> f64 {
    let (x, z, ts, f) = (p.x, p.z, p.time_speed, p.freq);
    let arg = f * radius(x, z) - ts;
    let theta = z.atan2(x);
    let envelope = (-arg.abs() * 0.1).exp();
    let j0 = arg.cos() * envelope;
    let j1 = arg.sin() * arg * envelope * 0.5;
    let modulation = (theta * 3.0 + ts * 0.8).sin() * 0.2;
    (j0 + j1 + modulation) * p.amplitude + p.mouse_effect
}

/// P₂ and P₃ on coordinates normalised by half the grid width.
pub fn legendre(p: &FieldInput) -> f64 {
    let half = p.width * 0.5;
    let xn = p.x / half;
    let zn = p.z / half;
    let p2x = 0.5 * (3.0 * xn * xn - 1.0);
    let p2z = 0.5 * (3.0 * zn * zn - 1.0);
    let p3x = 0.5 * xn * (5.0 * xn * xn - 3.0);
    let phase = p.time_speed * p.freq;
    let value = (p2x + p2z) * phase.sin() + p3x * (phase * 0.7).cos() * 0.6;
    value * p.amplitude + p.mouse_effect
}

/// Harmonic functions in polar form.
pub fn laplace(p: &FieldInput) -> f64 {
    let (x, z, ts, f) = (p.x, p.z, p.time_speed, p.freq);
    let r = radius(x, z);
    let theta = z.atan2(x);
    let value = r * (f * theta + ts).cos() * (-r * 0.1).exp()
        + r * (f * theta * 2.0 + ts * 0.7).sin() * (-r * 0.08).exp() * 0.5;
    value * p.amplitude + p.mouse_effect
}

// ── Field / PDE family ─────────────────────────────────────────────

pub fn electric(p: &FieldInput) -> f64 {
    let (x, z, ts, f) = (p.x, p.z, p.time_speed, p.freq);
    let strength = (-x.abs() * 0.05).exp() * (-z.abs() * 0.05).exp();
    let wave = (x * f * 1.414 + ts * 2.0).sin() * strength;
    let lines = (z * f * 1.732 + ts * 1.5).cos() * strength;
    let interference = (radius(x, z) * f - ts * 3.0).sin() * strength * 0.5;
    (wave + lines + interference) * p.amplitude + p.mouse_effect
}

pub fn ripples(p: &FieldInput) -> f64 {
    let (ts, f) = (p.time_speed, p.freq);
    let r = radius(p.x, p.z);
    let primary = (r * f - ts * 2.236).sin() * (-r * 0.08).exp();
    let secondary =
        (r * f * GOLDEN_RATIO - ts * GOLDEN_RATIO).sin() * (-r * 0.12).exp() * 0.618;
    let tension = (r * f * 0.5 - ts).cos() * (-r * 0.15).exp() * 0.3;
    (primary + secondary + tension) * p.amplitude + p.mouse_effect
}

pub fn spiral(p: &FieldInput) -> f64 {
    let (x, z, ts, f) = (p.x, p.z, p.time_speed, p.freq);
    let angle = z.atan2(x);
    let r = radius(x, z);
    let arm = (r * f * 0.618 + angle * 5.236 + ts).sin();
    let decay = (-r * 0.03).exp();
    let modulation = (angle * GOLDEN_RATIO + ts * 0.618).cos() * 0.382;
    (arm * decay + modulation) * p.amplitude + p.mouse_effect
}

/// Two point sources at x = ±3.
pub fn interference(p: &FieldInput) -> f64 {
    const SOURCE_OFFSET: f64 = 3.0;
    let (x, z, ts) = (p.x, p.z, p.time_speed);
    let d1 = radius(x - SOURCE_OFFSET, z);
    let d2 = radius(x + SOURCE_OFFSET, z);
    let k = p.freq * 2.0 * PI;
    let pattern = (k * (d2 - d1) / 2.0).cos() * (-d1.min(d2) * 0.04).exp();
    let carrier = (k * (d1 + d2) / 2.0 - ts * 2.0).sin();
    pattern * carrier * p.amplitude + p.mouse_effect
}

pub fn maxwell(p: &FieldInput) -> f64 {
    let (x, z, ts, f) = (p.x, p.z, p.time_speed, p.freq);
    let decay = (-z.abs() * 0.05).exp();
    let electric = (f * x - ts).sin() * decay;
    let magnetic = (f * x - ts + PI / 2.0).cos() * decay;
    (electric + magnetic) * p.amplitude + p.mouse_effect
}

pub fn wave_equation(p: &FieldInput) -> f64 {
    const WAVE_SPEED: f64 = 2.0;
    let (x, z, ts, f) = (p.x, p.z, p.time_speed, p.freq);
    let standing = (f * x).sin() * (WAVE_SPEED * f * ts).cos();
    let traveling = (f * (x - WAVE_SPEED * ts)).sin() + (f * (z - WAVE_SPEED * ts)).sin();
    (standing + traveling) * p.amplitude * 0.5 + p.mouse_effect
}

pub fn heat_equation(p: &FieldInput) -> f64 {
    const DIFFUSIVITY: f64 = 0.1;
    let temp = (-DIFFUSIVITY * p.time_speed).exp() * (p.freq * p.x).sin() * (p.freq * p.z).sin();
    temp * p.amplitude + p.mouse_effect
}

pub fn schrodinger(p: &FieldInput) -> f64 {
    let (x, z) = (p.x, p.z);
    let r2 = x * x + z * z;
    let psi = (-0.1 * r2).exp() * (p.freq * (x + z) - p.time_speed).cos();
    let potential = 0.5 * r2 * 0.01;
    (psi - potential) * p.amplitude + p.mouse_effect
}

pub fn navier_stokes(p: &FieldInput) -> f64 {
    const VISCOSITY: f64 = 0.01;
    let (x, z, f) = (p.x, p.z, p.freq);
    let pressure = (x * f).sin() * (z * f).cos();
    let velocity = -VISCOSITY * ((2.0 * x * f).sin() + (2.0 * z * f).sin()) + pressure;
    velocity * p.time_speed.sin() * p.amplitude + p.mouse_effect
}

// ── Fractal / iterative family ─────────────────────────────────────

/// Escape-time count with an orbiting c, normalised to [0, 1].
pub fn mandelbrot(p: &FieldInput) -> f64 {
    let ts = p.time_speed;
    let (c_re, c_im) = (0.7269 * ts.cos(), 0.1889 * ts.sin());
    let mut re = p.x / p.width * 4.0 - 2.0;
    let mut im = p.z / p.width * 4.0 - 2.0;
    let mut iter = 0;
    while re * re + im * im < 4.0 && iter < MANDELBROT_MAX_ITER {
        let next = re * re - im * im + c_re;
        im = 2.0 * re * im + c_im;
        re = next;
        iter += 1;
    }
    (iter as f64 / MANDELBROT_MAX_ITER as f64) * p.amplitude + p.mouse_effect
}

pub fn julia(p: &FieldInput) -> f64 {
    let ts = p.time_speed;
    let c_re = 0.285 + 0.01 * ts.cos();
    let c_im = 0.01 + 0.01 * ts.sin();
    let mut re = p.x / p.width * 3.0;
    let mut im = p.z / p.width * 3.0;
    let mut iter = 0;
    while re * re + im * im < 4.0 && iter < JULIA_MAX_ITER {
        let next = re * re - im * im + c_re;
        im = 2.0 * re * im + c_im;
        re = next;
        iter += 1;
    }
    (iter as f64 / JULIA_MAX_ITER as f64) * p.amplitude + p.mouse_effect
}

/// Newton iteration toward the roots of z³ − 1; height is the final angle
/// mapped to [0, 1].
pub fn newton(p: &FieldInput) -> f64 {
    let mut re = p.x / p.width * 2.0;
    let mut im = p.z / p.width * 2.0;
    for _ in 0..NEWTON_ITER {
        let r2 = re * re + im * im;
        if r2 == 0.0 || !r2.is_finite() {
            break;
        }
        let next_re = (2.0 * re + 1.0 / r2) / 3.0;
        let next_im = (2.0 * im - im / r2) / 3.0;
        re = next_re;
        im = next_im;
    }
    (im.atan2(re) + PI) / (2.0 * PI) * p.amplitude + p.mouse_effect
}

pub fn lorenz(p: &FieldInput) -> f64 {
    const SIGMA: f64 = 10.0;
    const RHO: f64 = 28.0;
    let (x, z, ts) = (p.x, p.z, p.time_speed);
    let lx = SIGMA * (z - x) * 0.01;
    let lz = (x * (RHO - x) - z) * 0.01;
    (lx + ts).sin() * (lz + ts).cos() * p.amplitude + p.mouse_effect
}

pub fn rossler(p: &FieldInput) -> f64 {
    const A: f64 = 0.2;
    let (x, z, ts, f) = (p.x, p.z, p.time_speed, p.freq);
    let dx = -(z + x * 0.1);
    let dz = x + A * z;
    (dx * f + ts).sin() * (dz * f + ts).cos() * p.amplitude + p.mouse_effect
}

pub fn henon(p: &FieldInput) -> f64 {
    const A: f64 = 1.4;
    let next = 1.0 - A * p.x * p.x + p.z;
    (next * p.freq + p.time_speed).sin() * p.amplitude + p.mouse_effect
}

/// Logistic map with r sweeping the chaotic band around 3.57.
pub fn logistic(p: &FieldInput) -> f64 {
    let r = 3.57 + 0.4 * (p.time_speed * 0.1).sin();
    let mut v = p.x.abs() / p.width;
    for _ in 0..LOGISTIC_ITER {
        v = r * v * (1.0 - v);
    }
    // Starts outside [0, 1] diverge; keep the surface bounded.
    v.clamp(-1.0, 1.0) * p.amplitude + p.mouse_effect
}

// ── Special functions / number theory ──────────────────────────────

pub fn fibonacci(p: &FieldInput) -> f64 {
    let n = ((p.x + p.z).abs() * p.freq + 1.0).floor();
    let (mut a, mut b) = (1.0_f64, 1.0_f64);
    let mut i = 2.0;
    while i < n && i < 20.0 {
        let next = a + b;
        a = b;
        b = next;
        i += 1.0;
    }
    (b * 0.001 + p.time_speed).sin() * p.amplitude + p.mouse_effect
}

/// Ten-term partial sum of ζ(s) with s oscillating around 2.
pub fn riemann_zeta(p: &FieldInput) -> f64 {
    let s = 2.0 + 0.1 * (p.x * p.freq + p.time_speed).sin();
    let zeta: f64 = (1..=10).map(|n| 1.0 / (n as f64).powf(s)).sum();
    zeta * (p.z * p.freq + p.time_speed).sin() * p.amplitude + p.mouse_effect
}

pub fn weierstrass(p: &FieldInput) -> f64 {
    let arg = PI * (p.x + p.time_speed * 0.1);
    let w: f64 = (0..10)
        .map(|n| 0.7_f64.powi(n) * (3.0_f64.powi(n) * arg).cos())
        .sum();
    w * p.amplitude + p.mouse_effect
}

// ── Geometry / topology ────────────────────────────────────────────

pub fn mobius(p: &FieldInput) -> f64 {
    let u = p.x / p.width * 2.0 * PI;
    let v = p.z / p.width;
    let band = 1.0 + v * (u / 2.0).cos();
    let mx = band * u.cos();
    let mz = band * u.sin();
    (mx * p.freq + p.time_speed).sin() * (mz * p.freq + p.time_speed).cos() * p.amplitude
        + p.mouse_effect
}

pub fn torus(p: &FieldInput) -> f64 {
    const TUBE_RADIUS: f64 = 1.0;
    let v = p.z / p.width * 2.0 * PI;
    TUBE_RADIUS * (v + p.time_speed).sin() * p.amplitude + p.mouse_effect
}

/// sinh·cosh grows without bound in time; the product is clamped to ±10.
pub fn hyperbolic(p: &FieldInput) -> f64 {
    let hx = p.x / p.width * 2.0;
    let hz = p.z / p.width * 2.0;
    let value = (hx * p.freq + p.time_speed).sinh() * (hz * p.freq + p.time_speed).cosh();
    let value = if value.is_nan() { 0.0 } else { value.clamp(-10.0, 10.0) };
    value * p.amplitude * 0.1 + p.mouse_effect
}

// ── Quantum mechanics ──────────────────────────────────────────────

/// Third eigenstate of the harmonic oscillator (Hermite H₃).
pub fn quantum_harmonic(p: &FieldInput) -> f64 {
    const N: f64 = 3.0;
    let q = p.x / p.width * 4.0;
    let hermite = 8.0 * q * q * q - 12.0 * q;
    let psi = hermite * (-0.5 * q * q).exp() * (p.time_speed * (N + 0.5)).cos();
    psi * p.amplitude * 0.1 + p.mouse_effect
}

pub fn quantum_well(p: &FieldInput) -> f64 {
    const WELL_WIDTH: f64 = 2.0;
    let wx = p.x / p.width * WELL_WIDTH;
    if wx.abs() < WELL_WIDTH / 2.0 {
        let psi = (PI * (wx + WELL_WIDTH / 2.0) / WELL_WIDTH).sin() * p.time_speed.cos();
        psi * p.amplitude + p.mouse_effect
    } else {
        p.mouse_effect
    }
}

pub fn hydrogen_atom(p: &FieldInput) -> f64 {
    let r = radius(p.x, p.z) / p.width * 5.0;
    let theta = p.z.atan2(p.x);
    let radial = (-r).exp() * r;
    let angular = (theta + p.time_speed).cos();
    radial * angular * p.amplitude + p.mouse_effect
}

// ── Solitons ───────────────────────────────────────────────────────

/// sech² pulse travelling along x.
pub fn soliton(p: &FieldInput) -> f64 {
    let s = p.x - p.time_speed;
    let sech = 2.0 / (s.exp() + (-s).exp());
    sech * sech * p.amplitude + p.mouse_effect
}

pub fn sine_gordon(p: &FieldInput) -> f64 {
    let kink = 4.0 * (p.x / p.width - p.time_speed).exp().atan();
    kink.sin() * p.amplitude + p.mouse_effect
}

/// Korteweg-de Vries one-soliton profile.
pub fn kdv(p: &FieldInput) -> f64 {
    let sech = 1.0 / (2.0 * (p.x / p.width - p.time_speed)).cosh();
    12.0 * sech * sech * p.amplitude * 0.1 + p.mouse_effect
}

// ── Cellular / complex systems ─────────────────────────────────────

/// Checkerboard that shifts one cell per unit of `time_speed`.
pub fn cellular_automata(p: &FieldInput) -> f64 {
    let cx = (p.x / p.width * 20.0).floor() + 10.0;
    let cz = (p.z / p.width * 20.0).floor() + 10.0;
    let state = if (cx + cz + p.time_speed.floor()) % 2.0 == 0.0 {
        1.0
    } else {
        0.0
    };
    state * p.amplitude + p.mouse_effect
}

pub fn game_of_life(p: &FieldInput) -> f64 {
    let lx = (p.x / p.width * 10.0).floor() + 5.0;
    let lz = (p.z / p.width * 10.0).floor() + 5.0;
    let neighbors = (lx + p.time_speed).sin() + (lz + p.time_speed).cos();
    let alive = if neighbors.abs() > 0.5 { 1.0 } else { 0.0 };
    alive * p.amplitude + p.mouse_effect
}

// ── Custom ─────────────────────────────────────────────────────────

/// Registry entry for `custom` when no equation is available: only the
/// pointer term remains.
pub fn custom_unbound(p: &FieldInput) -> f64 {
    p.mouse_effect
}

/// Custom equation height: evaluated at (x, z, time_speed), clamped to
/// ±100, then scaled by amplitude.
pub fn custom(equation: Option<&CompiledEquation>, p: &FieldInput) -> f64 {
    match equation {
        Some(eq) => {
            clamp_output(eq.evaluate(p.x, p.z, p.time_speed)) * p.amplitude + p.mouse_effect
        }
        None => p.mouse_effect,
    }
}
