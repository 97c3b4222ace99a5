// eval/registry.rs - Field identifier → evaluator dispatch
//
// `FieldKind` is the closed set of surface identifiers the configuration
// store can hold. Each kind maps to a `FieldEntry` (display metadata plus a
// function pointer) through a static table indexed by the enum
// discriminant, so selection is a single array index.
//
// Identifiers without a formula of their own resolve to the `waves` entry,
// as do unknown or missing identifiers.

use crate::eval::fields::{self, FieldFn};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! field_kinds {
    ($($variant:ident => $id:literal),* $(,)?) => {
        /// Every surface identifier known to the configuration store.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum FieldKind {
            $($variant),*
        }

        impl FieldKind {
            /// All kinds in discriminant order.
            pub const ALL: &'static [FieldKind] = &[$(FieldKind::$variant),*];

            pub const COUNT: usize = Self::ALL.len();

            /// Stable snake_case identifier, as stored in settings JSON.
            pub const fn id(self) -> &'static str {
                match self {
                    $(FieldKind::$variant => $id),*
                }
            }

            pub fn from_id(id: &str) -> Option<FieldKind> {
                match id {
                    $($id => Some(FieldKind::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

field_kinds! {
    Waves => "waves",
    Sin => "sin",
    Cos => "cos",
    Tan => "tan",
    Electric => "electric",
    Ripples => "ripples",
    Spiral => "spiral",
    Interference => "interference",
    Laplace => "laplace",
    Fourier => "fourier",
    Bessel => "bessel",
    Legendre => "legendre",
    Mandelbrot => "mandelbrot",
    Julia => "julia",
    Newton => "newton",
    Barnsley => "barnsley",
    Lorenz => "lorenz",
    Rossler => "rossler",
    Chua => "chua",
    Henon => "henon",
    Logistic => "logistic",
    Bifurcation => "bifurcation",
    NavierStokes => "navier_stokes",
    Schrodinger => "schrodinger",
    Maxwell => "maxwell",
    Einstein => "einstein",
    Dirac => "dirac",
    KleinGordon => "klein_gordon",
    WaveEquation => "wave_equation",
    HeatEquation => "heat_equation",
    Poisson => "poisson",
    Helmholtz => "helmholtz",
    Burgers => "burgers",
    Kdv => "kdv",
    SineGordon => "sine_gordon",
    NonlinearSchrodinger => "nonlinear_schrodinger",
    ReactionDiffusion => "reaction_diffusion",
    Fibonacci => "fibonacci",
    Pascal => "pascal",
    Catalan => "catalan",
    EulerGamma => "euler_gamma",
    RiemannZeta => "riemann_zeta",
    Weierstrass => "weierstrass",
    Cantor => "cantor",
    Sierpinski => "sierpinski",
    Mobius => "mobius",
    Torus => "torus",
    Hyperbolic => "hyperbolic",
    Spherical => "spherical",
    Elliptic => "elliptic",
    Parabolic => "parabolic",
    Geodesic => "geodesic",
    Curvature => "curvature",
    QuantumHarmonic => "quantum_harmonic",
    QuantumWell => "quantum_well",
    HydrogenAtom => "hydrogen_atom",
    Phonon => "phonon",
    Plasmon => "plasmon",
    Soliton => "soliton",
    Breather => "breather",
    Kink => "kink",
    CellularAutomata => "cellular_automata",
    GameOfLife => "game_of_life",
    NeuralNetwork => "neural_network",
    GeneticAlgorithm => "genetic_algorithm",
    Percolation => "percolation",
    IsingModel => "ising_model",
    Custom => "custom",
}

impl FieldKind {
    /// Parse an identifier, falling back to `Waves` for unknown or missing ones.
    pub fn from_id_or_default(id: Option<&str>) -> FieldKind {
        id.and_then(FieldKind::from_id).unwrap_or_default()
    }

    /// True if this kind has no formula of its own and evaluates as `waves`.
    pub fn is_alias(self) -> bool {
        entry(self).is_none()
    }
}

impl Default for FieldKind {
    fn default() -> Self {
        FieldKind::Waves
    }
}

impl From<String> for FieldKind {
    fn from(s: String) -> Self {
        FieldKind::from_id_or_default(Some(&s))
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.id().to_string()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ── Registry table ─────────────────────────────────────────────────

/// Display metadata and evaluator for one surface.
#[derive(Debug, Clone, Copy)]
pub struct FieldEntry {
    pub title: &'static str,
    pub category: &'static str,
    pub eval: FieldFn,
}

const fn e(title: &'static str, category: &'static str, eval: FieldFn) -> Option<FieldEntry> {
    Some(FieldEntry {
        title,
        category,
        eval,
    })
}

const WAVES_ENTRY: FieldEntry = FieldEntry {
    title: "Superposition Field",
    category: "Wave Mechanics",
    eval: fields::waves,
};

/// Entry for kinds that carry their own formula; `None` for aliases.
const fn entry(kind: FieldKind) -> Option<FieldEntry> {
    use FieldKind::*;
    match kind {
        Waves => Some(WAVES_ENTRY),
        Sin => e("Harmonic Sine Wave", "Harmonic Analysis", fields::sin),
        Cos => e("Modulated Cosine", "Wave Modulation", fields::cos),
        Tan => e("Arctangent Field", "Nonlinear Dynamics", fields::tan),
        Electric => e("Electromagnetic Field", "Electromagnetism", fields::electric),
        Ripples => e("Hydrodynamic Waves", "Fluid Dynamics", fields::ripples),
        Spiral => e("Fibonacci Spiral", "Mathematical Biology", fields::spiral),
        Interference => e("Double-Slit Interference", "Quantum Optics", fields::interference),
        Laplace => e("Laplace Equation", "Partial Differential Equations", fields::laplace),
        Fourier => e("Fourier Series", "Harmonic Analysis", fields::fourier),
        Bessel => e("Bessel Functions", "Special Functions", fields::bessel),
        Legendre => e("Legendre Polynomials", "Orthogonal Polynomials", fields::legendre),
        Mandelbrot => e("Mandelbrot Set", "Fractals", fields::mandelbrot),
        Julia => e("Julia Set", "Fractals", fields::julia),
        Newton => e("Newton Fractal", "Fractals", fields::newton),
        Lorenz => e("Lorenz Attractor", "Dynamical Systems", fields::lorenz),
        Rossler => e("Rössler Attractor", "Dynamical Systems", fields::rossler),
        Henon => e("Hénon Map", "Dynamical Systems", fields::henon),
        Logistic => e("Logistic Map", "Dynamical Systems", fields::logistic),
        NavierStokes => e("Navier-Stokes Flow", "Partial Differential Equations", fields::navier_stokes),
        Schrodinger => e("Schrödinger Wave Packet", "Quantum Mechanics", fields::schrodinger),
        Maxwell => e("Maxwell Plane Wave", "Electromagnetism", fields::maxwell),
        WaveEquation => e("Wave Equation", "Partial Differential Equations", fields::wave_equation),
        HeatEquation => e("Heat Equation", "Partial Differential Equations", fields::heat_equation),
        Fibonacci => e("Fibonacci Sequence", "Number Theory", fields::fibonacci),
        RiemannZeta => e("Riemann Zeta", "Number Theory", fields::riemann_zeta),
        Weierstrass => e("Weierstrass Function", "Special Functions", fields::weierstrass),
        Mobius => e("Möbius Strip", "Topology", fields::mobius),
        Torus => e("Torus", "Topology", fields::torus),
        Hyperbolic => e("Hyperbolic Surface", "Topology", fields::hyperbolic),
        QuantumHarmonic => e("Quantum Harmonic Oscillator", "Quantum Mechanics", fields::quantum_harmonic),
        QuantumWell => e("Infinite Square Well", "Quantum Mechanics", fields::quantum_well),
        HydrogenAtom => e("Hydrogen Orbital", "Quantum Mechanics", fields::hydrogen_atom),
        Soliton => e("Soliton", "Solitons", fields::soliton),
        SineGordon => e("Sine-Gordon Kink", "Solitons", fields::sine_gordon),
        Kdv => e("Korteweg-de Vries Soliton", "Solitons", fields::kdv),
        CellularAutomata => e("Cellular Automaton", "Complex Systems", fields::cellular_automata),
        GameOfLife => e("Game of Life", "Complex Systems", fields::game_of_life),
        Custom => e("Custom Equation", "User Defined", fields::custom_unbound),
        Barnsley | Chua | Bifurcation | Einstein | Dirac | KleinGordon | Poisson | Helmholtz
        | Burgers | NonlinearSchrodinger | ReactionDiffusion | Pascal | Catalan | EulerGamma
        | Cantor | Sierpinski | Spherical | Elliptic | Parabolic | Geodesic | Curvature
        | Phonon | Plasmon | Breather | Kink | NeuralNetwork | GeneticAlgorithm | Percolation
        | IsingModel => None,
    }
}

static REGISTRY: [FieldEntry; FieldKind::COUNT] = {
    let mut table = [WAVES_ENTRY; FieldKind::COUNT];
    let mut i = 0;
    while i < FieldKind::COUNT {
        if let Some(found) = entry(FieldKind::ALL[i]) {
            table[i] = found;
        }
        i += 1;
    }
    table
};

/// Metadata for `kind`. Aliases report the `waves` entry.
#[inline]
pub fn describe(kind: FieldKind) -> &'static FieldEntry {
    &REGISTRY[kind as usize]
}

/// Evaluator for `kind`.
///
/// `Custom` maps to the pointer-only evaluator: a custom equation needs the
/// compiler's state, so the update loop evaluates it directly.
#[inline]
pub fn select(kind: FieldKind) -> FieldFn {
    REGISTRY[kind as usize].eval
}

/// Evaluator for a raw identifier; unknown or missing ids give `waves`.
pub fn select_id(id: Option<&str>) -> FieldFn {
    select(FieldKind::from_id_or_default(id))
}
