// eval/cache.rs - Custom equation compiler with bounded FIFO cache
//
// Compiles user equation text into a `CompiledEquation` and keeps the result
// keyed by (text + serialized variable snapshot). Two pieces of state live
// on the compiler instance:
//
//   - a bounded cache (50 entries). Lookups use `peek`, which never touches
//     recency, so the `LruCache` evicts strictly in insertion order.
//   - a rejection set of equation texts that failed to compile. A rejected
//     text is never parsed again for the lifetime of the compiler.
//
// The compiler is owned by the surface engine and is only touched between
// frames (compile once per update), so it needs no locking.

use crate::error::CompileError;
use crate::eval::compiled::{is_reserved, Program, COORDINATE_NAMES};
use crate::eval::expr;
use lru::LruCache;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// User variable bindings. Ordered, so the serialized snapshot is stable.
pub type Variables = BTreeMap<String, f64>;

/// Maximum number of compiled equations kept.
pub const CACHE_CAPACITY: usize = 50;

/// Custom equation output is clamped to ±this before amplitude scaling.
pub const OUTPUT_CLAMP: f64 = 100.0;

/// Words that never belong in an arithmetic expression.
const FORBIDDEN_WORDS: &[&str] = &[
    "while",
    "for",
    "do",
    "loop",
    "eval",
    "Function",
    "function",
    "new",
    "import",
    "require",
    "constructor",
    "prototype",
    "this",
    "return",
];

// ── Compiled equation ───────────────────────────────────────────────

/// A resolved program plus the variable values it was compiled against.
#[derive(Debug, Clone)]
pub struct CompiledEquation {
    source: String,
    program: Program,
    slots: SmallVec<[f64; 8]>,
}

impl CompiledEquation {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate with the bound variable snapshot. Non-finite results become 0.
    #[inline]
    pub fn evaluate(&self, x: f64, z: f64, t: f64) -> f64 {
        finite_or_zero(self.program.eval(x, z, t, &self.slots))
    }

    /// Evaluate with a fresh variable map. Names missing from `variables`
    /// keep the value they were compiled with.
    pub fn evaluate_with(&self, x: f64, z: f64, t: f64, variables: &Variables) -> f64 {
        let slots: SmallVec<[f64; 8]> = self
            .program
            .slot_names()
            .iter()
            .zip(self.slots.iter())
            .map(|(name, bound)| variables.get(name).copied().unwrap_or(*bound))
            .collect();
        finite_or_zero(self.program.eval(x, z, t, &slots))
    }
}

#[inline(always)]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Clamp a custom equation value into `[-OUTPUT_CLAMP, OUTPUT_CLAMP]`.
#[inline(always)]
pub fn clamp_output(v: f64) -> f64 {
    v.clamp(-OUTPUT_CLAMP, OUTPUT_CLAMP)
}

// ── Cache key ──────────────────────────────────────────────────────

/// Equation text concatenated with a snapshot of the bindings.
///
/// Values are written with `{:?}` so NaN, `inf` and `-inf` stay distinct.
pub fn cache_key(text: &str, variables: &Variables) -> String {
    let mut key = String::with_capacity(text.len() + 1 + variables.len() * 12);
    key.push_str(text);
    key.push('|');
    for (i, (name, value)) in variables.iter().enumerate() {
        if i > 0 {
            key.push(',');
        }
        let _ = write!(key, "{}={:?}", name, value);
    }
    key
}

// ── Compiler ───────────────────────────────────────────────────────

pub struct EquationCompiler {
    cache: LruCache<String, Arc<CompiledEquation>>,
    rejected: FxHashSet<String>,
    compile_attempts: usize,
}

impl EquationCompiler {
    pub fn new() -> Self {
        Self::with_capacity(CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(cap),
            rejected: FxHashSet::default(),
            compile_attempts: 0,
        }
    }

    /// Compile `text` against `variables`, serving from cache when possible.
    ///
    /// Rejected texts short-circuit with `CompileError::PreviouslyRejected`
    /// without being parsed again.
    pub fn compile(
        &mut self,
        text: &str,
        variables: &Variables,
    ) -> Result<Arc<CompiledEquation>, CompileError> {
        if self.rejected.contains(text) {
            return Err(CompileError::PreviouslyRejected);
        }

        let key = cache_key(text, variables);
        if let Some(hit) = self.cache.peek(&key) {
            return Ok(Arc::clone(hit));
        }

        self.compile_attempts += 1;
        match build(text, variables) {
            Ok(eq) => {
                let eq = Arc::new(eq);
                if let Some((evicted, _)) = self.cache.push(key, Arc::clone(&eq)) {
                    log::debug!("equation cache full, evicted {:?}", evicted);
                }
                Ok(eq)
            }
            Err(e) => {
                log::warn!("equation compilation failed for {:?}: {}", text, e);
                self.rejected.insert(text.to_string());
                Err(e)
            }
        }
    }

    /// Compile and evaluate in one step. Any failure contributes 0.
    pub fn evaluate(&mut self, text: &str, variables: &Variables, x: f64, z: f64, t: f64) -> f64 {
        match self.compile(text, variables) {
            Ok(eq) => eq.evaluate(x, z, t),
            Err(_) => 0.0,
        }
    }

    pub fn is_rejected(&self, text: &str) -> bool {
        self.rejected.contains(text)
    }

    /// Whether a compiled entry exists for this exact text + bindings.
    pub fn is_cached(&self, text: &str, variables: &Variables) -> bool {
        self.cache.contains(&cache_key(text, variables))
    }

    /// Number of cached compiled equations.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// How many times a compile actually ran (cache and rejection hits excluded).
    pub fn compile_attempts(&self) -> usize {
        self.compile_attempts
    }

    /// Drop every cached entry and every rejection.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.rejected.clear();
        self.compile_attempts = 0;
    }
}

impl Default for EquationCompiler {
    fn default() -> Self {
        Self::new()
    }
}

fn build(text: &str, variables: &Variables) -> Result<CompiledEquation, CompileError> {
    let source = text.trim();

    if let Some(word) = forbidden_word(source) {
        return Err(CompileError::Forbidden(word.to_string()));
    }

    let ast = expr::parse(source)?;

    let mut bindable = Variables::new();
    for (name, value) in variables {
        if is_reserved(name) || COORDINATE_NAMES.contains(&name.as_str()) {
            log::warn!("variable {:?} shadows a reserved name and is ignored", name);
            continue;
        }
        bindable.insert(name.clone(), *value);
    }

    let program = Program::resolve(&ast, &bindable)?;
    let slots: SmallVec<[f64; 8]> = program
        .slot_names()
        .iter()
        .map(|n| bindable.get(n).copied().unwrap_or(0.0))
        .collect();

    let equation = CompiledEquation {
        source: source.to_string(),
        program,
        slots,
    };
    // Origin probe goes through the guarded evaluator: a pole at the origin
    // reads as 0 here and is clamped at runtime like any other.
    log::debug!(
        "compiled {:?}, origin value {}",
        equation.source,
        equation.evaluate(0.0, 0.0, 0.0)
    );
    Ok(equation)
}

/// First denylisted word appearing as a whole identifier in `text`.
fn forbidden_word(text: &str) -> Option<&'static str> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .find_map(|w| FORBIDDEN_WORDS.iter().copied().find(|f| *f == w))
}

// ── Editor templates ───────────────────────────────────────────────

/// Named starting points offered by the equation editor.
pub const EQUATION_TEMPLATES: &[(&str, &str)] = &[
    ("Basic Wave", "A * sin(f * x + s * t) + A * cos(f * z + s * t)"),
    (
        "Interference",
        "A * cos(f * sqrt((x-2)^2 + z^2) - s * t) + A * cos(f * sqrt((x+2)^2 + z^2) - s * t)",
    ),
    ("Spiral", "A * sin(f * sqrt(x^2 + z^2) + atan2(z, x) * phi + s * t)"),
    ("Mandelbrot", "A * (x^2 - z^2 + c1) + A * (2*x*z + c2)"),
    ("Gaussian", "A * exp(-(x^2 + z^2)/(2*sigma^2)) * cos(f*t)"),
    ("Hyperbolic", "A * sinh(x/w) * cosh(z/w) * sin(f*t)"),
    (
        "Polynomial",
        "A * (a3*x^3 + a2*x^2 + a1*x + a0) * sin(f*z + s*t)",
    ),
    (
        "Bessel-like",
        "A * cos(f * sqrt(x^2 + z^2) - s*t) / (1 + 0.1*sqrt(x^2 + z^2))",
    ),
    (
        "Quantum Well",
        "A * sin(pi*n*(x+L/2)/L) * cos(E*t) * (abs(x) < L/2 ? 1 : 0)",
    ),
    ("Soliton", "A / (cosh(k*(x - v*t)))^2"),
    (
        "Lorenz-inspired",
        "A * sin(sigma*(z-x)*0.01 + s*t) * cos(x*(rho-x)*0.01 + s*t)",
    ),
];

/// (name, text) pairs of the editor templates.
pub fn equation_templates() -> &'static [(&'static str, &'static str)] {
    EQUATION_TEMPLATES
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn vars(pairs: &[(&str, f64)]) -> Variables {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn compile_and_evaluate_round_trip() {
        let mut c = EquationCompiler::new();
        let v = vars(&[("A", 2.0)]);
        let eq = c.compile("A * sin(x) + t", &v).unwrap();
        assert_eq!(eq.evaluate(0.0, 0.0, 0.0), 0.0);
        assert!((eq.evaluate(FRAC_PI_2, 0.0, 1.0) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn evaluate_with_fresh_bindings() {
        let mut c = EquationCompiler::new();
        let eq = c.compile("A * x", &vars(&[("A", 2.0)])).unwrap();
        assert_eq!(eq.evaluate_with(3.0, 0.0, 0.0, &vars(&[("A", 5.0)])), 15.0);
        // missing name keeps the compiled value
        assert_eq!(eq.evaluate_with(3.0, 0.0, 0.0, &Variables::new()), 6.0);
    }

    #[test]
    fn cache_hit_returns_same_program() {
        let mut c = EquationCompiler::new();
        let v = vars(&[("A", 1.0)]);
        let a = c.compile("A * x", &v).unwrap();
        let b = c.compile("A * x", &v).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(c.compile_attempts(), 1);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn different_bindings_are_different_entries() {
        let mut c = EquationCompiler::new();
        c.compile("A * x", &vars(&[("A", 1.0)])).unwrap();
        c.compile("A * x", &vars(&[("A", 2.0)])).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.compile_attempts(), 2);
    }

    #[test]
    fn cache_key_ignores_insertion_order() {
        let mut a = Variables::new();
        a.insert("b".into(), 2.0);
        a.insert("a".into(), 1.0);
        let mut b = Variables::new();
        b.insert("a".into(), 1.0);
        b.insert("b".into(), 2.0);
        assert_eq!(cache_key("x", &a), cache_key("x", &b));
        assert_eq!(cache_key("x", &a), "x|a=1.0,b=2.0");
    }

    #[test]
    fn cache_key_separates_non_finite_bindings() {
        let nan = vars(&[("k", f64::NAN)]);
        let inf = vars(&[("k", f64::INFINITY)]);
        let neg = vars(&[("k", f64::NEG_INFINITY)]);
        assert_ne!(cache_key("k * x", &nan), cache_key("k * x", &inf));
        assert_ne!(cache_key("k * x", &inf), cache_key("k * x", &neg));

        let mut c = EquationCompiler::new();
        let a = c.compile("k * x", &nan).unwrap();
        let b = c.compile("k * x", &inf).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(c.len(), 2);
        // both are non-finite at runtime and read as 0
        assert_eq!(b.evaluate(1.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn forbidden_text_is_rejected_once() {
        let mut c = EquationCompiler::new();
        let v = Variables::new();
        assert_eq!(
            c.compile("while(true){}", &v).unwrap_err(),
            CompileError::Forbidden("while".into())
        );
        assert_eq!(c.compile_attempts(), 1);
        assert!(c.is_rejected("while(true){}"));

        assert_eq!(
            c.compile("while(true){}", &v).unwrap_err(),
            CompileError::PreviouslyRejected
        );
        assert_eq!(c.compile_attempts(), 1);
    }

    #[test]
    fn rejection_ignores_bindings() {
        let mut c = EquationCompiler::new();
        assert!(c.compile("q + 1", &Variables::new()).is_err());
        // binding q later does not resurrect the text
        assert_eq!(
            c.compile("q + 1", &vars(&[("q", 1.0)])).unwrap_err(),
            CompileError::PreviouslyRejected
        );
    }

    #[test]
    fn forbidden_matches_whole_words_only() {
        assert_eq!(forbidden_word("for(;;)"), Some("for"));
        assert_eq!(forbidden_word("eval(x)"), Some("eval"));
        assert_eq!(forbidden_word("format + fortune"), None);
        assert_eq!(forbidden_word("sin(x)"), None);
    }

    #[test]
    fn syntax_errors_are_rejected() {
        let mut c = EquationCompiler::new();
        assert!(matches!(
            c.compile("sin(x", &Variables::new()),
            Err(CompileError::Parse(_))
        ));
        assert!(c.is_rejected("sin(x"));
        assert_eq!(c.len(), 0);
    }

    #[test]
    fn pole_at_origin_still_compiles() {
        let mut c = EquationCompiler::new();
        let v = Variables::new();
        let eq = c.compile("1 / x", &v).unwrap();
        assert!(!c.is_rejected("1 / x"));
        assert_eq!(eq.evaluate(0.0, 0.0, 0.0), 0.0);
        assert_eq!(c.evaluate("1 / x", &v, 0.5, 0.0, 0.0), 2.0);
        assert_eq!(c.compile_attempts(), 1);
    }

    #[test]
    fn runtime_non_finite_is_zero_but_not_rejected() {
        let mut c = EquationCompiler::new();
        let v = Variables::new();
        let eq = c.compile("1 / (x - 1)", &v).unwrap();
        assert_eq!(eq.evaluate(1.0, 0.0, 0.0), 0.0);
        assert_eq!(eq.evaluate(2.0, 0.0, 0.0), 1.0);
        assert!(!c.is_rejected("1 / (x - 1)"));
        assert!(c.is_cached("1 / (x - 1)", &v));
    }

    #[test]
    fn fifo_eviction_at_capacity() {
        let mut c = EquationCompiler::new();
        let v = Variables::new();
        for i in 0..=CACHE_CAPACITY {
            c.compile(&format!("x + {}", i), &v).unwrap();
        }
        assert_eq!(c.len(), CACHE_CAPACITY);
        assert!(!c.is_cached("x + 0", &v));
        assert!(c.is_cached("x + 1", &v));
        assert!(c.is_cached(&format!("x + {}", CACHE_CAPACITY), &v));
    }

    #[test]
    fn cache_hits_do_not_refresh_entries() {
        let mut c = EquationCompiler::with_capacity(2);
        let v = Variables::new();
        c.compile("x + 0", &v).unwrap();
        c.compile("x + 1", &v).unwrap();
        // touching the oldest must not save it from eviction
        c.compile("x + 0", &v).unwrap();
        c.compile("x + 2", &v).unwrap();
        assert!(!c.is_cached("x + 0", &v));
        assert!(c.is_cached("x + 1", &v));
        assert!(c.is_cached("x + 2", &v));
    }

    #[test]
    fn reserved_bindings_are_ignored() {
        let mut c = EquationCompiler::new();
        let eq = c
            .compile("PI + x", &vars(&[("PI", 3.0), ("x", 100.0)]))
            .unwrap();
        assert!((eq.evaluate(1.0, 0.0, 0.0) - (std::f64::consts::PI + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn reset_clears_everything() {
        let mut c = EquationCompiler::new();
        let v = Variables::new();
        c.compile("x", &v).unwrap();
        let _ = c.compile("for", &v);
        c.reset();
        assert!(c.is_empty());
        assert_eq!(c.rejected_count(), 0);
        assert_eq!(c.compile_attempts(), 0);
    }

    #[test]
    fn clamp_bounds_output() {
        assert_eq!(clamp_output(1e9), OUTPUT_CLAMP);
        assert_eq!(clamp_output(-1e9), -OUTPUT_CLAMP);
        assert_eq!(clamp_output(42.0), 42.0);
    }

    #[test]
    fn every_template_compiles() {
        let v = vars(&[
            ("A", 2.0),
            ("f", 0.8),
            ("s", 1.2),
            ("phi", 1.618033988749),
            ("pi", std::f64::consts::PI),
            ("c1", -0.7),
            ("c2", 0.27),
            ("sigma", 2.0),
            ("w", 5.0),
            ("a0", 0.1),
            ("a1", 0.2),
            ("a2", 0.3),
            ("a3", 0.01),
            ("n", 1.0),
            ("L", 4.0),
            ("k", 1.0),
            ("v", 1.0),
            ("rho", 28.0),
        ]);
        let mut c = EquationCompiler::new();
        for (name, text) in EQUATION_TEMPLATES {
            let eq = c
                .compile(text, &v)
                .unwrap_or_else(|e| panic!("template {} failed: {}", name, e));
            assert!(eq.evaluate(1.5, -0.5, 2.0).is_finite(), "template {}", name);
        }
        assert_eq!(c.len(), EQUATION_TEMPLATES.len());
    }
}
