// eval/compiled.rs - Name-resolved equation programs
//
// At compile time every identifier in the parsed tree is resolved exactly
// once: coordinates become fixed node kinds, PI/E become constants, calls
// become `Builtin` tags with checked arity, and user variables become small
// integer slots into a value array. The per-vertex interpreter therefore
// performs no string hashing and no map lookups.

use crate::error::CompileError;
use crate::eval::expr::{Ast, BinOp};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Constant names recognised in variable position.
pub const CONSTANT_NAMES: &[&str] = &["PI", "E"];

/// Coordinate names bound per evaluation.
pub const COORDINATE_NAMES: &[&str] = &["x", "z", "t"];

// ── Built-in functions ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Atan,
    Atan2,
    Exp,
    Log,
    Sqrt,
    Abs,
    Pow,
    Sinh,
    Cosh,
    Tanh,
    Min,
    Max,
    Log10,
    Log2,
    Floor,
    Ceil,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == k,
            Arity::AtLeast(k) => n >= k,
        }
    }

    fn expected(self) -> usize {
        match self {
            Arity::Exact(k) | Arity::AtLeast(k) => k,
        }
    }
}

/// Every built-in, in table order.
pub const BUILTINS: &[Builtin] = &[
    Builtin::Sin,
    Builtin::Cos,
    Builtin::Tan,
    Builtin::Atan,
    Builtin::Atan2,
    Builtin::Exp,
    Builtin::Log,
    Builtin::Sqrt,
    Builtin::Abs,
    Builtin::Pow,
    Builtin::Sinh,
    Builtin::Cosh,
    Builtin::Tanh,
    Builtin::Min,
    Builtin::Max,
    Builtin::Log10,
    Builtin::Log2,
    Builtin::Floor,
    Builtin::Ceil,
    Builtin::Round,
];

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        match name {
            "sin" => Some(Builtin::Sin),
            "cos" => Some(Builtin::Cos),
            "tan" => Some(Builtin::Tan),
            "atan" => Some(Builtin::Atan),
            "atan2" => Some(Builtin::Atan2),
            "exp" => Some(Builtin::Exp),
            "log" => Some(Builtin::Log),
            "sqrt" => Some(Builtin::Sqrt),
            "abs" => Some(Builtin::Abs),
            "pow" => Some(Builtin::Pow),
            "sinh" => Some(Builtin::Sinh),
            "cosh" => Some(Builtin::Cosh),
            "tanh" => Some(Builtin::Tanh),
            "min" => Some(Builtin::Min),
            "max" => Some(Builtin::Max),
            "log10" => Some(Builtin::Log10),
            "log2" => Some(Builtin::Log2),
            "floor" => Some(Builtin::Floor),
            "ceil" => Some(Builtin::Ceil),
            "round" => Some(Builtin::Round),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Tan => "tan",
            Builtin::Atan => "atan",
            Builtin::Atan2 => "atan2",
            Builtin::Exp => "exp",
            Builtin::Log => "log",
            Builtin::Sqrt => "sqrt",
            Builtin::Abs => "abs",
            Builtin::Pow => "pow",
            Builtin::Sinh => "sinh",
            Builtin::Cosh => "cosh",
            Builtin::Tanh => "tanh",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Log10 => "log10",
            Builtin::Log2 => "log2",
            Builtin::Floor => "floor",
            Builtin::Ceil => "ceil",
            Builtin::Round => "round",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Builtin::Atan2 | Builtin::Pow => Arity::Exact(2),
            Builtin::Min | Builtin::Max => Arity::AtLeast(1),
            _ => Arity::Exact(1),
        }
    }

    #[inline(always)]
    fn apply1(self, a: f64) -> f64 {
        match self {
            Builtin::Sin => a.sin(),
            Builtin::Cos => a.cos(),
            Builtin::Tan => a.tan(),
            Builtin::Atan => a.atan(),
            Builtin::Exp => a.exp(),
            Builtin::Log => a.ln(),
            Builtin::Sqrt => a.sqrt(),
            Builtin::Abs => a.abs(),
            Builtin::Sinh => a.sinh(),
            Builtin::Cosh => a.cosh(),
            Builtin::Tanh => a.tanh(),
            Builtin::Log10 => a.log10(),
            Builtin::Log2 => a.log2(),
            Builtin::Floor => a.floor(),
            Builtin::Ceil => a.ceil(),
            // Half-way cases round toward +inf, like the editor's palette.
            Builtin::Round => (a + 0.5).floor(),
            Builtin::Min | Builtin::Max => a,
            Builtin::Atan2 | Builtin::Pow => f64::NAN,
        }
    }

    #[inline(always)]
    fn apply2(self, a: f64, b: f64) -> f64 {
        match self {
            Builtin::Atan2 => a.atan2(b),
            Builtin::Pow => a.powf(b),
            Builtin::Min => a.min(b),
            Builtin::Max => a.max(b),
            _ => f64::NAN,
        }
    }
}

/// True if `name` is taken by a built-in function or constant.
pub fn is_reserved(name: &str) -> bool {
    Builtin::from_name(name).is_some() || CONSTANT_NAMES.contains(&name)
}

// ── Resolved program ───────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Node {
    Const(f64),
    X,
    Z,
    T,
    Slot(u16),
    Neg(Box<Node>),
    Binary(BinOp, Box<Node>, Box<Node>),
    Call1(Builtin, Box<Node>),
    Call2(Builtin, Box<Node>, Box<Node>),
    /// Variadic min/max folded left to right.
    Fold(Builtin, Box<[Node]>),
    Select(Box<Node>, Box<Node>, Box<Node>),
}

/// An equation with every name resolved. Slot values are supplied at
/// evaluation time in `slot_names()` order.
#[derive(Debug, Clone)]
pub struct Program {
    root: Node,
    slot_names: SmallVec<[String; 8]>,
}

impl Program {
    /// Resolve a parsed tree against the user variable names in `variables`.
    ///
    /// Variables that collide with a reserved name or a coordinate are
    /// never bound; the caller filters them out beforehand.
    pub fn resolve(ast: &Ast, variables: &BTreeMap<String, f64>) -> Result<Self, CompileError> {
        let mut slot_names: SmallVec<[String; 8]> = SmallVec::new();
        let root = resolve_node(ast, variables, &mut slot_names)?;
        Ok(Self { root, slot_names })
    }

    /// Names of the user variables this program reads, by slot index.
    pub fn slot_names(&self) -> &[String] {
        &self.slot_names
    }

    /// Interpret the program. May return NaN or infinity; callers apply
    /// their own finite check.
    #[inline]
    pub fn eval(&self, x: f64, z: f64, t: f64, slots: &[f64]) -> f64 {
        eval_node(&self.root, x, z, t, slots)
    }
}

fn resolve_node(
    ast: &Ast,
    variables: &BTreeMap<String, f64>,
    slots: &mut SmallVec<[String; 8]>,
) -> Result<Node, CompileError> {
    match ast {
        Ast::Number(n) => Ok(Node::Const(*n)),
        Ast::Variable(name) => match name.as_str() {
            "x" => Ok(Node::X),
            "z" => Ok(Node::Z),
            "t" => Ok(Node::T),
            "PI" => Ok(Node::Const(std::f64::consts::PI)),
            "E" => Ok(Node::Const(std::f64::consts::E)),
            other if variables.contains_key(other) => {
                let idx = match slots.iter().position(|s| s == other) {
                    Some(i) => i,
                    None => {
                        slots.push(other.to_string());
                        slots.len() - 1
                    }
                };
                Ok(Node::Slot(idx as u16))
            }
            other => Err(CompileError::UnknownIdentifier(other.to_string())),
        },
        Ast::Neg(inner) => Ok(Node::Neg(Box::new(resolve_node(inner, variables, slots)?))),
        Ast::BinaryOp(op, l, r) => Ok(Node::Binary(
            *op,
            Box::new(resolve_node(l, variables, slots)?),
            Box::new(resolve_node(r, variables, slots)?),
        )),
        Ast::Call(name, args) => {
            let func = Builtin::from_name(name)
                .ok_or_else(|| CompileError::UnknownFunction(name.clone()))?;
            let arity = func.arity();
            if !arity.accepts(args.len()) {
                return Err(CompileError::WrongArgCount {
                    func: name.clone(),
                    expected: arity.expected(),
                    got: args.len(),
                });
            }
            let mut resolved = args
                .iter()
                .map(|a| resolve_node(a, variables, slots))
                .collect::<Result<Vec<_>, _>>()?;
            match (arity, resolved.len()) {
                (Arity::Exact(1), _) | (Arity::AtLeast(_), 1) => {
                    Ok(Node::Call1(func, Box::new(resolved.remove(0))))
                }
                (Arity::Exact(2), _) | (Arity::AtLeast(_), 2) => {
                    let b = resolved.remove(1);
                    let a = resolved.remove(0);
                    Ok(Node::Call2(func, Box::new(a), Box::new(b)))
                }
                _ => Ok(Node::Fold(func, resolved.into_boxed_slice())),
            }
        }
        Ast::Conditional(c, a, b) => Ok(Node::Select(
            Box::new(resolve_node(c, variables, slots)?),
            Box::new(resolve_node(a, variables, slots)?),
            Box::new(resolve_node(b, variables, slots)?),
        )),
    }
}

fn eval_node(node: &Node, x: f64, z: f64, t: f64, slots: &[f64]) -> f64 {
    match node {
        Node::Const(v) => *v,
        Node::X => x,
        Node::Z => z,
        Node::T => t,
        Node::Slot(i) => slots.get(*i as usize).copied().unwrap_or(0.0),
        Node::Neg(inner) => -eval_node(inner, x, z, t, slots),
        Node::Binary(op, l, r) => {
            op.apply(eval_node(l, x, z, t, slots), eval_node(r, x, z, t, slots))
        }
        Node::Call1(f, a) => f.apply1(eval_node(a, x, z, t, slots)),
        Node::Call2(f, a, b) => {
            f.apply2(eval_node(a, x, z, t, slots), eval_node(b, x, z, t, slots))
        }
        Node::Fold(f, args) => {
            let mut iter = args.iter().map(|a| eval_node(a, x, z, t, slots));
            let first = iter.next().unwrap_or(f64::NAN);
            iter.fold(first, |acc, v| f.apply2(acc, v))
        }
        Node::Select(c, a, b) => {
            if eval_node(c, x, z, t, slots) != 0.0 {
                eval_node(a, x, z, t, slots)
            } else {
                eval_node(b, x, z, t, slots)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::expr::parse;

    fn run(src: &str, vars: &[(&str, f64)], x: f64, z: f64, t: f64) -> f64 {
        let map: BTreeMap<String, f64> = vars.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        let program = Program::resolve(&parse(src).unwrap(), &map).unwrap();
        let slots: Vec<f64> = program.slot_names().iter().map(|n| map[n]).collect();
        program.eval(x, z, t, &slots)
    }

    fn resolve_err(src: &str) -> CompileError {
        Program::resolve(&parse(src).unwrap(), &BTreeMap::new()).unwrap_err()
    }

    #[test]
    fn arithmetic_and_coordinates() {
        assert_eq!(run("2 + 3 * 4", &[], 0.0, 0.0, 0.0), 14.0);
        assert_eq!(run("x - z * t", &[], 10.0, 2.0, 3.0), 4.0);
        assert_eq!(run("2 ^ 3 ^ 2", &[], 0.0, 0.0, 0.0), 512.0);
        assert_eq!(run("-2 ^ 2", &[], 0.0, 0.0, 0.0), -4.0);
    }

    #[test]
    fn constants() {
        assert!((run("PI", &[], 0.0, 0.0, 0.0) - std::f64::consts::PI).abs() < 1e-12);
        assert!((run("E", &[], 0.0, 0.0, 0.0) - std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn user_variables_get_slots() {
        let map: BTreeMap<String, f64> =
            [("A".to_string(), 2.0), ("k".to_string(), 5.0)].into_iter().collect();
        let program = Program::resolve(&parse("A * x + A + k").unwrap(), &map).unwrap();
        assert_eq!(program.slot_names(), &["A".to_string(), "k".to_string()]);
        assert_eq!(program.eval(1.0, 0.0, 0.0, &[2.0, 5.0]), 9.0);
    }

    #[test]
    fn builtin_functions() {
        assert!(run("sin(0)", &[], 0.0, 0.0, 0.0).abs() < 1e-12);
        assert_eq!(run("sqrt(16)", &[], 0.0, 0.0, 0.0), 4.0);
        assert_eq!(run("pow(2, 10)", &[], 0.0, 0.0, 0.0), 1024.0);
        assert_eq!(run("min(3, 7)", &[], 0.0, 0.0, 0.0), 3.0);
        assert_eq!(run("max(3, 7, 11, 2)", &[], 0.0, 0.0, 0.0), 11.0);
        assert_eq!(run("max(5)", &[], 0.0, 0.0, 0.0), 5.0);
        assert_eq!(run("log10(1000)", &[], 0.0, 0.0, 0.0), 3.0);
        assert_eq!(run("round(2.5)", &[], 0.0, 0.0, 0.0), 3.0);
        assert_eq!(run("round(-2.5)", &[], 0.0, 0.0, 0.0), -2.0);
        assert!((run("atan2(1, 1)", &[], 0.0, 0.0, 0.0) - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn conditional_selects_branch() {
        let vars = [("L", 2.0)];
        assert_eq!(run("abs(x) < L/2 ? 1 : 0", &vars, 0.5, 0.0, 0.0), 1.0);
        assert_eq!(run("abs(x) < L/2 ? 1 : 0", &vars, 1.5, 0.0, 0.0), 0.0);
    }

    #[test]
    fn unknown_names_are_compile_errors() {
        assert_eq!(
            resolve_err("foo + 1"),
            CompileError::UnknownIdentifier("foo".into())
        );
        assert_eq!(
            resolve_err("window(1)"),
            CompileError::UnknownFunction("window".into())
        );
        // a function name used as a value
        assert_eq!(resolve_err("sin"), CompileError::UnknownIdentifier("sin".into()));
    }

    #[test]
    fn arity_is_checked() {
        assert_eq!(
            resolve_err("sin(1, 2)"),
            CompileError::WrongArgCount {
                func: "sin".into(),
                expected: 1,
                got: 2
            }
        );
        assert!(matches!(resolve_err("atan2(1)"), CompileError::WrongArgCount { .. }));
        assert!(matches!(resolve_err("min()"), CompileError::WrongArgCount { .. }));
    }

    #[test]
    fn reserved_names() {
        for b in BUILTINS {
            assert!(is_reserved(b.name()));
            assert_eq!(Builtin::from_name(b.name()), Some(*b));
        }
        assert!(is_reserved("PI"));
        assert!(is_reserved("E"));
        assert!(!is_reserved("pi"));
        assert!(!is_reserved("A"));
    }
}
