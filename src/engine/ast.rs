use crate::engine::env::Environment;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Numeric payload of an expression. Integer and floating-point values are
/// kept separate so integer arithmetic stays exact; operations that mix the
/// two widen to `Float`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Widens to `f64` for mixed-representation arithmetic and comparison.
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(value) => value == 0,
            Number::Float(value) => value == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(value) => write!(f, "{}", value),
            // Keep a trailing ".0" so 5 and 5.0 stay distinguishable.
            Number::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{:.1}", value)
            }
            Number::Float(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Clone)]
pub struct LispFunction {
    pub params: Vec<String>,
    pub body: Box<Expr>,
    pub closure: Rc<RefCell<Environment>>,
}

impl fmt::Debug for LispFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LispFunction")
            .field("params", &self.params)
            .field("body", &self.body)
            .field("closure", &"<captured_env>") // Avoid printing the whole env
            .finish()
    }
}

// Functions are equal if their parameters and body are structurally equal.
// The captured environment is not considered for this PartialEq; it can
// contain the function itself, and comparing it would cycle.
impl PartialEq for LispFunction {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params && self.body == other.body
    }
}

/// Type alias for a native Rust callable invokable from evaluated programs.
/// It takes a Vec of already-evaluated Expr arguments and returns a
/// Result<Expr, LispError>. Boxed behind `Rc<dyn Fn>` rather than a plain
/// function pointer so registered natives and wrappers like `memoize` can
/// capture state.
pub type NativeFn = Rc<dyn Fn(Vec<Expr>) -> Result<Expr, crate::engine::eval::LispError>>;

#[derive(Clone)]
pub struct NativeFunction {
    pub name: String, // For debugging and identification
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(Vec<Expr>) -> Result<Expr, crate::engine::eval::LispError> + 'static,
    ) -> Self {
        NativeFunction {
            name: name.into(),
            func: Rc::new(func),
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("func", &"<native_fn>") // Closures have no useful Debug form
            .finish()
    }
}

// NativeFunctions are considered equal if their names are the same.
// This assumes that native function names are unique within the system.
impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Symbol(String),
    Number(Number),
    List(Vec<Expr>),
    Function(LispFunction),
    NativeFunction(NativeFunction),
    Bool(bool),
    /// The no-value sentinel produced by `define`. Distinct from an empty
    /// list, which is not a value at all.
    Nil,
}

impl Expr {
    pub fn int(value: i64) -> Expr {
        Expr::Number(Number::Int(value))
    }

    pub fn float(value: f64) -> Expr {
        Expr::Number(Number::Float(value))
    }

    pub fn symbol(name: impl Into<String>) -> Expr {
        Expr::Symbol(name.into())
    }

    pub fn list(items: impl Into<Vec<Expr>>) -> Expr {
        Expr::List(items.into())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::Number(number) => write!(f, "{}", number),
            Expr::Bool(value) => write!(f, "{}", value),
            Expr::Nil => write!(f, "nil"),
            Expr::List(items) => {
                write!(f, "(")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Expr::Function(function) => write!(f, "#<lambda ({})>", function.params.join(" ")),
            Expr::NativeFunction(native) => write!(f, "#<native {}>", native.name),
        }
    }
}
