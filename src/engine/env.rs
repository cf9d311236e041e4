use crate::engine::ast::{Expr, NativeFunction};
use crate::engine::builtins::{math, memo};
use crate::engine::eval::LispError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Debug, PartialEq)]
pub struct Environment {
    bindings: HashMap<String, Expr>,
    outer: Option<Rc<RefCell<Environment>>>,
    frozen: bool,
}

impl Environment {
    /// Creates a new, empty root environment without any prelude bindings.
    pub fn new() -> Rc<RefCell<Self>> {
        debug!("Creating new empty root environment");
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            outer: None,
            frozen: false,
        }))
    }

    /// Creates a new root environment seeded with the primitive set.
    pub fn with_prelude() -> Rc<RefCell<Self>> {
        debug!("Creating new root environment with prelude");

        // Each tuple is (bound name, Rust function). Plain function items
        // here; they are wrapped into `NativeFunction` values below.
        const PRELUDE_NATIVE_FUNCTIONS: &[(&str, fn(Vec<Expr>) -> Result<Expr, LispError>)] = &[
            ("+", math::native_add),
            ("-", math::native_subtract),
            ("*", math::native_multiply),
            ("/", math::native_divide),
            ("=", math::native_equals),
            ("<", math::native_less_than),
            (">", math::native_greater_than),
            ("memoize", memo::native_memoize),
        ];

        let env = Environment::new();
        {
            let mut root = env.borrow_mut();
            for (name, func) in PRELUDE_NATIVE_FUNCTIONS {
                root.define(
                    name.to_string(),
                    Expr::NativeFunction(NativeFunction::new(*name, *func)),
                );
            }
        }
        trace!(env = ?env.borrow(), "Environment after adding prelude");
        env
    }

    /// Creates a new environment that is enclosed by an outer environment.
    pub fn new_enclosed(outer_env: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        debug!("Creating new enclosed environment");
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            outer: Some(outer_env),
            frozen: false,
        }))
    }

    /// Creates an environment from an initial binding set, optionally
    /// enclosed by an outer environment. Procedure application uses this to
    /// bind parameters in one step.
    pub fn from_bindings(
        bindings: impl IntoIterator<Item = (String, Expr)>,
        outer: Option<Rc<RefCell<Environment>>>,
    ) -> Rc<RefCell<Self>> {
        debug!("Creating environment from initial bindings");
        Rc::new(RefCell::new(Environment {
            bindings: bindings.into_iter().collect(),
            outer,
            frozen: false,
        }))
    }

    /// Defines a new variable or redefines an existing one in the current
    /// environment. Outer environments are never touched.
    pub fn define(&mut self, name: String, value: Expr) {
        trace!(name = %name, value = ?value, "Defining variable in current environment");
        self.bindings.insert(name, value);
    }

    /// Attempts to retrieve a variable's value from the environment.
    /// If not found in the current environment, it searches in outer environments.
    pub fn get(&self, name: &str) -> Option<Expr> {
        trace!(name = %name, "Attempting to get variable from environment");
        if let Some(value) = self.bindings.get(name) {
            debug!(name = %name, value = ?value, "Found variable in current environment");
            Some(value.clone())
        } else {
            match &self.outer {
                Some(outer_env) => {
                    trace!(name = %name, "Variable not in current environment, checking outer environment");
                    outer_env.borrow().get(name)
                }
                None => {
                    debug!(name = %name, "Variable not found in any environment");
                    None
                }
            }
        }
    }

    /// Marks this environment read-only. `define` forms and `register`
    /// refuse to touch a frozen environment; lookup is unaffected, and
    /// child environments stay writable.
    pub fn freeze(&mut self) {
        debug!("Freezing environment");
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
