//! A tree-walking evaluator for a small Lisp dialect. Programs arrive as
//! already-built [`Expr`] trees; there is no text syntax and no parser.
//!
//! ```
//! use rscheme::{Expr, evaluate};
//!
//! let program = Expr::list([Expr::symbol("+"), Expr::int(1), Expr::int(2)]);
//! assert_eq!(evaluate(&program), Ok(Expr::int(3)));
//! ```

pub mod engine;
pub mod logging;

pub use engine::ast::{Expr, LispFunction, NativeFn, NativeFunction, Number};
pub use engine::env::Environment;
pub use engine::eval::{LispError, MAX_RECURSION_DEPTH, eval};

use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::instrument;

thread_local! {
    static DEFAULT_ENV: OnceCell<Rc<RefCell<Environment>>> = OnceCell::new();
}

/// Returns this thread's default environment, creating it with the full
/// prelude on first use. Values are `Rc`-based and single-threaded, so each
/// thread gets its own instance.
pub fn default_environment() -> Rc<RefCell<Environment>> {
    DEFAULT_ENV.with(|cell| Rc::clone(cell.get_or_init(Environment::with_prelude)))
}

/// Evaluates an expression in this thread's default environment. Definitions
/// persist between calls.
pub fn evaluate(expr: &Expr) -> Result<Expr, LispError> {
    eval(expr, default_environment())
}

/// Installs a host-provided procedure under `name`, replacing any existing
/// binding. Only procedure values can be registered, and frozen environments
/// refuse the installation.
#[instrument(skip(procedure, env), ret, err)]
pub fn register(
    name: &str,
    procedure: Expr,
    env: &Rc<RefCell<Environment>>,
) -> Result<(), LispError> {
    match procedure {
        Expr::Function(_) | Expr::NativeFunction(_) => {}
        other => {
            return Err(LispError::ValueTypeError {
                operator: "register".to_string(),
                expected: "procedure".to_string(),
                found: format!("{:?}", other),
            });
        }
    }
    if env.borrow().is_frozen() {
        return Err(LispError::ReadOnlyEnvironment(name.to_string()));
    }
    env.borrow_mut().define(name.to_string(), procedure);
    Ok(())
}
