use crate::engine::ast::Expr;
use crate::engine::env::Environment;
use crate::engine::special_forms as special_form_constants;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, error, instrument, trace};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LispError {
    #[error("Undefined symbol: {0}")]
    UndefinedSymbol(String),
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),
    #[error("Arity error: '{form}' expects {expected} argument(s), got {actual}")]
    ArityError {
        form: String,
        expected: usize,
        actual: usize,
    },
    #[error("Type error in '{operator}': expected {expected}, found {found}")]
    ValueTypeError {
        operator: String,
        expected: String,
        found: String,
    },
    #[error("Cannot define '{0}' in a frozen environment")]
    ReadOnlyEnvironment(String),
    #[error("Evaluation exceeded the maximum recursion depth of {0}")]
    RecursionLimit(usize),
}

/// Upper bound on nested `eval` entries. Runaway recursion surfaces as
/// `LispError::RecursionLimit` instead of exhausting the native stack.
pub const MAX_RECURSION_DEPTH: usize = 256;

thread_local! {
    static EVAL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Result<DepthGuard, LispError> {
        EVAL_DEPTH.with(|depth| {
            let current = depth.get();
            if current >= MAX_RECURSION_DEPTH {
                error!(depth = current, "Recursion limit reached");
                return Err(LispError::RecursionLimit(MAX_RECURSION_DEPTH));
            }
            depth.set(current + 1);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        EVAL_DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

#[instrument(skip(expr, env), fields(expr = ?expr), ret, err)]
pub fn eval(expr: &Expr, env: Rc<RefCell<Environment>>) -> Result<Expr, LispError> {
    let _depth = DepthGuard::enter()?;
    trace!("Starting evaluation");
    match expr {
        Expr::Function(_)
        | Expr::NativeFunction(_)
        | Expr::Number(_)
        | Expr::Bool(_)
        | Expr::Nil => {
            debug!("Expression is self-evaluating: {:?}", expr);
            Ok(expr.clone())
        }
        Expr::Symbol(s) => {
            debug!(env = ?env.borrow(), symbol_name = %s, "Evaluating Symbol");
            env.borrow().get(s).ok_or_else(|| {
                error!(symbol_name = %s, "Undefined symbol encountered");
                LispError::UndefinedSymbol(s.clone())
            })
        }
        Expr::List(list) => {
            debug!("Evaluating List: {:?}", list);
            let Some(first_form) = list.first() else {
                error!("Empty list has no operator position");
                return Err(LispError::MalformedExpression(
                    "empty list: expected an operator in the first position".to_string(),
                ));
            };

            match first_form {
                Expr::Symbol(s) if s == special_form_constants::DEFINE => {
                    crate::engine::builtins::special_forms::eval_define(&list[1..], Rc::clone(&env))
                }
                Expr::Symbol(s) if s == special_form_constants::IF => {
                    crate::engine::builtins::special_forms::eval_if(&list[1..], Rc::clone(&env))
                }
                Expr::Symbol(s) if s == special_form_constants::LAMBDA => {
                    crate::engine::builtins::special_forms::eval_lambda(&list[1..], Rc::clone(&env))
                }
                _ => {
                    trace!("First element is not a special form, evaluating as application");

                    // Operator first, then operands strictly left to right.
                    // The first failure aborts; later operands are never
                    // evaluated.
                    let procedure = eval(first_form, Rc::clone(&env))?;
                    let mut evaluated_args = Vec::with_capacity(list.len() - 1);
                    for arg_expr in &list[1..] {
                        evaluated_args.push(eval(arg_expr, Rc::clone(&env))?);
                    }
                    apply(procedure, evaluated_args)
                }
            }
        }
    }
}

/// Applies a procedure value (closure or native) to already-evaluated arguments.
#[instrument(skip(procedure, args), fields(procedure = ?procedure, args = ?args), ret, err)]
pub(crate) fn apply(procedure: Expr, args: Vec<Expr>) -> Result<Expr, LispError> {
    match procedure {
        Expr::Function(lisp_fn) => {
            debug!(function = ?lisp_fn, "Applying closure");

            if args.len() != lisp_fn.params.len() {
                error!(
                    expected = lisp_fn.params.len(),
                    got = args.len(),
                    "Arity mismatch for closure call"
                );
                return Err(LispError::ArityError {
                    form: format!("lambda ({})", lisp_fn.params.join(" ")),
                    expected: lisp_fn.params.len(),
                    actual: args.len(),
                });
            }

            // The call frame is chained to the captured environment, not the
            // calling one.
            let call_env = Environment::from_bindings(
                lisp_fn.params.iter().cloned().zip(args),
                Some(Rc::clone(&lisp_fn.closure)),
            );
            trace!(?call_env, "Created call environment");

            debug!(body = ?lisp_fn.body, "Evaluating closure body");
            eval(&lisp_fn.body, call_env)
        }
        Expr::NativeFunction(native_fn) => {
            debug!(native_function_name = %native_fn.name, "Applying native function");
            trace!(args = ?args, "Calling native function with evaluated arguments");
            (native_fn.func)(args)
        }
        other => {
            error!(evaluated_to = ?other, "Attempted to apply a non-procedure value");
            Err(LispError::MalformedExpression(format!(
                "cannot apply non-procedure value: {:?}",
                other
            )))
        }
    }
}
