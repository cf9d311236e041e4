use crate::engine::ast::Expr;
use crate::engine::env::Environment;
use crate::engine::eval::{LispError, eval as main_eval};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error, instrument, trace};

/// Truthiness policy: `Bool(false)` is the only falsy value. Everything
/// else, including zero and `Nil`, is truthy.
pub fn is_truthy(value: &Expr) -> bool {
    !matches!(value, Expr::Bool(false))
}

#[instrument(skip(args, env), fields(args = ?args), ret, err)]
pub fn eval_if(args: &[Expr], env: Rc<RefCell<Environment>>) -> Result<Expr, LispError> {
    trace!("Executing 'if' special form");
    if args.len() != 3 {
        error!(
            "'if' special form requires 3 arguments (condition, then-branch, else-branch), found {}",
            args.len()
        );
        return Err(LispError::ArityError {
            form: "if".to_string(),
            expected: 3,
            actual: args.len(),
        });
    }

    let condition_expr = &args[0];
    let then_expr = &args[1];
    let else_expr = &args[2];

    // The condition is evaluated exactly once, then exactly one branch.
    let condition_result = main_eval(condition_expr, Rc::clone(&env))?;
    debug!(?condition_result, "Evaluated 'if' condition");

    if is_truthy(&condition_result) {
        trace!("Condition is truthy, evaluating then-branch");
        main_eval(then_expr, env)
    } else {
        trace!("Condition is false, evaluating else-branch");
        main_eval(else_expr, env)
    }
}
