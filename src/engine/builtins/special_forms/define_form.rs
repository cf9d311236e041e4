use crate::engine::ast::Expr;
use crate::engine::env::Environment;
use crate::engine::eval::{LispError, eval as main_eval};
use crate::engine::special_forms as special_form_constants;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error, instrument, trace};

#[instrument(skip(args, env), fields(args = ?args), ret, err)]
pub fn eval_define(args: &[Expr], env: Rc<RefCell<Environment>>) -> Result<Expr, LispError> {
    trace!("Executing 'define' special form");
    if args.len() != 2 {
        error!(
            "'define' special form requires 2 arguments (symbol and value), found {}",
            args.len()
        );
        return Err(LispError::ArityError {
            form: "define".to_string(),
            expected: 2,
            actual: args.len(),
        });
    }

    let name = match &args[0] {
        Expr::Symbol(s) => s.clone(),
        other => {
            error!(
                "First argument to 'define' must be a symbol, found {:?}",
                other
            );
            return Err(LispError::MalformedExpression(format!(
                "'define' expects a symbol to bind, got {:?}",
                other
            )));
        }
    };

    if special_form_constants::is_special_form(&name) {
        error!(attempted_keyword = %name, "Attempted to redefine a special form");
        return Err(LispError::MalformedExpression(format!(
            "cannot redefine the special form '{}'",
            name
        )));
    }

    // Checked before the value expression runs, so a rejected define has no
    // side effects.
    if env.borrow().is_frozen() {
        error!(symbol = %name, "Attempted to define into a frozen environment");
        return Err(LispError::ReadOnlyEnvironment(name));
    }

    let value = main_eval(&args[1], Rc::clone(&env))?;
    debug!(symbol = %name, value = ?value, "'define' binding value in current environment");
    env.borrow_mut().define(name, value);

    // `define` is a definition, not an expression with a useful value.
    Ok(Expr::Nil)
}
