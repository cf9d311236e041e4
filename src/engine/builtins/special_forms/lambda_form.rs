use crate::engine::ast::{Expr, LispFunction};
use crate::engine::env::Environment;
use crate::engine::eval::LispError;
use crate::engine::special_forms as special_form_constants;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error, instrument, trace};

#[instrument(skip(args, env), fields(args = ?args), ret, err)]
pub fn eval_lambda(args: &[Expr], env: Rc<RefCell<Environment>>) -> Result<Expr, LispError> {
    trace!("Executing 'lambda' special form");
    if args.len() != 2 {
        error!(
            "'lambda' special form requires 2 arguments (parameter list and body), found {}",
            args.len()
        );
        return Err(LispError::ArityError {
            form: "lambda".to_string(),
            expected: 2,
            actual: args.len(),
        });
    }

    let params_expr = &args[0];
    let body_expr = args[1].clone();

    let params_list = match params_expr {
        Expr::List(list) => list,
        _ => {
            error!(
                "First argument to 'lambda' must be a list of parameters, found {:?}",
                params_expr
            );
            return Err(LispError::MalformedExpression(format!(
                "'lambda' expects a parameter list, got {:?}",
                params_expr
            )));
        }
    };

    let mut param_names: Vec<String> = Vec::with_capacity(params_list.len());
    for param in params_list {
        match param {
            Expr::Symbol(name) => {
                if special_form_constants::is_special_form(name) {
                    error!(attempted_keyword = %name, "Attempted to use a reserved keyword as a parameter");
                    return Err(LispError::MalformedExpression(format!(
                        "'lambda' parameter cannot be the reserved keyword '{}'",
                        name
                    )));
                }
                if param_names.contains(name) {
                    error!(parameter = %name, "Duplicate parameter name in 'lambda'");
                    return Err(LispError::MalformedExpression(format!(
                        "'lambda' parameter '{}' appears more than once",
                        name
                    )));
                }
                param_names.push(name.clone());
            }
            _ => {
                error!("Parameters in 'lambda' must be symbols, found {:?}", param);
                return Err(LispError::MalformedExpression(format!(
                    "'lambda' parameters must be symbols, got {:?}",
                    param
                )));
            }
        }
    }

    debug!(parameters = ?param_names, body = ?body_expr, "'lambda' creating closure");
    let lisp_fn = LispFunction {
        params: param_names,
        body: Box::new(body_expr),
        // Captured by reference: definitions added to `env` after this point
        // are visible when the closure is called.
        closure: Rc::clone(&env),
    };

    Ok(Expr::Function(lisp_fn))
}
