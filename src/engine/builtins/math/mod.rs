use crate::engine::ast::{Expr, Number};
use crate::engine::eval::LispError;
use tracing::{error, trace};

// Helper function, not public
fn extract_number(expr: &Expr, op_name: &str) -> Result<Number, LispError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        _ => {
            let type_error = LispError::ValueTypeError {
                operator: op_name.to_string(),
                expected: "Number".to_string(),
                found: format!("{:?}", expr),
            };
            error!(operator = %op_name, error = %type_error, "Type error in native function");
            Err(type_error)
        }
    }
}

// Every numeric primitive takes exactly two operands.
fn binary_numbers(op_name: &str, args: &[Expr]) -> Result<(Number, Number), LispError> {
    if args.len() != 2 {
        let arity_error = LispError::ArityError {
            form: op_name.to_string(),
            expected: 2,
            actual: args.len(),
        };
        error!(error = %arity_error, "Arity error in native '{}'", op_name);
        return Err(arity_error);
    }
    Ok((
        extract_number(&args[0], op_name)?,
        extract_number(&args[1], op_name)?,
    ))
}

// Integer arithmetic stays exact until it would overflow i64, then widens to
// float instead of wrapping or panicking.
fn add_numbers(lhs: Number, rhs: Number) -> Number {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => a
            .checked_add(b)
            .map(Number::Int)
            .unwrap_or(Number::Float(a as f64 + b as f64)),
        _ => Number::Float(lhs.as_f64() + rhs.as_f64()),
    }
}

fn subtract_numbers(lhs: Number, rhs: Number) -> Number {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => a
            .checked_sub(b)
            .map(Number::Int)
            .unwrap_or(Number::Float(a as f64 - b as f64)),
        _ => Number::Float(lhs.as_f64() - rhs.as_f64()),
    }
}

fn multiply_numbers(lhs: Number, rhs: Number) -> Number {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => a
            .checked_mul(b)
            .map(Number::Int)
            .unwrap_or(Number::Float(a as f64 * b as f64)),
        _ => Number::Float(lhs.as_f64() * rhs.as_f64()),
    }
}

// Division always widens, so (/ 7 2) is 3.5. A zero divisor is rejected
// before the division happens; there is no IEEE infinity escape hatch.
fn divide_numbers(lhs: Number, rhs: Number) -> Option<Number> {
    if rhs.is_zero() {
        return None;
    }
    Some(Number::Float(lhs.as_f64() / rhs.as_f64()))
}

// Int/Int comparisons stay in i64 so large integers do not lose precision
// in a float round-trip; mixed operands widen.
fn numbers_equal(lhs: Number, rhs: Number) -> bool {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => a == b,
        _ => lhs.as_f64() == rhs.as_f64(),
    }
}

fn numbers_less(lhs: Number, rhs: Number) -> bool {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => a < b,
        _ => lhs.as_f64() < rhs.as_f64(),
    }
}

fn numbers_greater(lhs: Number, rhs: Number) -> bool {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => a > b,
        _ => lhs.as_f64() > rhs.as_f64(),
    }
}

#[tracing::instrument(skip(args), ret, err)]
pub fn native_add(args: Vec<Expr>) -> Result<Expr, LispError> {
    trace!("Executing native '+' function");
    let (lhs, rhs) = binary_numbers("+", &args)?;
    Ok(Expr::Number(add_numbers(lhs, rhs)))
}

#[tracing::instrument(skip(args), ret, err)]
pub fn native_subtract(args: Vec<Expr>) -> Result<Expr, LispError> {
    trace!("Executing native '-' function");
    let (lhs, rhs) = binary_numbers("-", &args)?;
    Ok(Expr::Number(subtract_numbers(lhs, rhs)))
}

#[tracing::instrument(skip(args), ret, err)]
pub fn native_multiply(args: Vec<Expr>) -> Result<Expr, LispError> {
    trace!("Executing native '*' function");
    let (lhs, rhs) = binary_numbers("*", &args)?;
    Ok(Expr::Number(multiply_numbers(lhs, rhs)))
}

#[tracing::instrument(skip(args), ret, err)]
pub fn native_divide(args: Vec<Expr>) -> Result<Expr, LispError> {
    trace!("Executing native '/' function");
    let (lhs, rhs) = binary_numbers("/", &args)?;
    divide_numbers(lhs, rhs).map(Expr::Number).ok_or_else(|| {
        let div_zero_error = LispError::ValueTypeError {
            operator: "/".to_string(),
            expected: "non-zero divisor".to_string(),
            found: format!("{:?}", args[1]),
        };
        error!(error = %div_zero_error, "Division by zero in native '/'");
        div_zero_error
    })
}

// Helper macro to generate comparison functions
macro_rules! define_comparison_fn {
    ($fn_name:ident, $op_str:expr, $compare:ident) => {
        #[tracing::instrument(skip(args), ret, err)]
        pub fn $fn_name(args: Vec<Expr>) -> Result<Expr, LispError> {
            trace!("Executing native '{}' function", $op_str);
            let (lhs, rhs) = binary_numbers($op_str, &args)?;
            Ok(Expr::Bool($compare(lhs, rhs)))
        }
    };
}

define_comparison_fn!(native_equals, "=", numbers_equal);
define_comparison_fn!(native_less_than, "<", numbers_less);
define_comparison_fn!(native_greater_than, ">", numbers_greater);
