use crate::engine::ast::{Expr, NativeFunction, Number};
use crate::engine::eval::{LispError, apply};
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::{error, instrument, trace};

/// Cache key for memoized calls. Only value shapes with well-defined
/// equality can serve as keys; calls carrying anything else run uncached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Int(i64),
    // Floats keyed by bit pattern. Distinct NaN payloads miss the cache,
    // which only costs a recomputation.
    FloatBits(u64),
    Bool(bool),
    Symbol(String),
    Nil,
    List(Vec<CacheKey>),
}

fn cache_key(expr: &Expr) -> Option<CacheKey> {
    match expr {
        Expr::Number(Number::Int(value)) => Some(CacheKey::Int(*value)),
        Expr::Number(Number::Float(value)) => Some(CacheKey::FloatBits(value.to_bits())),
        Expr::Bool(value) => Some(CacheKey::Bool(*value)),
        Expr::Symbol(name) => Some(CacheKey::Symbol(name.clone())),
        Expr::Nil => Some(CacheKey::Nil),
        Expr::List(items) => items
            .iter()
            .map(cache_key)
            .collect::<Option<Vec<_>>>()
            .map(CacheKey::List),
        Expr::Function(_) | Expr::NativeFunction(_) => None,
    }
}

/// Wraps a procedure in a caching layer keyed on the argument tuple. The
/// wrapper is an ordinary procedure value; the evaluator's dispatch knows
/// nothing about it. Recursive definitions that call themselves through the
/// memoized binding hit the cache on the way back up.
#[instrument(skip(args), ret, err)]
pub fn native_memoize(args: Vec<Expr>) -> Result<Expr, LispError> {
    trace!("Executing native 'memoize' function");
    if args.len() != 1 {
        let arity_error = LispError::ArityError {
            form: "memoize".to_string(),
            expected: 1,
            actual: args.len(),
        };
        error!(error = %arity_error, "Arity error in native 'memoize'");
        return Err(arity_error);
    }
    match &args[0] {
        Expr::Function(_) | Expr::NativeFunction(_) => {}
        other => {
            let type_error = LispError::ValueTypeError {
                operator: "memoize".to_string(),
                expected: "procedure".to_string(),
                found: format!("{:?}", other),
            };
            error!(error = %type_error, "Type error in native 'memoize'");
            return Err(type_error);
        }
    }
    let target = args[0].clone();

    let label = match &target {
        Expr::NativeFunction(native) => format!("memoize({})", native.name),
        _ => "memoize(lambda)".to_string(),
    };

    let cache: RefCell<HashMap<Vec<CacheKey>, Expr>> = RefCell::new(HashMap::new());
    let wrapper = NativeFunction::new(label, move |call_args: Vec<Expr>| {
        match call_args
            .iter()
            .map(cache_key)
            .collect::<Option<Vec<CacheKey>>>()
        {
            Some(key) => {
                let cached = cache.borrow().get(&key).cloned();
                if let Some(value) = cached {
                    trace!("Memoized call served from cache");
                    return Ok(value);
                }
                let result = apply(target.clone(), call_args)?;
                cache.borrow_mut().insert(key, result.clone());
                Ok(result)
            }
            None => {
                trace!("Arguments are not cacheable, calling through");
                apply(target.clone(), call_args)
            }
        }
    });

    Ok(Expr::NativeFunction(wrapper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::env::Environment;
    use crate::engine::eval::eval;
    use crate::logging::init_test_logging;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Native that counts its invocations and doubles its argument.
    fn counting_double(hits: Rc<Cell<usize>>) -> NativeFunction {
        NativeFunction::new("double", move |args: Vec<Expr>| {
            hits.set(hits.get() + 1);
            match args.first() {
                Some(Expr::Number(Number::Int(value))) => Ok(Expr::int(value * 2)),
                _ => Ok(Expr::Nil),
            }
        })
    }

    #[test]
    fn memoize_wraps_a_procedure_in_a_native() {
        init_test_logging();
        let env = Environment::with_prelude();
        let expr = Expr::list([
            Expr::symbol("memoize"),
            Expr::list([
                Expr::symbol("lambda"),
                Expr::list([Expr::symbol("x")]),
                Expr::symbol("x"),
            ]),
        ]);
        match eval(&expr, env) {
            Ok(Expr::NativeFunction(native)) => assert_eq!(native.name, "memoize(lambda)"),
            other => panic!("Expected native wrapper, got {:?}", other),
        }
    }

    #[test]
    fn repeated_calls_hit_the_cache() {
        init_test_logging();
        let hits = Rc::new(Cell::new(0));
        let wrapper = native_memoize(vec![Expr::NativeFunction(counting_double(Rc::clone(
            &hits,
        )))])
        .expect("memoize should succeed");

        assert_eq!(apply(wrapper.clone(), vec![Expr::int(2)]), Ok(Expr::int(4)));
        assert_eq!(apply(wrapper, vec![Expr::int(2)]), Ok(Expr::int(4)));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn distinct_arguments_cache_separately() {
        init_test_logging();
        let hits = Rc::new(Cell::new(0));
        let wrapper = native_memoize(vec![Expr::NativeFunction(counting_double(Rc::clone(
            &hits,
        )))])
        .expect("memoize should succeed");

        assert_eq!(apply(wrapper.clone(), vec![Expr::int(2)]), Ok(Expr::int(4)));
        assert_eq!(apply(wrapper, vec![Expr::int(3)]), Ok(Expr::int(6)));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn int_and_float_arguments_do_not_collide() {
        init_test_logging();
        let hits = Rc::new(Cell::new(0));
        let wrapper = native_memoize(vec![Expr::NativeFunction(counting_double(Rc::clone(
            &hits,
        )))])
        .expect("memoize should succeed");

        assert_eq!(apply(wrapper.clone(), vec![Expr::int(2)]), Ok(Expr::int(4)));
        assert_eq!(apply(wrapper, vec![Expr::float(2.0)]), Ok(Expr::Nil));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn procedure_arguments_call_through_uncached() {
        init_test_logging();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let target = NativeFunction::new("observe", move |_args| {
            counter.set(counter.get() + 1);
            Ok(Expr::Nil)
        });
        let wrapper =
            native_memoize(vec![Expr::NativeFunction(target)]).expect("memoize should succeed");

        let argument = Expr::NativeFunction(NativeFunction::new("payload", |_args| Ok(Expr::Nil)));
        assert_eq!(
            apply(wrapper.clone(), vec![argument.clone()]),
            Ok(Expr::Nil)
        );
        assert_eq!(apply(wrapper, vec![argument]), Ok(Expr::Nil));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn memoized_recursion_runs_each_input_once() {
        init_test_logging();
        let env = Environment::with_prelude();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        // Counts and passes through, so it can sit inside the condition.
        env.borrow_mut().define(
            "count!".to_string(),
            Expr::NativeFunction(NativeFunction::new("count!", move |args: Vec<Expr>| {
                counter.set(counter.get() + 1);
                Ok(args.into_iter().next().unwrap_or(Expr::Nil))
            })),
        );

        // (define fib
        //   (memoize (lambda (n)
        //     (if (< (count! n) 2)
        //         1
        //         (+ (fib (- n 2)) (fib (- n 1)))))))
        let body = Expr::list([
            Expr::symbol("if"),
            Expr::list([
                Expr::symbol("<"),
                Expr::list([Expr::symbol("count!"), Expr::symbol("n")]),
                Expr::int(2),
            ]),
            Expr::int(1),
            Expr::list([
                Expr::symbol("+"),
                Expr::list([
                    Expr::symbol("fib"),
                    Expr::list([Expr::symbol("-"), Expr::symbol("n"), Expr::int(2)]),
                ]),
                Expr::list([
                    Expr::symbol("fib"),
                    Expr::list([Expr::symbol("-"), Expr::symbol("n"), Expr::int(1)]),
                ]),
            ]),
        ]);
        let definition = Expr::list([
            Expr::symbol("define"),
            Expr::symbol("fib"),
            Expr::list([
                Expr::symbol("memoize"),
                Expr::list([
                    Expr::symbol("lambda"),
                    Expr::list([Expr::symbol("n")]),
                    body,
                ]),
            ]),
        ]);
        eval(&definition, Rc::clone(&env)).expect("define should succeed");

        let call = Expr::list([Expr::symbol("fib"), Expr::int(10)]);
        assert_eq!(eval(&call, env), Ok(Expr::int(89)));
        // One body execution per distinct input 0..=10; without the cache
        // this would be 177.
        assert_eq!(hits.get(), 11);
    }

    #[test]
    fn memoize_rejects_non_procedures() {
        init_test_logging();
        assert_eq!(
            native_memoize(vec![Expr::int(5)]),
            Err(LispError::ValueTypeError {
                operator: "memoize".to_string(),
                expected: "procedure".to_string(),
                found: "Number(Int(5))".to_string(),
            })
        );
    }

    #[test]
    fn memoize_arity_error() {
        init_test_logging();
        assert_eq!(
            native_memoize(vec![]),
            Err(LispError::ArityError {
                form: "memoize".to_string(),
                expected: 1,
                actual: 0,
            })
        );
    }
}
