use anyhow::Result;
use clap::{Parser, ValueEnum};
use rscheme::{Expr, evaluate};
use tracing::info;

/// Runs the evaluator over small, pre-built expression trees.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(name = "rscheme", bin_name = "rscheme")]
struct Cli {
    /// Which demo program to run.
    #[clap(short, long, value_enum, default_value = "fibonacci")]
    demo: Demo,

    /// Number handed to the demo program.
    #[clap(short, long, default_value_t = 9)]
    number: i64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Demo {
    /// Recursive Fibonacci through `define` and a closure.
    Fibonacci,
    /// The same Fibonacci, wrapped in `memoize`.
    MemoFibonacci,
    /// A squaring closure.
    Square,
}

#[tracing::instrument]
fn main() -> Result<()> {
    rscheme::logging::init_logging();

    info!("Starting demo runner");
    let cli = Cli::parse();
    info!(?cli, "Parsed CLI arguments");

    match cli.demo {
        Demo::Fibonacci => run_fibonacci(cli.number, false)?,
        Demo::MemoFibonacci => run_fibonacci(cli.number, true)?,
        Demo::Square => run_square(cli.number)?,
    }

    info!("Demo runner finished");
    Ok(())
}

/// (define fibonacci
///   (lambda (n)
///     (if (< n 2)
///         1
///         (+ (fibonacci (- n 2)) (fibonacci (- n 1))))))
fn fibonacci_lambda() -> Expr {
    Expr::list([
        Expr::symbol("lambda"),
        Expr::list([Expr::symbol("n")]),
        Expr::list([
            Expr::symbol("if"),
            Expr::list([Expr::symbol("<"), Expr::symbol("n"), Expr::int(2)]),
            Expr::int(1),
            Expr::list([
                Expr::symbol("+"),
                Expr::list([
                    Expr::symbol("fibonacci"),
                    Expr::list([Expr::symbol("-"), Expr::symbol("n"), Expr::int(2)]),
                ]),
                Expr::list([
                    Expr::symbol("fibonacci"),
                    Expr::list([Expr::symbol("-"), Expr::symbol("n"), Expr::int(1)]),
                ]),
            ]),
        ]),
    ])
}

fn run_fibonacci(number: i64, memoized: bool) -> Result<()> {
    let procedure = if memoized {
        Expr::list([Expr::symbol("memoize"), fibonacci_lambda()])
    } else {
        fibonacci_lambda()
    };
    let definition = Expr::list([
        Expr::symbol("define"),
        Expr::symbol("fibonacci"),
        procedure,
    ]);
    evaluate(&definition)?;

    let call = Expr::list([Expr::symbol("fibonacci"), Expr::int(number)]);
    let result = evaluate(&call)?;
    println!("{call} => {result}");
    Ok(())
}

fn run_square(number: i64) -> Result<()> {
    let definition = Expr::list([
        Expr::symbol("define"),
        Expr::symbol("square"),
        Expr::list([
            Expr::symbol("lambda"),
            Expr::list([Expr::symbol("x")]),
            Expr::list([Expr::symbol("*"), Expr::symbol("x"), Expr::symbol("x")]),
        ]),
    ]);
    evaluate(&definition)?;

    let call = Expr::list([Expr::symbol("square"), Expr::int(number)]);
    let result = evaluate(&call)?;
    println!("{call} => {result}");
    Ok(())
}
