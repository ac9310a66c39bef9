// ABOUTME: Library module exposing internal components for testing

pub mod builtins;
pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod highlighter;
pub mod macros;
pub mod reader;
pub mod stdlib;
pub mod symbol;
pub mod value;

use env::Environment;
use error::ArcError;
use value::Value;

/// Evaluates every top-level form in `source` against a fresh environment
/// seeded with the native builtins and the bundled prelude, returning the
/// value of the last form. Integration tests' single entry point into the
/// read-expand-eval pipeline `main.rs` drives interactively; each call gets
/// its own `Environment`, so tests calling this concurrently don't share
/// global bindings (the thread-local symbol interner and global-environment
/// slot in `env.rs`/`symbol.rs` are themselves per-thread, so even that
/// process-wide state doesn't leak between tests running on separate
/// threads).
pub fn eval_source(source: &str) -> Result<Value, ArcError> {
    let env = Environment::new();
    builtins::register_builtins(&env);
    stdlib::register_stdlib(&env)?;

    let mut last = Value::Nil;
    for form in reader::read_all(source)? {
        let expanded = macros::macex(&form, &env)?;
        last = eval::eval(&expanded, &env)?;
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_source_returns_last_top_level_value() {
        let result = eval_source("(assign x 1) (assign y (+ x 2)) y").unwrap();
        assert!(matches!(result, Value::Num(n) if n == 3.0));
    }

    #[test]
    fn eval_source_propagates_errors() {
        let err = eval_source("(+ 1 undefined-symbol)").unwrap_err();
        assert!(matches!(err, ArcError::UnboundSymbol));
    }
}
