//! Control and reflection (§4.5): `apply` spreads a final list argument
//! onto a call; `ccc` installs a one-shot escape continuation; `eval`
//! and `macex` re-enter the evaluator/macro-expander against the global
//! environment, the only frame a bare `BuiltinFn` pointer can reach
//! (arc.cpp's `global_env`, mirrored by `env::global_environment`);
//! `load` reads and evaluates a source file; `err` raises a user error;
//! `bound` tests whether a symbol resolves; `quit` exits the process;
//! `rand` is the one source of randomness in the library.

use super::{require_args, str_to_string};
use crate::env::global_environment;
use crate::error::ArcError;
use crate::value::Value;
use lisp_macros::builtin;

/// Calls `f` with `args` followed by the elements of a final list
/// argument spread in place.
#[builtin(name = "apply")]
pub fn builtin_apply(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 2)?;
    let spread = args[1]
        .to_vec()
        .ok_or(ArcError::WrongType)?;
    crate::eval::apply(&args[0], &spread)
}

/// Installs a one-shot escape continuation and calls `f` with it.
#[builtin(name = "ccc")]
pub fn builtin_ccc(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    crate::eval::call_cc(&args[0])
}

/// Macroexpands and evaluates `expr` against the global environment.
#[builtin(name = "eval")]
pub fn builtin_eval(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    let global = global_environment();
    let expanded = crate::macros::macex(&args[0], &global)?;
    crate::eval::eval(&expanded, &global)
}

/// Macroexpands `expr` without evaluating it.
#[builtin(name = "macex")]
pub fn builtin_macex(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    crate::macros::macex(&args[0], &global_environment())
}

/// Reads and evaluates every top-level form in a file, in order, against
/// the global environment.
#[builtin(name = "load")]
pub fn builtin_load(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    let path = str_to_string(&args[0])?;
    let source = std::fs::read_to_string(&path).map_err(|_| ArcError::File)?;
    let forms = crate::reader::read_all(&source)?;
    let global = global_environment();
    for form in forms {
        let expanded = crate::macros::macex(&form, &global)?;
        crate::eval::eval(&expanded, &global)?;
    }
    Ok(Value::Nil)
}

/// Raises a user error; every argument is rendered to its display form
/// and carried as a separate message line (§6/§7).
#[builtin(name = "err")]
pub fn builtin_err(args: &[Value]) -> Result<Value, ArcError> {
    if args.is_empty() {
        return Err(ArcError::WrongArgCount);
    }
    Err(ArcError::user(args.iter().map(super::disp_string).collect()))
}

/// True if `s` is bound anywhere visible from the global environment.
#[builtin(name = "bound")]
pub fn builtin_bound(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    let sym = match &args[0] {
        Value::Sym(s) => s,
        _ => return Err(ArcError::WrongType),
    };
    Ok(super::truthy_bool(global_environment().is_bound(sym)))
}

/// Exits the process immediately with status 0.
#[builtin(name = "quit")]
pub fn builtin_quit(args: &[Value]) -> Result<Value, ArcError> {
    if !args.is_empty() {
        return Err(ArcError::WrongArgCount);
    }
    std::process::exit(0);
}

/// No-argument form returns a uniform `f64` in `[0, 1)`; one-argument
/// form returns a uniform integer-valued `f64` in `[0, n)`.
#[builtin(name = "rand")]
pub fn builtin_rand(args: &[Value]) -> Result<Value, ArcError> {
    use std::cell::Cell;
    thread_local! {
        static SEED: Cell<u64> = const { Cell::new(0x2545F4914F6CDD1D) };
    }
    // xorshift64*, seeded from the previous draw; adequate for a
    // scripting-language `rand`, not for cryptographic use.
    let next = SEED.with(|s| {
        let mut x = s.get();
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        s.set(x);
        x.wrapping_mul(0x2545F4914F6CDD1D)
    });
    let unit = (next >> 11) as f64 / (1u64 << 53) as f64;
    match args.len() {
        0 => Ok(Value::Num(unit)),
        1 => {
            let n = super::as_num(&args[0])?;
            Ok(Value::Num((unit * n).floor()))
        }
        _ => Err(ArcError::WrongArgCount),
    }
}

pub fn register(env: &std::rc::Rc<crate::env::Environment>) {
    register_builtin_apply(env);
    register_builtin_ccc(env);
    register_builtin_eval(env);
    register_builtin_macex(env);
    register_builtin_load(env);
    register_builtin_err(env);
    register_builtin_bound(env);
    register_builtin_quit(env);
    register_builtin_rand(env);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_spreads_trailing_list() {
        let env = crate::env::Environment::new();
        crate::builtins::register_builtins(&env);
        let add = env.lookup(&crate::symbol::intern("+")).unwrap();
        let result = builtin_apply(&[
            add,
            Value::from_vec(vec![Value::Num(1.0), Value::Num(2.0), Value::Num(3.0)]),
        ])
        .unwrap();
        assert!(matches!(result, Value::Num(n) if n == 6.0));
    }

    #[test]
    fn err_carries_display_form_messages() {
        let result = builtin_err(&[Value::str_from("boom"), Value::Num(1.0)]);
        match result {
            Err(ArcError::User(msgs)) => assert_eq!(msgs, vec!["boom".to_string(), "1".to_string()]),
            _ => panic!("expected a user error"),
        }
    }

    #[test]
    fn bound_reflects_global_bindings() {
        let env = crate::env::Environment::new();
        crate::builtins::register_builtins(&env);
        assert!(builtin_bound(&[Value::sym("+")]).unwrap().is_truthy());
        assert!(!builtin_bound(&[Value::sym("totally-unbound-name")])
            .unwrap()
            .is_truthy());
    }

    #[test]
    fn rand_with_bound_stays_in_range() {
        let env = crate::env::Environment::new();
        crate::builtins::register_builtins(&env);
        for _ in 0..20 {
            let r = builtin_rand(&[Value::Num(10.0)]).unwrap();
            assert!(matches!(r, Value::Num(n) if (0.0..10.0).contains(&n)));
        }
    }
}
