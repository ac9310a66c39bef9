//! Native operators (§4.5), one module per group, each exposing
//! `fn builtin_x(args: &[Value]) -> Result<Value, ArcError>` functions
//! decorated with `#[builtin(name = "...")]` and a `register(env)` that
//! binds all of them.

use crate::env::Environment;
use crate::error::ArcError;
use crate::value::Value;
use std::rc::Rc;

pub mod arithmetic;
pub mod coercion;
pub mod comparison;
pub mod control;
pub mod fileproc;
pub mod io;
pub mod pairs;
pub mod reflection;
pub mod strings;
pub mod tables;

/// Binds every built-in operator named in §4.5 into `env` (normally the
/// global environment, before the bundled standard library is loaded).
pub fn register_builtins(env: &Rc<Environment>) {
    crate::env::set_global_environment(env.clone());
    // `t` is an ordinary symbol bound to itself (arc.cpp's `bind_global("t",
    // ...)`), not a distinct boolean tag — §3/§15.
    env.bind(crate::symbol::intern("t"), Value::sym("t"));
    pairs::register(env);
    arithmetic::register(env);
    comparison::register(env);
    reflection::register(env);
    io::register(env);
    fileproc::register(env);
    strings::register(env);
    tables::register(env);
    coercion::register(env);
    control::register(env);
}

/// Extracts an `f64` from a `NUM`, or `WrongType`.
pub(crate) fn as_num(v: &Value) -> Result<f64, ArcError> {
    match v {
        Value::Num(n) => Ok(*n),
        _ => Err(ArcError::WrongType),
    }
}

pub(crate) fn as_str(v: &Value) -> Result<std::cell::Ref<'_, Vec<u8>>, ArcError> {
    match v {
        Value::Str(s) => Ok(s.borrow()),
        _ => Err(ArcError::WrongType),
    }
}

pub(crate) fn str_to_string(v: &Value) -> Result<String, ArcError> {
    let bytes = as_str(v)?;
    Ok(bytes.iter().map(|&b| b as char).collect())
}

pub(crate) fn as_char(v: &Value) -> Result<u8, ArcError> {
    match v {
        Value::Char(c) => Ok(*c),
        _ => Err(ArcError::WrongType),
    }
}

pub(crate) fn require_args(args: &[Value], n: usize) -> Result<(), ArcError> {
    if args.len() != n {
        Err(ArcError::WrongArgCount)
    } else {
        Ok(())
    }
}

/// `disp`-style string rendering of any value (used by `+`'s string
/// overload and `string`, §4.5).
pub(crate) fn disp_string(v: &Value) -> String {
    crate::value::write_form(v, false)
}

/// `t`/`nil` for a Rust `bool` (§3: `t` is an ordinary self-evaluating
/// symbol, not a distinct boolean tag).
pub(crate) fn truthy_bool(b: bool) -> Value {
    if b {
        Value::sym("t")
    } else {
        Value::Nil
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_is_bound_to_itself_in_the_global_environment() {
        let env = Environment::new();
        register_builtins(&env);
        let looked_up = env.lookup(&crate::symbol::intern("t")).unwrap();
        assert!(matches!(looked_up, Value::Sym(s) if s.name() == "t"));
    }
}
