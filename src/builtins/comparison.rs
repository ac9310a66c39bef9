//! Comparison (§4.5): `<` / `>` accept a variadic chain of numbers or
//! strings (true for 0 or 1 arguments); `is` is shallow identity over a
//! variadic chain (§3); `iso` is the same chain recursing into CONS.

use crate::error::ArcError;
use crate::value::Value;
use lisp_macros::builtin;

enum Chain<'a> {
    Nums(Vec<f64>),
    Strs(Vec<std::cell::Ref<'a, Vec<u8>>>),
}

fn chain(args: &[Value]) -> Result<Chain<'_>, ArcError> {
    match args.first() {
        Some(Value::Num(_)) => {
            let mut v = Vec::with_capacity(args.len());
            for a in args {
                match a {
                    Value::Num(n) => v.push(*n),
                    _ => return Err(ArcError::WrongType),
                }
            }
            Ok(Chain::Nums(v))
        }
        Some(Value::Str(_)) => {
            let mut v = Vec::with_capacity(args.len());
            for a in args {
                match a {
                    Value::Str(s) => v.push(s.borrow()),
                    _ => return Err(ArcError::WrongType),
                }
            }
            Ok(Chain::Strs(v))
        }
        _ => Err(ArcError::WrongType),
    }
}

fn truthy(b: bool) -> Value {
    if b {
        Value::sym("t")
    } else {
        Value::Nil
    }
}

/// True if each argument is strictly less than the next; numbers or
/// strings only. True (vacuously) for 0 or 1 arguments.
#[builtin(name = "<")]
pub fn builtin_lt(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() <= 1 {
        return Ok(truthy(true));
    }
    let ok = match chain(args)? {
        Chain::Nums(v) => v.windows(2).all(|w| w[0] < w[1]),
        Chain::Strs(v) => v.windows(2).all(|w| *w[0] < *w[1]),
    };
    Ok(truthy(ok))
}

/// True if each argument is strictly greater than the next; numbers or
/// strings only. True (vacuously) for 0 or 1 arguments.
#[builtin(name = ">")]
pub fn builtin_gt(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() <= 1 {
        return Ok(truthy(true));
    }
    let ok = match chain(args)? {
        Chain::Nums(v) => v.windows(2).all(|w| w[0] > w[1]),
        Chain::Strs(v) => v.windows(2).all(|w| *w[0] > *w[1]),
    };
    Ok(truthy(ok))
}

/// Shallow identity (§3) over a variadic chain; true for 0 or 1 arguments.
#[builtin(name = "is")]
pub fn builtin_is(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() <= 1 {
        return Ok(truthy(true));
    }
    Ok(truthy(args.windows(2).all(|w| w[0].is_identical(&w[1]))))
}

/// Structural equality, recursing into CONS (§3) over a variadic chain.
#[builtin(name = "iso")]
pub fn builtin_iso(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() <= 1 {
        return Ok(truthy(true));
    }
    Ok(truthy(
        args.windows(2).all(|w| w[0].is_structurally_equal(&w[1])),
    ))
}

pub fn register(env: &std::rc::Rc<crate::env::Environment>) {
    register_builtin_lt(env);
    register_builtin_gt(env);
    register_builtin_is(env);
    register_builtin_iso(env);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lt_gt_chains() {
        assert!(builtin_lt(&[Value::Num(1.0), Value::Num(2.0), Value::Num(3.0)])
            .unwrap()
            .is_truthy());
        assert!(!builtin_lt(&[Value::Num(1.0), Value::Num(2.0), Value::Num(1.0)])
            .unwrap()
            .is_truthy());
    }

    #[test]
    fn is_is_shallow_iso_is_structural() {
        let a = Value::cons(Value::Num(1.0), Value::Nil);
        let b = Value::cons(Value::Num(1.0), Value::Nil);
        assert!(!builtin_is(&[a.clone(), b.clone()]).unwrap().is_truthy());
        assert!(builtin_iso(&[a, b]).unwrap().is_truthy());
    }
}
