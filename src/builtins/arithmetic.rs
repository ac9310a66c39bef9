//! Arithmetic (§4.5): `+ - * /` are variadic with identity elements `0 1
//! 0 1` for empty argument lists; `+` overloads to string concatenation
//! and list append when the first argument is a string or a list; `mod`
//! is floored (result takes the divisor's sign); the rest are the usual
//! one-argument math functions.

use super::{as_num, require_args};
use crate::error::ArcError;
use crate::value::Value;
use lisp_macros::builtin;

/// Sum of all arguments; concatenates when the first argument is a
/// string, appends copies of all arguments when it is a list; 0 for no
/// arguments.
#[builtin(name = "+")]
pub fn builtin_add(args: &[Value]) -> Result<Value, ArcError> {
    match args.first() {
        None => Ok(Value::Num(0.0)),
        Some(Value::Str(_)) => {
            let mut s = String::new();
            for a in args {
                s.push_str(&super::disp_string(a));
            }
            Ok(Value::str_from(&s))
        }
        Some(Value::Nil) | Some(Value::Cons(_)) => {
            let mut items = Vec::new();
            for a in args {
                match a.to_vec() {
                    Some(v) => items.extend(v),
                    None => return Err(ArcError::WrongType),
                }
            }
            Ok(Value::from_vec(items))
        }
        Some(Value::Num(_)) => {
            let mut sum = 0.0;
            for a in args {
                sum += as_num(a)?;
            }
            Ok(Value::Num(sum))
        }
        _ => Err(ArcError::WrongType),
    }
}

/// Subtracts subsequent arguments from the first; negates a single
/// argument; 0 for no arguments.
#[builtin(name = "-")]
pub fn builtin_sub(args: &[Value]) -> Result<Value, ArcError> {
    if args.is_empty() {
        return Ok(Value::Num(0.0));
    }
    let first = as_num(&args[0])?;
    if args.len() == 1 {
        return Ok(Value::Num(-first));
    }
    let mut r = first;
    for a in &args[1..] {
        r -= as_num(a)?;
    }
    Ok(Value::Num(r))
}

/// Product of all arguments; 1 for no arguments.
#[builtin(name = "*")]
pub fn builtin_mul(args: &[Value]) -> Result<Value, ArcError> {
    let mut r = 1.0;
    for a in args {
        r *= as_num(a)?;
    }
    Ok(Value::Num(r))
}

/// Divides the first argument by subsequent arguments; reciprocal of a
/// single argument; 1 for no arguments.
#[builtin(name = "/")]
pub fn builtin_div(args: &[Value]) -> Result<Value, ArcError> {
    if args.is_empty() {
        return Ok(Value::Num(1.0));
    }
    let first = as_num(&args[0])?;
    if args.len() == 1 {
        return Ok(Value::Num(1.0 / first));
    }
    let mut r = first;
    for a in &args[1..] {
        r /= as_num(a)?;
    }
    Ok(Value::Num(r))
}

/// Floored remainder: the result takes the sign of the divisor.
#[builtin(name = "mod")]
pub fn builtin_mod(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 2)?;
    let a = as_num(&args[0])?;
    let b = as_num(&args[1])?;
    let mut r = a % b;
    if a * b < 0.0 && r != 0.0 {
        r += b;
    }
    Ok(Value::Num(r))
}

/// Exponentiation.
#[builtin(name = "expt")]
pub fn builtin_expt(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 2)?;
    Ok(Value::Num(as_num(&args[0])?.powf(as_num(&args[1])?)))
}

/// Natural logarithm.
#[builtin(name = "log")]
pub fn builtin_log(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.ln()))
}

/// Square root.
#[builtin(name = "sqrt")]
pub fn builtin_sqrt(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.sqrt()))
}

/// Sine.
#[builtin(name = "sin")]
pub fn builtin_sin(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.sin()))
}

/// Cosine.
#[builtin(name = "cos")]
pub fn builtin_cos(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.cos()))
}

/// Tangent.
#[builtin(name = "tan")]
pub fn builtin_tan(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.tan()))
}

/// Truncates toward zero.
#[builtin(name = "trunc")]
pub fn builtin_trunc(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.trunc()))
}

pub fn register(env: &std::rc::Rc<crate::env::Environment>) {
    register_builtin_add(env);
    register_builtin_sub(env);
    register_builtin_mul(env);
    register_builtin_div(env);
    register_builtin_mod(env);
    register_builtin_expt(env);
    register_builtin_log(env);
    register_builtin_sqrt(env);
    register_builtin_sin(env);
    register_builtin_cos(env);
    register_builtin_tan(env);
    register_builtin_trunc(env);
}
