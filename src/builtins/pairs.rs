//! Pair and list (§4.5): `car`/`cdr`/`cons`; destructive `scar`/`scdr`
//! mutate an existing pair's slot; `len` (supplemented from
//! `original_source/arc.cpp`'s `builtin_len`) measures lists, strings,
//! and tables alike.

use super::require_args;
use crate::error::ArcError;
use crate::value::Value;
use lisp_macros::builtin;

/// First element of a pair; `(car nil)` is `nil` (permissive branch,
/// §9 Open Questions).
#[builtin(name = "car")]
pub fn builtin_car(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        Value::Cons(cell) => Ok(cell.borrow().0.clone()),
        _ => Err(ArcError::WrongType),
    }
}

/// Rest of a pair; `(cdr nil)` is `nil` (permissive branch, §9 Open
/// Questions).
#[builtin(name = "cdr")]
pub fn builtin_cdr(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        Value::Cons(cell) => Ok(cell.borrow().1.clone()),
        _ => Err(ArcError::WrongType),
    }
}

/// Constructs a new pair.
#[builtin(name = "cons")]
pub fn builtin_cons(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 2)?;
    Ok(Value::cons(args[0].clone(), args[1].clone()))
}

/// Destructively sets the `car` slot of an existing pair; returns the new
/// value.
#[builtin(name = "scar")]
pub fn builtin_scar(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 2)?;
    match &args[0] {
        Value::Cons(cell) => {
            cell.borrow_mut().0 = args[1].clone();
            Ok(args[1].clone())
        }
        _ => Err(ArcError::WrongType),
    }
}

/// Destructively sets the `cdr` slot of an existing pair; returns the new
/// value.
#[builtin(name = "scdr")]
pub fn builtin_scdr(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 2)?;
    match &args[0] {
        Value::Cons(cell) => {
            cell.borrow_mut().1 = args[1].clone();
            Ok(args[1].clone())
        }
        _ => Err(ArcError::WrongType),
    }
}

/// Length of a list, string, or table.
#[builtin(name = "len")]
pub fn builtin_len(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    let n = match &args[0] {
        Value::Str(s) => s.borrow().len(),
        Value::Table(t) => t.borrow().len(),
        Value::Nil => 0,
        Value::Cons(_) => args[0].iter_list().count(),
        _ => return Err(ArcError::WrongType),
    };
    Ok(Value::Num(n as f64))
}

pub fn register(env: &std::rc::Rc<crate::env::Environment>) {
    register_builtin_car(env);
    register_builtin_cdr(env);
    register_builtin_cons(env);
    register_builtin_scar(env);
    register_builtin_scdr(env);
    register_builtin_len(env);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn car_cdr_of_nil_is_nil() {
        assert!(builtin_car(&[Value::Nil]).unwrap().is_nil());
        assert!(builtin_cdr(&[Value::Nil]).unwrap().is_nil());
    }

    #[test]
    fn cons_then_car_cdr_round_trip() {
        let pair = builtin_cons(&[Value::Num(1.0), Value::Num(2.0)]).unwrap();
        assert!(matches!(builtin_car(&[pair.clone()]).unwrap(), Value::Num(n) if n == 1.0));
        assert!(matches!(builtin_cdr(&[pair]).unwrap(), Value::Num(n) if n == 2.0));
    }

    #[test]
    fn scar_mutates_in_place() {
        let pair = builtin_cons(&[Value::Num(1.0), Value::Num(2.0)]).unwrap();
        builtin_scar(&[pair.clone(), Value::Num(99.0)]).unwrap();
        assert!(matches!(builtin_car(&[pair]).unwrap(), Value::Num(n) if n == 99.0));
    }

    #[test]
    fn len_of_list_and_string() {
        let list = Value::from_vec(vec![Value::Num(1.0), Value::Num(2.0), Value::Num(3.0)]);
        assert!(matches!(builtin_len(&[list]).unwrap(), Value::Num(n) if n == 3.0));
        assert!(matches!(
            builtin_len(&[Value::str_from("hi")]).unwrap(),
            Value::Num(n) if n == 2.0
        ));
    }
}
