//! Hash table (§4.5): `table` allocates an empty table; `table-sref`
//! destructively sets a key; `maptable` calls a procedure with each
//! `(key value)` pair for side effect and returns the table unchanged.

use super::require_args;
use crate::error::ArcError;
use crate::value::Value;
use lisp_macros::builtin;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Allocates a new, empty table.
#[builtin(name = "table")]
pub fn builtin_table(args: &[Value]) -> Result<Value, ArcError> {
    if !args.is_empty() {
        return Err(ArcError::WrongArgCount);
    }
    Ok(Value::Table(Rc::new(RefCell::new(HashMap::new()))))
}

/// Calls `proc` with each `(key value)` pair of `table1` in turn, for
/// side effect; returns `table1`.
#[builtin(name = "maptable")]
pub fn builtin_maptable(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 2)?;
    let proc = &args[0];
    let table = match &args[1] {
        Value::Table(t) => t.clone(),
        _ => return Err(ArcError::WrongType),
    };
    let pairs: Vec<(Value, Value)> = table
        .borrow()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (k, v) in pairs {
        crate::eval::apply(proc, &[k, v])?;
    }
    Ok(args[1].clone())
}

/// Destructively sets `table1[index]`; returns the value written.
#[builtin(name = "table-sref")]
pub fn builtin_table_sref(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 3)?;
    let table = match &args[0] {
        Value::Table(t) => t,
        _ => return Err(ArcError::WrongType),
    };
    table.borrow_mut().insert(args[2].clone(), args[1].clone());
    Ok(args[1].clone())
}

pub fn register(env: &std::rc::Rc<crate::env::Environment>) {
    register_builtin_table(env);
    register_builtin_maptable(env);
    register_builtin_table_sref(env);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_sref_then_lookup() {
        let t = builtin_table(&[]).unwrap();
        builtin_table_sref(&[t.clone(), Value::Num(42.0), Value::sym("x")]).unwrap();
        match &t {
            Value::Table(tbl) => {
                assert_eq!(
                    tbl.borrow().get(&Value::sym("x")),
                    Some(&Value::Num(42.0))
                );
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn table_rejects_arguments() {
        assert!(builtin_table(&[Value::Nil]).is_err());
    }
}
