//! Reflection (§4.5): `type` returns the canonical symbol for a value's
//! tag.

use super::require_args;
use crate::error::ArcError;
use crate::value::Value;
use lisp_macros::builtin;

/// Canonical type-tag symbol: one of `cons sym fn string num mac table
/// char input input-pipe output`.
#[builtin(name = "type")]
pub fn builtin_type(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    Ok(Value::sym(args[0].type_name()))
}

pub fn register(env: &std::rc::Rc<crate::env::Environment>) {
    register_builtin_type(env);
}
