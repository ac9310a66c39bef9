//! Coercion (§4.5, grounded in `original_source/arc.cpp`'s
//! `builtin_coerce`'s per-source-type matrix): `char` coerces to `int
//! num string sym char`; `num` to `int char string num`; `string` to
//! `sym cons num int string`; a proper list of characters coerces to
//! `string`; `sym` coerces to `string sym`. `int` is `coerce`'s `int`
//! branch exposed as its own operator, truncating toward zero (§9 Open
//! Questions).

use super::{disp_string, require_args, str_to_string};
use crate::error::ArcError;
use crate::value::Value;
use lisp_macros::builtin;

fn target_name(v: &Value) -> Result<&str, ArcError> {
    match v {
        Value::Sym(s) => Ok(s.name()),
        _ => Err(ArcError::WrongType),
    }
}

/// Coerces `obj` to `type` (a type-name symbol), following the matrix
/// documented above.
#[builtin(name = "coerce")]
pub fn builtin_coerce(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 2)?;
    let obj = &args[0];
    let ty = target_name(&args[1])?;
    match obj {
        Value::Char(c) => match ty {
            "int" | "num" => Ok(Value::Num(*c as f64)),
            "string" => Ok(Value::str_from(&(*c as char).to_string())),
            "sym" => Ok(Value::sym(&(*c as char).to_string())),
            "char" => Ok(obj.clone()),
            _ => Err(ArcError::WrongType),
        },
        Value::Num(n) => match ty {
            "int" => Ok(Value::Num(n.trunc())),
            "char" => Ok(Value::Char(*n as u8)),
            "string" => Ok(Value::str_from(&disp_string(obj))),
            "num" => Ok(obj.clone()),
            _ => Err(ArcError::WrongType),
        },
        Value::Str(_) => {
            let s = str_to_string(obj)?;
            match ty {
                "sym" => Ok(Value::sym(&s)),
                "cons" => Ok(Value::from_vec(s.chars().map(|c| Value::Char(c as u8)).collect())),
                "num" => Ok(Value::Num(s.trim().parse::<f64>().unwrap_or(0.0))),
                "int" => Ok(Value::Num(s.trim().parse::<f64>().unwrap_or(0.0).trunc())),
                "string" => Ok(obj.clone()),
                _ => Err(ArcError::WrongType),
            }
        }
        Value::Cons(_) if obj.is_proper_list() => match ty {
            "string" => {
                let mut s = String::new();
                for item in obj.iter_list() {
                    match item {
                        Value::Char(c) => s.push(c as char),
                        other => s.push_str(&disp_string(&other)),
                    }
                }
                Ok(Value::str_from(&s))
            }
            "cons" => Ok(obj.clone()),
            _ => Err(ArcError::WrongType),
        },
        Value::Sym(s) => match ty {
            "string" => Ok(Value::str_from(s.name())),
            "sym" => Ok(obj.clone()),
            _ => Err(ArcError::WrongType),
        },
        _ => Ok(obj.clone()),
    }
}

/// Truncates a number toward zero, or coerces a string/symbol/char to an
/// integer-valued number the same way (§9 Open Questions: `int` is
/// permissive across every numeric-ish input type).
#[builtin(name = "int")]
pub fn builtin_int(args: &[Value]) -> Result<Value, ArcError> {
    require_args(args, 1)?;
    match &args[0] {
        Value::Num(n) => Ok(Value::Num(n.trunc())),
        Value::Char(c) => Ok(Value::Num(*c as f64)),
        Value::Str(_) => {
            let s = str_to_string(&args[0])?;
            Ok(Value::Num(s.trim().parse::<f64>().unwrap_or(0.0).trunc()))
        }
        Value::Sym(s) => Ok(Value::Num(
            s.name().trim().parse::<f64>().unwrap_or(0.0).trunc(),
        )),
        _ => Err(ArcError::WrongType),
    }
}

pub fn register(env: &std::rc::Rc<crate::env::Environment>) {
    register_builtin_coerce(env);
    register_builtin_int(env);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_coerces_to_string_and_int() {
        let r = builtin_coerce(&[Value::Char(b'a'), Value::sym("string")]).unwrap();
        assert_eq!(crate::value::write_form(&r, false), "a");
        let r = builtin_coerce(&[Value::Char(b'a'), Value::sym("int")]).unwrap();
        assert!(matches!(r, Value::Num(n) if n == 97.0));
    }

    #[test]
    fn string_coerces_to_cons_of_chars() {
        let r = builtin_coerce(&[Value::str_from("ab"), Value::sym("cons")]).unwrap();
        let items = r.to_vec().unwrap();
        assert_eq!(items, vec![Value::Char(b'a'), Value::Char(b'b')]);
    }

    #[test]
    fn int_truncates_toward_zero() {
        assert!(matches!(builtin_int(&[Value::Num(-7.9)]).unwrap(), Value::Num(n) if n == -7.0));
        assert!(matches!(builtin_int(&[Value::str_from("42")]).unwrap(), Value::Num(n) if n == 42.0));
    }
}
