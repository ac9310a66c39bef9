// ABOUTME: Macro expansion - macros are retagged closures, expanded against the global environment only

use crate::env::Environment;
use crate::error::ArcError;
use crate::symbol::Symbol;
use crate::value::{ClosureData, Value};
use std::rc::Rc;

/// Expands `expr` fully, applying macros wherever they head a form.
///
/// Whether a symbol names a macro is decided by looking it up in
/// `global_env` alone, never the lexical environment a nested form
/// happens to be read in (§4.3). A `quote`-headed form is returned
/// unchanged; any other proper list has each element expanded in place
/// and, if its head resolves to a `MACRO`, is replaced by applying that
/// macro (as a plain closure, with its arguments left unevaluated) and
/// recursively re-expanding the result.
pub fn macex(expr: &Value, global_env: &Rc<Environment>) -> Result<Value, ArcError> {
    if !expr.is_proper_list() || expr.is_nil() {
        return Ok(expr.clone());
    }

    let head = expr.car().unwrap();
    if let Value::Sym(s) = &head {
        if s.name() == "quote" {
            return Ok(expr.clone());
        }
        if let Some(closure) = lookup_macro(s, global_env) {
            let args = expr.cdr().unwrap().to_vec().ok_or(ArcError::Syntax)?;
            let expanded = apply_macro_closure(&closure, args)?;
            return macex(&expanded, global_env);
        }
    }

    let items: Vec<Value> = expr
        .to_vec()
        .ok_or(ArcError::Syntax)?
        .iter()
        .map(|item| macex(item, global_env))
        .collect::<Result<_, _>>()?;
    Ok(Value::from_vec(items))
}

fn lookup_macro(sym: &Symbol, global_env: &Rc<Environment>) -> Option<Rc<ClosureData>> {
    match global_env.lookup(sym) {
        Ok(Value::Macro(data)) => Some(data),
        _ => None,
    }
}

fn apply_macro_closure(closure: &Rc<ClosureData>, args: Vec<Value>) -> Result<Value, ArcError> {
    let call_env = Environment::with_parent(closure.env.clone());
    crate::eval::bind_params(&closure.params, &args, &call_env)?;
    let mut result = Value::Nil;
    for form in &closure.body {
        result = crate::eval::eval(form, &call_env)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_expr;

    fn read(s: &str) -> Value {
        read_expr(s).unwrap().unwrap().0
    }

    #[test]
    fn non_macro_forms_pass_through_unchanged() {
        let global = Environment::new();
        let expr = read("(+ 1 2)");
        let expanded = macex(&expr, &global).unwrap();
        assert_eq!(
            crate::value::write_form(&expanded, true),
            crate::value::write_form(&expr, true)
        );
    }

    #[test]
    fn quoted_forms_are_never_expanded() {
        let global = Environment::new();
        let expr = read("'(my-macro 1 2)");
        let expanded = macex(&expr, &global).unwrap();
        assert_eq!(
            crate::value::write_form(&expanded, true),
            crate::value::write_form(&expr, true)
        );
    }

    #[test]
    fn macro_call_expands_using_global_binding() {
        let global = Environment::new();
        // (mac twice (x) (list 'do x x)) -- build the closure by hand since
        // `mac` itself is evaluator-level; here we only exercise macex.
        let params = Value::cons(Value::sym("x"), Value::Nil);
        let body_form = read("(list x x)");
        let closure = Rc::new(ClosureData {
            params,
            body: vec![body_form],
            env: global.clone(),
        });
        global.bind(crate::symbol::intern("list"), Value::Builtin(|args| {
            Ok(Value::from_vec(args.to_vec()))
        }));
        global.bind(crate::symbol::intern("twice"), Value::Macro(closure));

        let expr = read("(twice 5)");
        let expanded = macex(&expr, &global).unwrap();
        assert_eq!(crate::value::write_form(&expanded, true), "(5 5)");
    }
}
