// ABOUTME: Tree-walking evaluator with proper tail calls and call/cc

use crate::env::Environment;
use crate::error::{set_last_error_expr, ArcError};
use crate::value::{ClosureData, Value};
use std::cell::Cell;
use std::rc::Rc;

thread_local! {
    /// Monotonically increasing source of `ccc` catch-point identities
    /// (§9: "a distinguished unwind carrying the token and value").
    static NEXT_CONTINUATION_TOKEN: Cell<u64> = const { Cell::new(0) };
}

fn next_continuation_token() -> u64 {
    NEXT_CONTINUATION_TOKEN.with(|c| {
        let v = c.get();
        c.set(v + 1);
        v
    })
}

fn sym_name_is(v: &Value, name: &str) -> bool {
    matches!(v, Value::Sym(s) if s.name() == name)
}

/// Evaluates `expr` in `env`. Special forms and closure application are
/// driven by an explicit loop that rebinds `expr`/`env` in tail position
/// (§4.4 "Tail-call contract") rather than recursing, so chained tail
/// calls do not grow the host stack.
pub fn eval(expr: &Value, env: &Rc<Environment>) -> Result<Value, ArcError> {
    let mut expr = expr.clone();
    let mut env = env.clone();

    loop {
        match &expr {
            Value::Sym(s) => {
                return env.lookup(s).map_err(|e| {
                    set_last_error_expr(expr.clone());
                    e
                });
            }
            Value::Cons(_) => {
                if !expr.is_proper_list() {
                    set_last_error_expr(expr.clone());
                    return Err(ArcError::Syntax);
                }
                let head = expr.car().unwrap();
                let args = expr.cdr().unwrap();

                if let Value::Sym(s) = &head {
                    match s.name() {
                        "quote" => {
                            return args.car().ok_or_else(|| {
                                set_last_error_expr(expr.clone());
                                ArcError::WrongArgCount
                            });
                        }
                        "if" => match eval_if_tail(&args, &env, &expr)? {
                            TailStep::Done(v) => return Ok(v),
                            TailStep::Continue(next) => {
                                expr = next;
                                continue;
                            }
                        },
                        "assign" => {
                            return eval_assign(&args, &env, &expr);
                        }
                        "fn" => {
                            return make_closure(&args, &env, &expr).map(Value::Closure);
                        }
                        "mac" => {
                            return eval_mac(&args, &env, &expr);
                        }
                        "do" => {
                            let forms = args.to_vec().ok_or_else(|| {
                                set_last_error_expr(expr.clone());
                                ArcError::Syntax
                            })?;
                            if forms.is_empty() {
                                return Ok(Value::Nil);
                            }
                            for form in &forms[..forms.len() - 1] {
                                eval(form, &env)?;
                            }
                            expr = forms[forms.len() - 1].clone();
                            continue;
                        }
                        _ => {}
                    }
                }

                let callee = eval(&head, &env)?;
                let mut evaluated_args = Vec::new();
                for a in args.iter_list() {
                    evaluated_args.push(eval(&a, &env)?);
                }

                match callee {
                    Value::Closure(data) => {
                        let call_env = Environment::with_parent(data.env.clone());
                        bind_params(&data.params, &evaluated_args, &call_env).map_err(|e| {
                            set_last_error_expr(expr.clone());
                            e
                        })?;
                        if data.body.is_empty() {
                            return Ok(Value::Nil);
                        }
                        for form in &data.body[..data.body.len() - 1] {
                            eval(form, &call_env)?;
                        }
                        expr = data.body[data.body.len() - 1].clone();
                        env = call_env;
                        continue;
                    }
                    other => {
                        return apply(&other, &evaluated_args).map_err(|e| {
                            set_last_error_expr(expr.clone());
                            e
                        });
                    }
                }
            }
            // Self-evaluating (§4.4: "Non-CONS, non-SYM -> self-evaluating").
            _ => return Ok(expr),
        }
    }
}

enum TailStep {
    Done(Value),
    Continue(Value),
}

/// `if c1 t1 c2 t2 ... e?` (§4.4): odd positions are tests, evaluated in
/// order until one is not NIL, whose following expression is selected in
/// tail position; a trailing odd expression is an else, also tail;
/// falling off the end with no match yields NIL.
fn eval_if_tail(args: &Value, env: &Rc<Environment>, form: &Value) -> Result<TailStep, ArcError> {
    let mut args = args.clone();
    loop {
        if args.is_nil() {
            return Ok(TailStep::Done(Value::Nil));
        }
        let test = args.car().unwrap();
        let rest = args.cdr().unwrap();
        if rest.is_nil() {
            // trailing else
            return Ok(TailStep::Continue(test));
        }
        let test_val = eval(&test, env).map_err(|e| {
            set_last_error_expr(form.clone());
            e
        })?;
        let then = rest.car().unwrap();
        if test_val.is_truthy() {
            return Ok(TailStep::Continue(then));
        }
        args = rest.cdr().unwrap();
    }
}

/// `assign s v` (§4.2, §4.4): evaluate `v`, then walk ancestor frames for
/// an existing binding of `s` and overwrite it, or bind in the current
/// frame if none exists.
fn eval_assign(args: &Value, env: &Rc<Environment>, form: &Value) -> Result<Value, ArcError> {
    let sym = args.car().ok_or_else(|| {
        set_last_error_expr(form.clone());
        ArcError::WrongArgCount
    })?;
    let value_form = args
        .cdr()
        .and_then(|c| c.car())
        .ok_or_else(|| {
            set_last_error_expr(form.clone());
            ArcError::WrongArgCount
        })?;
    let sym = match sym {
        Value::Sym(s) => s,
        _ => {
            set_last_error_expr(form.clone());
            return Err(ArcError::WrongType);
        }
    };
    let value = eval(&value_form, env)?;
    env.assign(sym, value.clone());
    Ok(value)
}

/// `fn params body...` (§4.4): captures the current environment.
fn make_closure(args: &Value, env: &Rc<Environment>, form: &Value) -> Result<Rc<ClosureData>, ArcError> {
    let params = args.car().ok_or_else(|| {
        set_last_error_expr(form.clone());
        ArcError::WrongArgCount
    })?;
    let body = args.cdr().unwrap_or(Value::Nil).to_vec().ok_or_else(|| {
        set_last_error_expr(form.clone());
        ArcError::Syntax
    })?;
    Ok(Rc::new(ClosureData {
        params,
        body,
        env: env.clone(),
    }))
}

/// `mac name params body...` (§4.3, §4.4): builds a closure, retags it as
/// a macro, and binds it in the *global* environment regardless of where
/// the `mac` form lexically appears.
fn eval_mac(args: &Value, env: &Rc<Environment>, form: &Value) -> Result<Value, ArcError> {
    let name = args.car().ok_or_else(|| {
        set_last_error_expr(form.clone());
        ArcError::WrongArgCount
    })?;
    let rest = args.cdr().ok_or_else(|| {
        set_last_error_expr(form.clone());
        ArcError::WrongArgCount
    })?;
    let name_sym = match &name {
        Value::Sym(s) => s.clone(),
        _ => {
            set_last_error_expr(form.clone());
            return Err(ArcError::WrongType);
        }
    };
    let closure = make_closure(&rest, env, form)?;
    env.global().assign(name_sym, Value::Macro(closure));
    Ok(name)
}

/// Binds `params` against `args` in `call_env` per §4.4's "Parameter
/// binding" rules: a symbol captures the whole remaining list; a (possibly
/// improper) list destructures element-wise, with `(o name [default])`
/// marking optional positions whose default is evaluated in the frame
/// being built so it may see earlier parameters.
pub fn bind_params(params: &Value, args: &[Value], call_env: &Rc<Environment>) -> Result<(), ArcError> {
    bind_params_from(params, args, 0, call_env)
}

fn bind_params_from(
    params: &Value,
    args: &[Value],
    mut index: usize,
    call_env: &Rc<Environment>,
) -> Result<(), ArcError> {
    let mut params = params.clone();
    loop {
        match &params {
            Value::Nil => {
                if index < args.len() {
                    return Err(ArcError::WrongArgCount);
                }
                return Ok(());
            }
            Value::Sym(s) => {
                let rest = Value::from_vec(args[index..].to_vec());
                call_env.bind(s.clone(), rest);
                return Ok(());
            }
            Value::Cons(_) => {
                let param = params.car().unwrap();
                let rest_params = params.cdr().unwrap();
                let (present, value) = if index < args.len() {
                    (true, args[index].clone())
                } else {
                    (false, Value::Nil)
                };
                bind_one_param(&param, value, !present, call_env)?;
                index += 1;
                params = rest_params;
            }
            _ => return Err(ArcError::Syntax),
        }
    }
}

fn bind_one_param(
    param: &Value,
    value: Value,
    missing: bool,
    call_env: &Rc<Environment>,
) -> Result<(), ArcError> {
    match param {
        Value::Sym(s) => {
            call_env.bind(s.clone(), value);
            Ok(())
        }
        Value::Cons(_) if sym_name_is(&param.car().unwrap_or(Value::Nil), "o") => {
            let rest = param.cdr().unwrap();
            let name = rest.car().ok_or(ArcError::Syntax)?;
            let name_sym = match name {
                Value::Sym(s) => s,
                _ => return Err(ArcError::WrongType),
            };
            let default_form = rest.cdr().and_then(|c| c.car());
            let bound_value = if missing {
                match default_form {
                    Some(form) => eval(&form, call_env)?,
                    None => Value::Nil,
                }
            } else {
                value
            };
            call_env.bind(name_sym, bound_value);
            Ok(())
        }
        Value::Cons(_) => {
            // Nested destructuring list, e.g. `(a b)`.
            if missing {
                bind_params_from(param, &[], 0, call_env)
            } else if value.is_proper_list() || matches!(value, Value::Cons(_)) {
                let items = value.to_vec();
                match items {
                    Some(v) => bind_params_from(param, &v, 0, call_env),
                    None => Err(ArcError::WrongArgCount),
                }
            } else {
                Err(ArcError::WrongArgCount)
            }
        }
        Value::Nil => {
            if missing || value.is_nil() {
                Ok(())
            } else {
                Err(ArcError::WrongArgCount)
            }
        }
        _ => Err(ArcError::Syntax),
    }
}

/// Applies `callee` to already-evaluated `args`, dispatching by tag
/// (§4.4's "Application by tag of the callee" table). Closures are
/// included here (for `apply`/`maptable`/table-lookup call sites) but the
/// tail-call loop in `eval` bypasses this path for ordinary calls so that
/// closure application in tail position doesn't cost a stack frame.
pub fn apply(callee: &Value, args: &[Value]) -> Result<Value, ArcError> {
    match callee {
        Value::Builtin(f) => f(args),
        Value::Closure(data) => {
            let call_env = Environment::with_parent(data.env.clone());
            bind_params(&data.params, args, &call_env)?;
            let mut result = Value::Nil;
            for form in &data.body {
                result = eval(form, &call_env)?;
            }
            Ok(result)
        }
        Value::Continuation(token) => {
            if args.len() != 1 {
                return Err(ArcError::WrongArgCount);
            }
            Err(ArcError::ContinuationUnwind {
                token: *token,
                value: Box::new(args[0].clone()),
            })
        }
        Value::Str(s) => {
            if args.len() != 1 {
                return Err(ArcError::WrongArgCount);
            }
            let idx = as_index(&args[0])?;
            let bytes = s.borrow();
            Ok(bytes.get(idx).map(|b| Value::Char(*b)).unwrap_or(Value::Nil))
        }
        Value::Cons(_) if callee.is_proper_list() => {
            if args.len() != 1 {
                return Err(ArcError::WrongArgCount);
            }
            let idx = as_index(&args[0])?;
            Ok(callee.iter_list().nth(idx).unwrap_or(Value::Nil))
        }
        Value::Table(t) => {
            if args.is_empty() || args.len() > 2 {
                return Err(ArcError::WrongArgCount);
            }
            let table = t.borrow();
            match table.get(&args[0]) {
                Some(v) => Ok(v.clone()),
                None => Ok(args.get(1).cloned().unwrap_or(Value::Nil)),
            }
        }
        _ => Err(ArcError::NotCallable),
    }
}

fn as_index(v: &Value) -> Result<usize, ArcError> {
    match v {
        Value::Num(n) if *n >= 0.0 => Ok(*n as usize),
        Value::Num(_) => Ok(usize::MAX),
        _ => Err(ArcError::WrongType),
    }
}

/// `ccc f` (§4.4, §9): installs a one-shot catch point keyed by a fresh
/// token and invokes `f` with a continuation closing over that token.
/// Invoking the continuation raises `ArcError::ContinuationUnwind`; this
/// is the only frame that catches it, matching by token. An unwind whose
/// token doesn't match (the creating frame already returned) propagates
/// straight through as a runtime error, per §3's "invoking a continuation
/// whose creating frame has already returned is undefined behavior" (we
/// make it a defined error instead of UB).
pub fn call_cc(f: &Value) -> Result<Value, ArcError> {
    let token = next_continuation_token();
    let k = Value::Continuation(token);
    match apply(f, &[k]) {
        Err(ArcError::ContinuationUnwind { token: t, value }) if t == token => Ok(*value),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_expr;

    fn read(s: &str) -> Value {
        read_expr(s).unwrap().unwrap().0
    }

    fn global_with_builtins() -> Rc<Environment> {
        let env = Environment::new();
        crate::builtins::register_builtins(&env);
        env
    }

    fn run(src: &str) -> Value {
        let env = global_with_builtins();
        let expr = read(src);
        eval(&expr, &env).unwrap()
    }

    #[test]
    fn self_evaluating_values() {
        assert!(matches!(run("42"), Value::Num(n) if n == 42.0));
        assert!(run("nil").is_nil());
    }

    #[test]
    fn quote_returns_unevaluated() {
        assert_eq!(crate::value::write_form(&run("'(a b)"), true), "(a b)");
    }

    #[test]
    fn if_chain_picks_first_truthy_branch() {
        assert!(matches!(run("(if nil 1 nil 2 3)"), Value::Num(n) if n == 3.0));
        assert!(run("(if nil 1 nil 2)").is_nil());
    }

    #[test]
    fn assign_creates_global_binding_and_overwrites_it() {
        let env = global_with_builtins();
        eval(&read("(assign x 1)"), &env).unwrap();
        assert!(matches!(eval(&read("x"), &env).unwrap(), Value::Num(n) if n == 1.0));
        eval(&read("(assign x 2)"), &env).unwrap();
        assert!(matches!(eval(&read("x"), &env).unwrap(), Value::Num(n) if n == 2.0));
    }

    #[test]
    fn fn_and_do_with_tail_recursion_does_not_overflow() {
        let env = global_with_builtins();
        eval(&read("(assign self (fn (n) (if (is n 0) 'ok (self (- n 1)))))"), &env).unwrap();
        let result = eval(&read("(self 100000)"), &env).unwrap();
        assert!(sym_name_is(&result, "ok"));
    }

    #[test]
    fn destructuring_parameters() {
        assert!(matches!(run("((fn ((a b) c) (+ a b c)) '(1 2) 3)"), Value::Num(n) if n == 6.0));
    }

    #[test]
    fn optional_parameters_with_defaults_referencing_prior_params() {
        assert!(matches!(run("((fn (x (o y 10)) (+ x y)) 5)"), Value::Num(n) if n == 15.0));
        assert!(matches!(run("((fn (x (o y 10)) (+ x y)) 5 1)"), Value::Num(n) if n == 6.0));
    }

    #[test]
    fn macros_receive_unevaluated_arguments() {
        let env = global_with_builtins();
        eval(&read("(mac twice (x) (list '+ x x))"), &env).unwrap();
        let expanded = crate::macros::macex(&read("(twice (do (disp \"!\") 1))"), &env).unwrap();
        // macro got the unevaluated `(do (disp "!") 1)` form twice, not its result
        assert_eq!(
            crate::value::write_form(&expanded, true),
            "(+ (do (disp \"!\") 1) (do (disp \"!\") 1))"
        );
    }

    #[test]
    fn call_cc_escape() {
        let env = global_with_builtins();
        // (+ 1 (ccc (fn (k) (k 10) 99)))
        let k_fn = read("(fn (k) (k 10) 99)");
        let env2 = env.clone();
        let result = call_cc(&eval(&k_fn, &env2).unwrap()).unwrap();
        assert!(matches!(result, Value::Num(n) if n == 10.0));
    }

    #[test]
    fn table_as_function() {
        let env = global_with_builtins();
        eval(&read("(assign t (table))"), &env).unwrap();
        eval(&read("(t 'a 1)"), &env).ok(); // arity mismatch path ignored here
        eval(&read("(table-sref t 1 'a)"), &env).unwrap();
        assert!(matches!(eval(&read("(t 'a)"), &env).unwrap(), Value::Num(n) if n == 1.0));
        assert!(matches!(eval(&read("(t 'b 99)"), &env).unwrap(), Value::Num(n) if n == 99.0));
    }

    #[test]
    fn improper_list_head_is_syntax_error() {
        let env = global_with_builtins();
        let improper = Value::cons(Value::sym("a"), Value::cons(Value::sym("b"), Value::Num(1.0)));
        assert!(matches!(eval(&improper, &env), Err(ArcError::Syntax)));
    }
}
