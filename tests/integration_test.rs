// ABOUTME: Comprehensive integration tests verifying all features work together

use arc_rs::value::Value;
use arc_rs::{eval_source, reader};

fn num(src: &str) -> f64 {
    match eval_source(src).unwrap() {
        Value::Num(n) => n,
        other => panic!("expected Num, got {:?}", other),
    }
}

fn disp(src: &str) -> String {
    arc_rs::value::write_form(&eval_source(src).unwrap(), true)
}

#[test]
fn factorial_program() {
    let code = r#"
    (assign factorial
      (fn (n)
        (if (< n 2) 1 (* n (factorial (- n 1))))))
    (factorial 5)
    "#;
    assert_eq!(num(code), 120.0);
}

#[test]
fn fibonacci_program() {
    let code = r#"
    (assign fib
      (fn (n)
        (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))))
    (fib 10)
    "#;
    assert_eq!(num(code), 55.0);
}

#[test]
fn higher_order_functions_over_prelude_map1_and_reduce() {
    assert_eq!(
        disp("(map1 (fn (x) (* x 2)) (list 1 2 3))"),
        "(2 4 6)"
    );
    assert_eq!(num("(reduce + (list 1 2 3 4))"), 10.0);
}

#[test]
fn macro_expansion_user_defined() {
    let code = r#"
    (mac my-when (test . body)
      (list 'if test (cons 'do body)))
    (my-when t 42)
    "#;
    assert_eq!(num(code), 42.0);

    let code_false = r#"
    (mac my-when (test . body)
      (list 'if test (cons 'do body)))
    (my-when nil 42)
    "#;
    assert!(eval_source(code_false).unwrap().is_nil());
}

#[test]
fn tail_call_optimization_survives_deep_recursion() {
    let code = r#"
    (assign sum
      (fn (n acc)
        (if (< n 1) acc (sum (- n 1) (+ acc n)))))
    (sum 100000 0)
    "#;
    assert_eq!(num(code), 5000050000.0);
}

#[test]
fn closures_capture_their_defining_environment() {
    let code = r#"
    (assign make-adder (fn (n) (fn (x) (+ x n))))
    (assign add5 (make-adder 5))
    (add5 10)
    "#;
    assert_eq!(num(code), 15.0);
}

#[test]
fn list_operations_round_trip_through_printer() {
    assert_eq!(disp("(cons 1 (cons 2 (cons 3 nil)))"), "(1 2 3)");
    assert_eq!(disp("(car (list 1 2 3))"), "1");
    assert_eq!(disp("(cdr (list 1 2 3))"), "(2 3)");
    assert_eq!(num("(len (list 1 2 3 4))"), 4.0);
}

#[test]
fn quoting_and_quasiquote_substitution() {
    assert_eq!(disp("'(a b c)"), "(a b c)");
    assert_eq!(disp("(assign x 5) `(a ,x c)"), "(a 5 c)");
    assert_eq!(disp("(assign xs (list 2 3)) `(1 ,@xs 4)"), "(1 2 3 4)");
}

#[test]
fn let_and_withs_bindings() {
    assert_eq!(num("(let x 5 (+ x 1))"), 6.0);
    assert_eq!(num("(withs (x 1 y 2) (+ x y))"), 3.0);
}

#[test]
fn complex_nested_expressions() {
    let code = r#"
    (assign compose2 (fn (f g) (fn (x) (f (g x)))))
    (assign inc (fn (x) (+ x 1)))
    (assign double (fn (x) (* x 2)))
    ((compose2 double inc) 3)
    "#;
    assert_eq!(num(code), 8.0);
}

#[test]
fn infix_reader_rewrite_compose_and_complement() {
    let code = r#"
    (assign double (fn (x) (* x 2)))
    (assign addone (fn (x) (+ x 1)))
    (double:addone 5)
    "#;
    assert_eq!(num(code), 12.0);

    let complement_code = r#"
    (assign zero (fn (x) (is x 0)))
    (~zero 1)
    "#;
    assert!(eval_source(complement_code).unwrap().is_truthy());

    let bang_code = r#"
    (assign tbl (table))
    (table-sref tbl 1 'k)
    (tbl!k)
    "#;
    assert_eq!(num(bang_code), 1.0);
}

#[test]
fn predicates_and_logic_macros() {
    assert!(eval_source("(and 1 2 3)").unwrap().is_truthy());
    assert!(!eval_source("(and 1 nil 3)").unwrap().is_truthy());
    assert!(eval_source("(or nil 2)").unwrap().is_truthy());
    assert!(eval_source("(not nil)").unwrap().is_truthy());
    assert!(eval_source("(no '())").unwrap().is_truthy());
}

#[test]
fn arithmetic_operations_including_floored_mod() {
    assert_eq!(num("(+ 1 2 3)"), 6.0);
    assert_eq!(num("(- 10 3 2)"), 5.0);
    assert_eq!(num("(* 2 3 4)"), 24.0);
    assert_eq!(num("(/ 100 5 2)"), 10.0);
    assert_eq!(num("(mod -1 5)"), 4.0);
}

#[test]
fn plus_overloads_strings_and_lists() {
    assert_eq!(disp(r#"(+ "ab" "cd")"#), "\"abcd\"");
    assert_eq!(disp("(+ (list 1 2) (list 3 4))"), "(1 2 3 4)");
}

#[test]
fn quicksort_algorithm() {
    let code = r#"
    (assign filter
      (fn (f xs)
        (if (no xs)
            nil
            (if (f (car xs))
                (cons (car xs) (filter f (cdr xs)))
                (filter f (cdr xs))))))
    (assign qsort
      (fn (xs)
        (if (no xs)
            nil
            (withs (pivot (car xs) rest (cdr xs))
              (+ (qsort (filter (fn (x) (< x pivot)) rest))
                 (+ (list pivot)
                    (qsort (filter (fn (x) (no (< x pivot))) rest))))))))
    (qsort (list 5 3 1 4 2))
    "#;
    assert_eq!(disp(code), "(1 2 3 4 5)");
}

#[test]
fn error_conditions_surface_as_user_errors() {
    let err = eval_source(r#"(err "boom")"#).unwrap_err();
    match err {
        arc_rs::error::ArcError::User(messages) => assert_eq!(messages, vec!["boom".to_string()]),
        other => panic!("expected User error, got {:?}", other),
    }
}

#[test]
fn unbound_symbol_reports_correct_kind() {
    let err = eval_source("this-is-not-bound-anywhere").unwrap_err();
    assert_eq!(err.kind_name(), Some("unbound-symbol"));
}

#[test]
fn multiple_top_level_definitions_share_the_environment() {
    let code = r#"
    (assign a 1)
    (assign b 2)
    (assign c 3)
    (+ a b c)
    "#;
    assert_eq!(num(code), 6.0);
}

#[test]
fn do_sequences_side_effects_and_returns_last() {
    let code = r#"
    (assign log nil)
    (do (assign log (cons 1 log)) (assign log (cons 2 log)) (car log))
    "#;
    assert_eq!(num(code), 2.0);
}

#[test]
fn call_cc_escapes_to_its_catch_point() {
    let code = r#"
    (+ 1 (ccc (fn (k) (do (k 10) 999))))
    "#;
    assert_eq!(num(code), 11.0);
}

#[test]
fn table_values_are_callable_as_functions() {
    let code = r#"
    (assign tbl (table))
    (table-sref tbl 42 'answer)
    (tbl 'answer)
    "#;
    assert_eq!(num(code), 42.0);
}

#[test]
fn destructuring_and_optional_parameters() {
    assert_eq!(num("((fn ((a b)) (+ a b)) (list 1 2))"), 3.0);
    assert_eq!(num("((fn (a (o b 10)) (+ a b)) 1)"), 11.0);
    assert_eq!(num("((fn (a (o b 10)) (+ a b)) 1 2)"), 3.0);
}

#[test]
fn symbol_identity_is_preserved_across_reads() {
    let a = reader::read_expr("foo").unwrap().unwrap().0;
    let b = reader::read_expr("foo").unwrap().unwrap().0;
    assert!(a.is_identical(&b));
}

#[test]
fn bracket_fn_sugar_desugars_to_single_arg_lambda() {
    assert_eq!(num("([+ _ 1] 41)"), 42.0);
}
