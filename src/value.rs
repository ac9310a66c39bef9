// ABOUTME: Value types representing Lisp data structures and expressions

use crate::env::Environment;
use crate::error::ArcError;
use crate::symbol::Symbol;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::{BufReader, Read, Write};
use std::process::Child;
use std::rc::Rc;

pub type BuiltinFn = fn(&[Value]) -> Result<Value, ArcError>;

/// A mutable, shared cons cell: the payload of the `CONS` tag (§3).
pub type ConsCell = Rc<RefCell<(Value, Value)>>;

/// Shared backing storage for `fn`/`mac` (§3: "same shape as CLOSURE,
/// different tag").
pub struct ClosureData {
    /// The parameter list exactly as written: a symbol, or a (possibly
    /// improper) list of symbols / nested lists / `(o name [default])`
    /// forms (§4.4 "Parameter binding").
    pub params: Value,
    pub body: Vec<Value>,
    pub env: Rc<Environment>,
}

/// A readable byte stream: a plain file or the read end of a spawned
/// process's stdout (`INPUT` / `INPUT-PIPE`, §3).
pub enum InputPort {
    Stdin(std::io::Stdin),
    File(BufReader<std::fs::File>),
    Pipe {
        child: Child,
        reader: BufReader<std::process::ChildStdout>,
    },
}

/// An `INPUT`/`INPUT-PIPE` handle together with a queue of S-expressions
/// already parsed out of it but not yet consumed by `read`/`sread`: a
/// `read` call drains an open port's remaining bytes in one pass (§9
/// "reader re-entry" is satisfied at the `Value`-queue level rather than
/// the byte level) so repeated calls on the same port hand back
/// successive top-level forms instead of re-reading from the start.
pub struct InputHandle {
    pub port: InputPort,
    pub pending_forms: std::collections::VecDeque<Value>,
}

impl InputHandle {
    pub fn new(port: InputPort) -> Self {
        InputHandle {
            port,
            pending_forms: std::collections::VecDeque::new(),
        }
    }
}

impl InputPort {
    pub fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        let n = match self {
            InputPort::Stdin(s) => s.read(&mut buf)?,
            InputPort::File(r) => r.read(&mut buf)?,
            InputPort::Pipe { reader, .. } => reader.read(&mut buf)?,
        };
        Ok(if n == 0 { None } else { Some(buf[0]) })
    }

    pub fn read_to_end(&mut self, buf: &mut Vec<u8>) -> std::io::Result<usize> {
        match self {
            InputPort::Stdin(s) => s.read_to_end(buf),
            InputPort::File(r) => r.read_to_end(buf),
            InputPort::Pipe { reader, .. } => reader.read_to_end(buf),
        }
    }

    pub fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        let n = match self {
            InputPort::Stdin(s) => std::io::BufRead::read_line(&mut s.lock(), &mut line)?,
            InputPort::File(r) => std::io::BufRead::read_line(r, &mut line)?,
            InputPort::Pipe { reader, .. } => std::io::BufRead::read_line(reader, &mut line)?,
        };
        if n == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

/// A writable byte stream (`OUTPUT`, §3).
pub enum OutputPort {
    Stdout(std::io::Stdout),
    Stderr(std::io::Stderr),
    File(std::fs::File),
}

impl OutputPort {
    pub fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self {
            OutputPort::Stdout(o) => o.write_all(bytes),
            OutputPort::Stderr(o) => o.write_all(bytes),
            OutputPort::File(f) => f.write_all(bytes),
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        match self {
            OutputPort::Stdout(o) => o.flush(),
            OutputPort::Stderr(o) => o.flush(),
            OutputPort::File(f) => f.flush(),
        }
    }
}

/// The universal value: a tag and a payload (§3). Fifteen variants total,
/// counting `Input`/`InputPipe`/`Output` separately.
#[derive(Clone)]
pub enum Value {
    Nil,
    Cons(ConsCell),
    Sym(Symbol),
    Num(f64),
    Char(u8),
    /// Mutable byte string; `Rc<RefCell<_>>` gives the shared-mutable
    /// semantics §3 requires (`string-sref` mutates through any alias).
    Str(Rc<RefCell<Vec<u8>>>),
    Table(Rc<RefCell<HashMap<Value, Value>>>),
    Builtin(BuiltinFn),
    Closure(Rc<ClosureData>),
    Macro(Rc<ClosureData>),
    Input(Rc<RefCell<InputHandle>>),
    Output(Rc<RefCell<OutputPort>>),
    /// A one-shot escape target (§4.4, §9): the identity token matching
    /// the `ccc` frame that installed the catch point. Invoking it raises
    /// `ArcError::ContinuationUnwind` carrying this token.
    Continuation(u64),
}

impl Value {
    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Cons(Rc::new(RefCell::new((car, cdr))))
    }

    pub fn str_from(s: &str) -> Value {
        Value::Str(Rc::new(RefCell::new(s.as_bytes().to_vec())))
    }

    pub fn sym(name: &str) -> Value {
        Value::Sym(crate::symbol::intern(name))
    }

    /// NIL is the only falsy value (§3).
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// A proper list is a (possibly empty) CONS chain terminated by NIL (§3, GLOSSARY).
    pub fn is_proper_list(&self) -> bool {
        let mut cur = self.clone();
        loop {
            match cur {
                Value::Nil => return true,
                Value::Cons(cell) => {
                    let next = cell.borrow().1.clone();
                    cur = next;
                }
                _ => return false,
            }
        }
    }

    pub fn car(&self) -> Option<Value> {
        match self {
            Value::Cons(cell) => Some(cell.borrow().0.clone()),
            _ => None,
        }
    }

    pub fn cdr(&self) -> Option<Value> {
        match self {
            Value::Cons(cell) => Some(cell.borrow().1.clone()),
            _ => None,
        }
    }

    pub fn iter_list(&self) -> ListIter {
        ListIter {
            cur: self.clone(),
        }
    }

    /// Collects a proper list into a `Vec`. Returns `None` if the value is
    /// not a proper list.
    pub fn to_vec(&self) -> Option<Vec<Value>> {
        if !self.is_proper_list() {
            return None;
        }
        Some(self.iter_list().collect())
    }

    pub fn from_vec(items: Vec<Value>) -> Value {
        let mut result = Value::Nil;
        for item in items.into_iter().rev() {
            result = Value::cons(item, result);
        }
        result
    }

    /// Canonical symbol returned by `type` (§4.5, §15).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "sym",
            Value::Cons(_) => "cons",
            Value::Sym(_) => "sym",
            Value::Num(_) => "num",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Table(_) => "table",
            Value::Builtin(_) => "fn",
            Value::Closure(_) => "fn",
            Value::Macro(_) => "mac",
            Value::Input(handle) => match &handle.borrow().port {
                InputPort::Pipe { .. } => "input-pipe",
                _ => "input",
            },
            Value::Output(_) => "output",
            Value::Continuation(_) => "cons",
        }
    }

    /// Shallow identity (§3: `is`). Distinct from the structural `PartialEq`
    /// impl below, which implements `iso` for use as `TABLE` keys.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Sym(a), Value::Sym(b)) => a == b,
            (Value::Cons(a), Value::Cons(b)) => Rc::ptr_eq(a, b),
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => std::ptr::eq(*a as *const (), *b as *const ()),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Macro(a), Value::Macro(b)) => Rc::ptr_eq(a, b),
            (Value::Input(a), Value::Input(b)) => Rc::ptr_eq(a, b),
            (Value::Output(a), Value::Output(b)) => Rc::ptr_eq(a, b),
            (Value::Continuation(a), Value::Continuation(b)) => a == b,
            _ => false,
        }
    }

    /// Structural equality (§3: `iso`): recurses into CONS, otherwise
    /// falls back to shallow identity.
    pub fn is_structurally_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Cons(a), Value::Cons(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a_car, a_cdr) = a.borrow().clone();
                let (b_car, b_cdr) = b.borrow().clone();
                a_car.is_structurally_equal(&b_car) && a_cdr.is_structurally_equal(&b_cdr)
            }
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            _ => self.is_identical(other),
        }
    }
}

pub struct ListIter {
    cur: Value,
}

impl Iterator for ListIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self.cur.clone() {
            Value::Cons(cell) => {
                let (car, cdr) = cell.borrow().clone();
                self.cur = cdr;
                Some(car)
            }
            _ => None,
        }
    }
}

/// Table-key equality: structural (`iso`), matching arc.h's custom
/// `std::hash<atom>` which walks CONS chains rather than comparing
/// pointers (§15).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.is_structurally_equal(other)
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Value::Nil => 0u8.hash(state),
            Value::Num(n) => {
                1u8.hash(state);
                n.to_bits().hash(state);
            }
            Value::Char(c) => {
                2u8.hash(state);
                c.hash(state);
            }
            Value::Sym(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            Value::Str(s) => {
                4u8.hash(state);
                s.borrow().hash(state);
            }
            Value::Cons(cell) => {
                5u8.hash(state);
                let (car, cdr) = cell.borrow().clone();
                car.hash(state);
                cdr.hash(state);
            }
            Value::Table(t) => {
                6u8.hash(state);
                (Rc::as_ptr(t) as usize).hash(state);
            }
            Value::Builtin(f) => {
                7u8.hash(state);
                (*f as usize).hash(state);
            }
            Value::Closure(c) | Value::Macro(c) => {
                8u8.hash(state);
                (Rc::as_ptr(c) as usize).hash(state);
            }
            Value::Input(p) => {
                9u8.hash(state);
                (Rc::as_ptr(p) as usize).hash(state);
            }
            Value::Output(p) => {
                10u8.hash(state);
                (Rc::as_ptr(p) as usize).hash(state);
            }
            Value::Continuation(t) => {
                11u8.hash(state);
                t.hash(state);
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", write_form(self, true))
    }
}

/// `disp`-form printing (raw strings/characters, §6).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", write_form(self, false))
    }
}

const QUOTE_PREFIXES: &[(&str, &str)] = &[
    ("quote", "'"),
    ("quasiquote", "`"),
    ("unquote", ","),
    ("unquote-splicing", ",@"),
];

/// The shared printer behind `disp` (`write = false`) and `write`
/// (`write = true`), §6.
pub fn write_form(value: &Value, write: bool) -> String {
    let mut out = String::new();
    print_into(value, write, &mut out);
    out
}

fn print_into(value: &Value, write: bool, out: &mut String) {
    match value {
        Value::Nil => out.push_str("nil"),
        Value::Num(n) => out.push_str(&format_number(*n)),
        Value::Sym(s) => out.push_str(s.name()),
        Value::Char(c) => {
            if write {
                out.push_str(&format_char_literal(*c));
            } else {
                out.push(*c as char);
            }
        }
        Value::Str(s) => {
            let bytes = s.borrow();
            if write {
                out.push('"');
                for &b in bytes.iter() {
                    match b {
                        b'"' => out.push_str("\\\""),
                        b'\\' => out.push_str("\\\\"),
                        b'\n' => out.push_str("\\n"),
                        b'\t' => out.push_str("\\t"),
                        b'\r' => out.push_str("\\r"),
                        _ => out.push(b as char),
                    }
                }
                out.push('"');
            } else {
                for &b in bytes.iter() {
                    out.push(b as char);
                }
            }
        }
        Value::Cons(_) => print_list(value, write, out),
        Value::Table(t) => {
            out.push_str("#<table:(");
            let table = t.borrow();
            let mut first = true;
            for (k, v) in table.iter() {
                if !first {
                    out.push(' ');
                }
                first = false;
                out.push('(');
                print_into(k, write, out);
                out.push_str(" . ");
                print_into(v, write, out);
                out.push(')');
            }
            out.push_str(")>");
        }
        Value::Builtin(_) => out.push_str("#<builtin>"),
        Value::Closure(_) => out.push_str("#<fn>"),
        Value::Macro(_) => out.push_str("#<mac>"),
        Value::Input(_) => out.push_str("#<input>"),
        Value::Output(_) => out.push_str("#<output>"),
        Value::Continuation(_) => out.push_str("#<continuation>"),
    }
}

fn print_list(value: &Value, write: bool, out: &mut String) {
    if let (Some(head), Some(rest)) = (value.car(), value.cdr()) {
        if let Value::Sym(s) = &head {
            if let Some(rest_car) = rest.car() {
                if rest.cdr().map(|c| c.is_nil()).unwrap_or(false) {
                    if let Some((_, prefix)) =
                        QUOTE_PREFIXES.iter().find(|(name, _)| *name == s.name())
                    {
                        out.push_str(prefix);
                        print_into(&rest_car, write, out);
                        return;
                    }
                }
            }
        }
    }

    out.push('(');
    let mut cur = value.clone();
    let mut first = true;
    loop {
        match cur {
            Value::Nil => break,
            Value::Cons(cell) => {
                if !first {
                    out.push(' ');
                }
                first = false;
                let (car, cdr) = cell.borrow().clone();
                print_into(&car, write, out);
                cur = cdr;
            }
            other => {
                out.push_str(" . ");
                print_into(&other, write, out);
                break;
            }
        }
    }
    out.push(')');
}

/// Up to 16 significant digits (§6); whole numbers print without a
/// trailing fractional part.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn format_char_literal(c: u8) -> String {
    match c {
        0 => "#\\nul".to_string(),
        b'\r' => "#\\return".to_string(),
        b'\n' => "#\\newline".to_string(),
        b'\t' => "#\\tab".to_string(),
        b' ' => "#\\space".to_string(),
        _ => format!("#\\{}", c as char),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_is_falsy_everything_else_truthy() {
        assert!(!Value::Nil.is_truthy());
        assert!(Value::Num(0.0).is_truthy());
        assert!(Value::str_from("").is_truthy());
    }

    #[test]
    fn proper_vs_improper_lists() {
        let proper = Value::cons(Value::Num(1.0), Value::cons(Value::Num(2.0), Value::Nil));
        assert!(proper.is_proper_list());

        let improper = Value::cons(Value::Num(1.0), Value::cons(Value::Num(2.0), Value::Num(3.0)));
        assert!(!improper.is_proper_list());
    }

    #[test]
    fn improper_list_prints_with_dot() {
        let improper = Value::cons(Value::Num(1.0), Value::cons(Value::Num(2.0), Value::Num(3.0)));
        assert_eq!(write_form(&improper, true), "(1 2 . 3)");
    }

    #[test]
    fn quote_forms_print_with_reader_prefix() {
        let quoted = Value::cons(Value::sym("quote"), Value::cons(Value::sym("a"), Value::Nil));
        assert_eq!(write_form(&quoted, true), "'a");
    }

    #[test]
    fn write_quotes_strings_disp_does_not() {
        let s = Value::str_from("hi\n");
        assert_eq!(write_form(&s, true), "\"hi\\n\"");
        assert_eq!(write_form(&s, false), "hi\n");
    }

    #[test]
    fn identity_vs_structural_equality() {
        let a = Value::cons(Value::Num(1.0), Value::Nil);
        let b = Value::cons(Value::Num(1.0), Value::Nil);
        assert!(!a.is_identical(&b));
        assert!(a.is_structurally_equal(&b));
    }

    #[test]
    fn symbols_are_identical_iff_same_interned_name() {
        let a = Value::sym("foo");
        let b = Value::sym("foo");
        assert!(a.is_identical(&b));
    }

    #[test]
    fn type_name_matches_canonical_set() {
        assert_eq!(Value::cons(Value::Nil, Value::Nil).type_name(), "cons");
        assert_eq!(Value::sym("x").type_name(), "sym");
        assert_eq!(Value::str_from("x").type_name(), "string");
        assert_eq!(Value::Num(1.0).type_name(), "num");
        assert_eq!(Value::Char(b'a').type_name(), "char");
    }
}
