//! I/O (§4.5): `disp` writes display form, `write` writes readable form;
//! `readb`/`writeb` move one byte; `readline` reads one line; `read`/
//! `sread` parse one S-expression from a string or port, returning a
//! caller-specified EOF sentinel at end-of-input. Every built-in here
//! defaults to the standard streams when the port argument is omitted
//! (§4.5, §6).

use crate::error::ArcError;
use crate::value::{InputHandle, InputPort, Value};
use lisp_macros::builtin;
use std::cell::RefCell;
use std::io::Write as _;
use std::rc::Rc;

fn write_out(port: Option<&Value>, bytes: &[u8]) -> Result<(), ArcError> {
    match port {
        None => std::io::stdout().write_all(bytes).map_err(|_| ArcError::File),
        Some(Value::Output(o)) => o.borrow_mut().write_bytes(bytes).map_err(|_| ArcError::File),
        Some(_) => Err(ArcError::WrongType),
    }
}

fn input_handle_or_stdin(port: Option<&Value>) -> Result<Rc<RefCell<InputHandle>>, ArcError> {
    match port {
        None => Ok(Rc::new(RefCell::new(InputHandle::new(InputPort::Stdin(
            std::io::stdin(),
        ))))),
        Some(Value::Input(h)) => Ok(h.clone()),
        Some(_) => Err(ArcError::WrongType),
    }
}

/// Drains one S-expression out of `handle`'s already-parsed queue,
/// refilling the queue by reading the port to its end if empty; returns
/// `eof` once both the queue and the underlying stream are exhausted.
fn read_from_handle(handle: &Rc<RefCell<InputHandle>>, eof: Value) -> Result<Value, ArcError> {
    if let Some(v) = handle.borrow_mut().pending_forms.pop_front() {
        return Ok(v);
    }
    let mut buf = Vec::new();
    handle
        .borrow_mut()
        .port
        .read_to_end(&mut buf)
        .map_err(|_| ArcError::File)?;
    let text: String = buf.iter().map(|&b| b as char).collect();
    let forms = crate::reader::read_all(&text).map_err(|_| ArcError::Syntax)?;
    let mut h = handle.borrow_mut();
    h.pending_forms = forms.into();
    Ok(h.pending_forms.pop_front().unwrap_or(eof))
}

/// Writes the display form of `x` (raw strings/characters, §6); no
/// trailing newline. Defaults to standard output.
#[builtin(name = "disp")]
pub fn builtin_disp(args: &[Value]) -> Result<Value, ArcError> {
    match args.len() {
        0 => Ok(Value::Nil),
        1 => {
            write_out(None, crate::value::write_form(&args[0], false).as_bytes())?;
            Ok(Value::Nil)
        }
        2 => {
            write_out(
                Some(&args[1]),
                crate::value::write_form(&args[0], false).as_bytes(),
            )?;
            Ok(Value::Nil)
        }
        _ => Err(ArcError::WrongArgCount),
    }
}

/// Writes the readable form of `x` (quoted strings, `#\`-prefixed
/// characters, §6). Defaults to standard output.
#[builtin(name = "write")]
pub fn builtin_write(args: &[Value]) -> Result<Value, ArcError> {
    match args.len() {
        0 => Ok(Value::Nil),
        1 => {
            write_out(None, crate::value::write_form(&args[0], true).as_bytes())?;
            Ok(Value::Nil)
        }
        2 => {
            write_out(
                Some(&args[1]),
                crate::value::write_form(&args[0], true).as_bytes(),
            )?;
            Ok(Value::Nil)
        }
        _ => Err(ArcError::WrongArgCount),
    }
}

/// Reads the next byte as a number; -1 at end-of-input. Defaults to
/// standard input.
#[builtin(name = "readb")]
pub fn builtin_readb(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() > 1 {
        return Err(ArcError::WrongArgCount);
    }
    let handle = input_handle_or_stdin(args.first())?;
    let b = handle
        .borrow_mut()
        .port
        .read_byte()
        .map_err(|_| ArcError::File)?;
    Ok(Value::Num(b.map(|x| x as f64).unwrap_or(-1.0)))
}

/// Writes one byte. Defaults to standard output.
#[builtin(name = "writeb")]
pub fn builtin_writeb(args: &[Value]) -> Result<Value, ArcError> {
    if args.is_empty() || args.len() > 2 {
        return Err(ArcError::WrongArgCount);
    }
    let byte = match &args[0] {
        Value::Num(n) => *n as u8,
        Value::Char(c) => *c,
        _ => return Err(ArcError::WrongType),
    };
    write_out(args.get(1), &[byte])?;
    Ok(Value::Nil)
}

/// Reads one line as a string, without the trailing newline; `nil` at
/// end-of-input. Defaults to standard input.
#[builtin(name = "readline")]
pub fn builtin_readline(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() > 1 {
        return Err(ArcError::WrongArgCount);
    }
    let handle = input_handle_or_stdin(args.first())?;
    let line = handle
        .borrow_mut()
        .port
        .read_line()
        .map_err(|_| ArcError::File)?;
    Ok(line.map(|s| Value::str_from(&s)).unwrap_or(Value::Nil))
}

/// Parses one S-expression from a string or input port; returns `eof`
/// (default `nil`) once nothing remains. Defaults to standard input when
/// no source is given.
#[builtin(name = "read")]
pub fn builtin_read(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() > 2 {
        return Err(ArcError::WrongArgCount);
    }
    let eof = args.get(1).cloned().unwrap_or(Value::Nil);
    match args.first() {
        Some(Value::Str(s)) => {
            let text: String = s.borrow().iter().map(|&b| b as char).collect();
            match crate::reader::read_expr(&text).map_err(|_| ArcError::Syntax)? {
                Some((v, _)) => Ok(v),
                None => Ok(eof),
            }
        }
        Some(Value::Input(h)) => read_from_handle(h, eof),
        None => read_from_handle(&input_handle_or_stdin(None)?, eof),
        Some(_) => Err(ArcError::WrongType),
    }
}

/// `read` specialized to a port argument (§4.5).
#[builtin(name = "sread")]
pub fn builtin_sread(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() != 2 {
        return Err(ArcError::WrongArgCount);
    }
    match &args[0] {
        Value::Input(h) => read_from_handle(h, args[1].clone()),
        _ => Err(ArcError::WrongType),
    }
}

/// Flushes standard output.
#[builtin(name = "flushout")]
pub fn builtin_flushout(args: &[Value]) -> Result<Value, ArcError> {
    if !args.is_empty() {
        return Err(ArcError::WrongArgCount);
    }
    std::io::stdout().flush().map_err(|_| ArcError::File)?;
    Ok(Value::sym("t"))
}

pub fn register(env: &std::rc::Rc<crate::env::Environment>) {
    register_builtin_disp(env);
    register_builtin_write(env);
    register_builtin_readb(env);
    register_builtin_writeb(env);
    register_builtin_readline(env);
    register_builtin_read(env);
    register_builtin_sread(env);
    register_builtin_flushout(env);

    // `stdin`/`stdout`/`stderr` are plain global values, not operators
    // (§4.5, arc.cpp's `arc_init`), so they're bound directly rather than
    // through `#[builtin]`.
    env.bind(
        crate::symbol::intern("stdout"),
        Value::Output(Rc::new(RefCell::new(crate::value::OutputPort::Stdout(
            std::io::stdout(),
        )))),
    );
    env.bind(
        crate::symbol::intern("stderr"),
        Value::Output(Rc::new(RefCell::new(crate::value::OutputPort::Stderr(
            std::io::stderr(),
        )))),
    );
    env.bind(
        crate::symbol::intern("stdin"),
        Value::Input(Rc::new(RefCell::new(InputHandle::new(InputPort::Stdin(
            std::io::stdin(),
        ))))),
    );
}
