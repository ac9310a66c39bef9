//! Filesystem and process (§4.5, supplemented from `original_source/
//! arc.cpp`'s `builtin_infile`/`builtin_outfile`/`builtin_mvfile`/
//! `builtin_rmfile`/`builtin_dir`/`builtin_dir_exists`/
//! `builtin_file_exists`/`builtin_ensure_dir`/`builtin_pipe_from`/
//! `builtin_system`): these open real OS resources and are not
//! sandboxed, matching the reference interpreter.

use super::{str_to_string, truthy_bool};
use crate::error::ArcError;
use crate::value::{InputHandle, InputPort, OutputPort, Value};
use lisp_macros::builtin;
use std::cell::RefCell;
use std::io::BufReader;
use std::process::{Command, Stdio};
use std::rc::Rc;

/// Runs `command` through the platform shell; returns its exit code.
#[builtin(name = "system")]
pub fn builtin_system(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() != 1 {
        return Err(ArcError::WrongArgCount);
    }
    let cmd = str_to_string(&args[0])?;
    let status = Command::new("/bin/sh")
        .arg("-c")
        .arg(&cmd)
        .status()
        .map_err(|_| ArcError::File)?;
    Ok(Value::Num(status.code().unwrap_or(-1) as f64))
}

/// Opens a file for reading.
#[builtin(name = "infile")]
pub fn builtin_infile(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() != 1 {
        return Err(ArcError::WrongArgCount);
    }
    let path = str_to_string(&args[0])?;
    let file = std::fs::File::open(&path).map_err(|_| ArcError::File)?;
    Ok(Value::Input(Rc::new(RefCell::new(InputHandle::new(
        InputPort::File(BufReader::new(file)),
    )))))
}

/// Opens a file for writing, truncating any existing contents.
#[builtin(name = "outfile")]
pub fn builtin_outfile(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() != 1 {
        return Err(ArcError::WrongArgCount);
    }
    let path = str_to_string(&args[0])?;
    let file = std::fs::File::create(&path).map_err(|_| ArcError::File)?;
    Ok(Value::Output(Rc::new(RefCell::new(OutputPort::File(file)))))
}

/// Closes one or more ports; a no-op here beyond type-checking, since
/// the underlying handle is released once its last reference drops.
#[builtin(name = "close")]
pub fn builtin_close(args: &[Value]) -> Result<Value, ArcError> {
    if args.is_empty() {
        return Err(ArcError::WrongArgCount);
    }
    for a in args {
        match a {
            Value::Input(_) | Value::Output(_) => {}
            _ => return Err(ArcError::WrongType),
        }
    }
    Ok(Value::Nil)
}

/// Opens an input port reading the standard output of `command`, run
/// through the platform shell.
#[builtin(name = "pipe-from")]
pub fn builtin_pipe_from(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() != 1 {
        return Err(ArcError::WrongArgCount);
    }
    let cmd = str_to_string(&args[0])?;
    let mut child = Command::new("/bin/sh")
        .arg("-c")
        .arg(&cmd)
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|_| ArcError::File)?;
    let stdout = child.stdout.take().ok_or(ArcError::File)?;
    Ok(Value::Input(Rc::new(RefCell::new(InputHandle::new(
        InputPort::Pipe {
            child,
            reader: BufReader::new(stdout),
        },
    )))))
}

/// Renames (moves) a file.
#[builtin(name = "mvfile")]
pub fn builtin_mvfile(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() != 2 {
        return Err(ArcError::WrongArgCount);
    }
    let from = str_to_string(&args[0])?;
    let to = str_to_string(&args[1])?;
    std::fs::rename(&from, &to).map_err(|_| ArcError::File)?;
    Ok(Value::Nil)
}

/// Removes a file.
#[builtin(name = "rmfile")]
pub fn builtin_rmfile(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() != 1 {
        return Err(ArcError::WrongArgCount);
    }
    let path = str_to_string(&args[0])?;
    std::fs::remove_file(&path).map_err(|_| ArcError::File)?;
    Ok(Value::Nil)
}

/// Lists a directory's entries as a list of path strings.
#[builtin(name = "dir")]
pub fn builtin_dir(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() != 1 {
        return Err(ArcError::WrongArgCount);
    }
    let path = str_to_string(&args[0])?;
    if path.is_empty() {
        return Err(ArcError::File);
    }
    let entries = std::fs::read_dir(&path).map_err(|_| ArcError::File)?;
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|_| ArcError::File)?;
        out.push(Value::str_from(&entry.path().to_string_lossy()));
    }
    Ok(Value::from_vec(out))
}

/// True if `path` exists and is a directory.
#[builtin(name = "dir-exists")]
pub fn builtin_dir_exists(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() != 1 {
        return Err(ArcError::WrongArgCount);
    }
    let path = str_to_string(&args[0])?;
    if path.is_empty() {
        return Err(ArcError::File);
    }
    Ok(truthy_bool(std::path::Path::new(&path).is_dir()))
}

/// True if `path` exists and is a regular file.
#[builtin(name = "file-exists")]
pub fn builtin_file_exists(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() != 1 {
        return Err(ArcError::WrongArgCount);
    }
    let path = str_to_string(&args[0])?;
    if path.is_empty() {
        return Err(ArcError::File);
    }
    Ok(truthy_bool(std::path::Path::new(&path).is_file()))
}

/// Creates `path` (and any missing parents) if it doesn't already exist.
#[builtin(name = "ensure-dir")]
pub fn builtin_ensure_dir(args: &[Value]) -> Result<Value, ArcError> {
    if args.len() != 1 {
        return Err(ArcError::WrongArgCount);
    }
    let path = str_to_string(&args[0])?;
    if path.is_empty() {
        return Err(ArcError::File);
    }
    std::fs::create_dir_all(&path).map_err(|_| ArcError::File)?;
    Ok(Value::Nil)
}

pub fn register(env: &std::rc::Rc<crate::env::Environment>) {
    register_builtin_system(env);
    register_builtin_infile(env);
    register_builtin_outfile(env);
    register_builtin_close(env);
    register_builtin_pipe_from(env);
    register_builtin_mvfile(env);
    register_builtin_rmfile(env);
    register_builtin_dir(env);
    register_builtin_dir_exists(env);
    register_builtin_file_exists(env);
    register_builtin_ensure_dir(env);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_exists_is_false_for_missing_path() {
        let result = builtin_file_exists(&[Value::str_from("/no/such/path/arc-rs-test")]).unwrap();
        assert!(!result.is_truthy());
    }

    #[test]
    fn dir_exists_is_true_for_tmp() {
        let result = builtin_dir_exists(&[Value::str_from("/tmp")]).unwrap();
        assert!(result.is_truthy());
    }

    #[test]
    fn close_type_checks_its_arguments() {
        assert!(builtin_close(&[Value::Num(1.0)]).is_err());
    }
}
