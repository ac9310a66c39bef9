// ABOUTME: CLI/REPL driver - file loader and REPL orchestration (§2, §6)

use arc_rs::env::Environment;
use arc_rs::error::{take_last_error_expr, ArcError};
use arc_rs::highlighter::LispHelper;
use arc_rs::{builtins, config, eval, macros, reader, stdlib, value};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use std::rc::Rc;

/// Arguments match §6's CLI contract exactly: no arguments starts the
/// REPL, `-h`/`-v` print usage/version, anything else is a list of
/// source paths to load in order.
#[derive(Parser, Debug)]
#[command(
    name = "arc",
    disable_help_flag = true,
    disable_version_flag = true,
    disable_help_subcommand = true
)]
struct CliArgs {
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[arg(short = 'v', long = "version", action = clap::ArgAction::SetTrue)]
    version: bool,

    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
}

fn main() {
    let args = CliArgs::parse();

    if args.help {
        println!("{}", config::USAGE_TEXT);
        return;
    }
    if args.version {
        println!("{}", config::VERSION);
        return;
    }

    let env = Environment::new();
    builtins::register_builtins(&env);
    if let Err(e) = stdlib::register_stdlib(&env) {
        eprintln!("fatal: bundled standard library failed to load: {}", e);
        std::process::exit(1);
    }

    if args.files.is_empty() {
        run_repl(&env);
        return;
    }

    for path in &args.files {
        if let Err(code) = run_file(path, &env) {
            std::process::exit(code);
        }
    }
}

/// Reads and expand-evaluates every top-level form in `path` against
/// `env`, the same read-expand-eval loop the bundled library is loaded
/// with (§1, §6). A file-open failure reports the path and is the only
/// case the caller should surface as a non-zero exit.
fn run_file(path: &PathBuf, env: &Rc<Environment>) -> Result<(), i32> {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => {
            eprintln!("{}", path.display());
            return Err(1);
        }
    };

    let forms = match reader::read_all(&source) {
        Ok(forms) => forms,
        Err(e) => {
            report_error(&e);
            return Err(1);
        }
    };

    for form in forms {
        if let Err(e) = macros::macex(&form, env).and_then(|expanded| eval::eval(&expanded, env)) {
            report_error(&e);
            return Err(1);
        }
    }
    Ok(())
}

/// Interactive loop: reads a line at a time, using the reader's
/// `unterminated-input` signal (rather than hand-rolled delimiter
/// counting) to decide whether an expression needs another line before
/// it can be parsed (§2, §9 "Reader re-entry").
fn run_repl(env: &Rc<Environment>) {
    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);

    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl = match Editor::with_config(rl_config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("fatal: failed to initialize REPL: {}", e);
            std::process::exit(1);
        }
    };
    rl.set_helper(Some(LispHelper::new()));

    let history_path = ".arc_history";
    let _ = rl.load_history(history_path);

    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "arc> " } else { "  -> " };
        match rl.readline(prompt) {
            Ok(line) => {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);
                consume_buffer(&mut buffer, env);
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                println!("^C");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {}", e);
                break;
            }
        }
    }

    let _ = rl.save_history(history_path);
}

/// Drains as many complete top-level forms as `buffer` currently holds,
/// printing each result (or reporting each error) as it evaluates.
/// Leaves `buffer` holding an in-progress expression on
/// `unterminated-input`, so the next line read gets appended to it
/// rather than starting fresh.
fn consume_buffer(buffer: &mut String, env: &Rc<Environment>) {
    loop {
        match reader::read_expr(buffer) {
            Ok(None) => {
                buffer.clear();
                return;
            }
            Ok(Some((expr, rest))) => {
                let rest = rest.to_string();
                match macros::macex(&expr, env).and_then(|expanded| eval::eval(&expanded, env)) {
                    Ok(v) => println!("{}", value::write_form(&v, true)),
                    Err(e) => report_error(&e),
                }
                *buffer = rest;
                if buffer.trim().is_empty() {
                    buffer.clear();
                    return;
                }
            }
            Err(ArcError::UnterminatedInput) => return,
            Err(e) => {
                report_error(&e);
                buffer.clear();
                return;
            }
        }
    }
}

/// §6/§7: a kind-prefixed report for every error except `User`, which
/// prints just its messages; `ContinuationUnwind` escaping to the driver
/// means its creating `ccc` frame already returned (§3, §9), reported
/// the same way as any other runtime error.
fn report_error(err: &ArcError) {
    if let ArcError::User(messages) = err {
        for message in messages {
            println!("{}", message);
        }
        return;
    }

    let kind = err.kind_name().unwrap_or("continuation-unwind");
    let expr = take_last_error_expr()
        .map(|v| value::write_form(&v, true))
        .unwrap_or_default();
    eprintln!("{} : {}", kind, expr);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_file_reports_missing_path_as_error() {
        let env = Environment::new();
        builtins::register_builtins(&env);
        let result = run_file(&PathBuf::from("/no/such/file/arc-rs-test.arc"), &env);
        assert_eq!(result, Err(1));
    }

    #[test]
    fn run_file_evaluates_every_top_level_form() {
        let dir = std::env::temp_dir().join(format!("arc-rs-main-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("script.arc");
        std::fs::write(&path, "(assign x 1)\n(assign y (+ x 1))\n").unwrap();

        let env = Environment::new();
        builtins::register_builtins(&env);
        stdlib::register_stdlib(&env).unwrap();

        assert_eq!(run_file(&path, &env), Ok(()));
        assert!(matches!(
            env.lookup(&arc_rs::symbol::intern("y")).unwrap(),
            value::Value::Num(n) if n == 2.0
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn consume_buffer_holds_partial_expression_until_closed() {
        let env = Environment::new();
        builtins::register_builtins(&env);

        let mut buffer = String::from("(+ 1");
        consume_buffer(&mut buffer, &env);
        assert_eq!(buffer, "(+ 1");

        buffer.push_str(" 2)");
        consume_buffer(&mut buffer, &env);
        assert!(buffer.is_empty());
    }
}
