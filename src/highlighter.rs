// ABOUTME: Syntax highlighter for REPL with color support
// Implements rustyline's Highlighter trait to provide ANSI color codes
// for Lisp syntax elements while preserving display width

use rustyline::Helper;
use rustyline::completion::Completer;
use rustyline::highlight::{Highlighter, CmdKind};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use std::borrow::Cow;
use std::collections::HashSet;

// ANSI color codes (using 3-bit/4-bit colors for maximum terminal compatibility)
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_PARENS: &str = "\x1b[1;34m"; // Bold blue
const COLOR_SPECIAL_FORM: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_BUILTIN: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_BOOLEAN: &str = "\x1b[33m"; // Yellow
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)
const COLOR_QUOTE: &str = "\x1b[1;33m"; // Bold yellow

/// Main highlighter helper for the REPL.
/// Provides syntax-aware color highlighting for the language's surface syntax.
pub struct LispHelper;

impl LispHelper {
    pub fn new() -> Self {
        LispHelper
    }
}

impl Default for LispHelper {
    fn default() -> Self {
        Self::new()
    }
}

// Implement the required rustyline traits
impl Helper for LispHelper {}

impl Completer for LispHelper {
    type Candidate = String;
}

impl Hinter for LispHelper {
    type Hint = String;
}

impl Validator for LispHelper {}

impl Highlighter for LispHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let special_forms = get_special_forms();
        let builtins = get_builtins();

        let highlighted = highlight_line(line, &special_forms, &builtins);

        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true  // Always trigger re-highlighting on character input or cursor movement
    }
}

/// Tokenize a line and apply syntax highlighting
fn highlight_line(
    line: &str,
    special_forms: &HashSet<&'static str>,
    builtins: &HashSet<&'static str>,
) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            // Comments: everything from ; to end of line
            ';' => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() && chars[i] != '\n' {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            // Strings: preserve exact content but colorize
            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;

                let mut found_close = false;
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        result.push(chars[i]);
                        result.push(chars[i + 1]);
                        i += 2;
                    } else if chars[i] == '"' {
                        result.push('"');
                        i += 1;
                        found_close = true;
                        break;
                    } else {
                        result.push(chars[i]);
                        i += 1;
                    }
                }

                result.push_str(COLOR_RESET);
                if !found_close && i > 0 {
                    while i < chars.len() && chars[i] != '\n' {
                        result.push(chars[i]);
                        i += 1;
                    }
                }
            }

            // Characters: #\a, #\space, ...
            '#' if i + 1 < chars.len() && chars[i + 1] == '\\' => {
                let start = i;
                i += 2;
                while i < chars.len() && chars[i].is_alphanumeric() {
                    i += 1;
                }
                let lit: String = chars[start..i].iter().collect();
                result.push_str(COLOR_BOOLEAN);
                result.push_str(&lit);
                result.push_str(COLOR_RESET);
            }

            // Numbers: handle all numeric formats
            '0'..='9' | '.' => {
                let old_i = i;
                if chars[i] == '.' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit() {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                } else if chars[i].is_ascii_digit() {
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    if i < chars.len() && chars[i] == '.' && i + 1 < chars.len() {
                        if chars[i + 1].is_ascii_digit() {
                            i += 1;
                            while i < chars.len() && chars[i].is_ascii_digit() {
                                i += 1;
                            }
                        }
                    }
                } else {
                    result.push(chars[i]);
                    i += 1;
                    continue;
                }

                let num_str: String = chars[old_i..i].iter().collect();
                result.push_str(COLOR_NUMBER);
                result.push_str(&num_str);
                result.push_str(COLOR_RESET);
            }

            // Signed numbers or symbols starting with +/-
            '+' | '-' => {
                if i + 1 < chars.len()
                    && (chars[i + 1].is_ascii_digit()
                        || (chars[i + 1] == '.'
                            && i + 2 < chars.len()
                            && chars[i + 2].is_ascii_digit()))
                {
                    let old_i = i;
                    i += 1;

                    if chars[old_i + 1] == '.' {
                        i += 1;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    } else {
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                        if i < chars.len() && chars[i] == '.' && i + 1 < chars.len() {
                            if chars[i + 1].is_ascii_digit() {
                                i += 1;
                                while i < chars.len() && chars[i].is_ascii_digit() {
                                    i += 1;
                                }
                            }
                        }
                    }

                    let num_str: String = chars[old_i..i].iter().collect();
                    result.push_str(COLOR_NUMBER);
                    result.push_str(&num_str);
                    result.push_str(COLOR_RESET);
                } else {
                    let start = i;
                    while i < chars.len() && !is_delimiter(chars[i]) {
                        i += 1;
                    }

                    let symbol: String = chars[start..i].iter().collect();
                    if builtins.contains(symbol.as_str()) {
                        result.push_str(COLOR_BUILTIN);
                        result.push_str(&symbol);
                        result.push_str(COLOR_RESET);
                    } else {
                        result.push_str(&symbol);
                    }
                }
            }

            // Quote-like special characters
            '\'' | '`' => {
                result.push_str(COLOR_QUOTE);
                result.push(chars[i]);
                i += 1;
                result.push_str(COLOR_RESET);
            }

            // Unquote
            ',' => {
                if i + 1 < chars.len() && chars[i + 1] == '@' {
                    result.push_str(COLOR_QUOTE);
                    result.push(',');
                    result.push('@');
                    i += 2;
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(COLOR_QUOTE);
                    result.push(',');
                    i += 1;
                    result.push_str(COLOR_RESET);
                }
            }

            // Parentheses
            '(' | ')' => {
                result.push_str(COLOR_PARENS);
                result.push(chars[i]);
                i += 1;
                result.push_str(COLOR_RESET);
            }

            // Whitespace
            ' ' | '\t' | '\n' | '\r' => {
                result.push(chars[i]);
                i += 1;
            }

            // Symbols (variables, function names, special forms, etc.)
            _ => {
                let start = i;
                while i < chars.len() && !is_delimiter(chars[i]) {
                    i += 1;
                }

                let symbol: String = chars[start..i].iter().collect();

                if symbol == "nil" || symbol == "t" {
                    result.push_str(COLOR_BOOLEAN);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else if special_forms.contains(symbol.as_str()) {
                    result.push_str(COLOR_SPECIAL_FORM);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else if builtins.contains(symbol.as_str()) {
                    result.push_str(COLOR_BUILTIN);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&symbol);
                }
            }
        }
    }

    result
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')' || c == '"' || c == ';' || c == '\'' || c == '`' || c == ','
}

/// Forms `eval` dispatches on directly rather than treating as a call
/// (§4.3): `quote if assign fn mac do`.
fn get_special_forms() -> HashSet<&'static str> {
    ["quote", "if", "assign", "fn", "mac", "do"]
        .iter()
        .copied()
        .collect()
}

/// Every native operator registered by `builtins::register_builtins` (§4.5).
fn get_builtins() -> HashSet<&'static str> {
    [
        "car", "cdr", "cons", "scar", "scdr", "len",
        "+", "-", "*", "/", "mod", "expt", "log", "sqrt", "sin", "cos", "tan", "trunc",
        "<", ">", "is", "iso",
        "type",
        "disp", "write", "readb", "writeb", "readline", "read", "sread", "flushout",
        "stdin", "stdout", "stderr",
        "system", "infile", "outfile", "close", "pipe-from", "mvfile", "rmfile",
        "dir", "dir-exists", "file-exists", "ensure-dir",
        "string", "newstring", "string-sref", "sym",
        "table", "maptable", "table-sref",
        "coerce", "int",
        "apply", "ccc", "eval", "macex", "load", "err", "bound", "quit", "rand",
    ]
    .iter()
    .copied()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_highlighting() {
        let special_forms = get_special_forms();
        let builtins = get_builtins();

        let highlighted = highlight_line("42", &special_forms, &builtins);
        assert!(highlighted.contains(COLOR_NUMBER));
    }

    #[test]
    fn test_string_highlighting() {
        let special_forms = get_special_forms();
        let builtins = get_builtins();

        let highlighted = highlight_line("\"hello\"", &special_forms, &builtins);
        assert!(highlighted.contains(COLOR_STRING));
    }

    #[test]
    fn test_comment_highlighting() {
        let special_forms = get_special_forms();
        let builtins = get_builtins();

        let highlighted = highlight_line("; this is a comment", &special_forms, &builtins);
        assert!(highlighted.contains(COLOR_COMMENT));
    }

    #[test]
    fn test_special_form_highlighting() {
        let special_forms = get_special_forms();
        let builtins = get_builtins();

        let highlighted = highlight_line("(assign x 5)", &special_forms, &builtins);
        assert!(highlighted.contains(COLOR_SPECIAL_FORM));
        assert!(highlighted.contains(COLOR_PARENS));
    }

    #[test]
    fn test_builtin_function_highlighting() {
        let special_forms = get_special_forms();
        let builtins = get_builtins();

        let highlighted = highlight_line("(+ 1 2)", &special_forms, &builtins);
        assert!(highlighted.contains(COLOR_BUILTIN));
        assert!(highlighted.contains(COLOR_PARENS));
    }

    #[test]
    fn test_nil_and_t_highlighting() {
        let special_forms = get_special_forms();
        let builtins = get_builtins();

        let highlighted = highlight_line("(is x nil)", &special_forms, &builtins);
        assert!(highlighted.contains(COLOR_BOOLEAN));
    }

    #[test]
    fn test_quote_highlighting() {
        let special_forms = get_special_forms();
        let builtins = get_builtins();

        let highlighted = highlight_line("'(1 2 3)", &special_forms, &builtins);
        assert!(highlighted.contains(COLOR_QUOTE));
    }

    #[test]
    fn test_char_literal_highlighting() {
        let special_forms = get_special_forms();
        let builtins = get_builtins();

        let highlighted = highlight_line("#\\a", &special_forms, &builtins);
        assert!(highlighted.contains(COLOR_BOOLEAN));
    }
}
