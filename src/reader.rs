// ABOUTME: Reader module - lexer and recursive-descent parser for source text

use crate::error::ArcError;
use crate::value::Value;
use nom::bytes::complete::take_while1;
use nom::IResult;
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// Holds doc comments (`;;;`) that precede a top-level expression, for
    /// whatever loads the bundled standard library to pick up.
    static PENDING_DOCS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

pub fn take_pending_docs() -> Vec<String> {
    PENDING_DOCS.with(|d| std::mem::take(&mut *d.borrow_mut()))
}

#[derive(Debug, Clone)]
enum Token<'a> {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Quote,
    Quasiquote,
    Unquote,
    UnquoteSplicing,
    Str(Vec<u8>),
    CharLit(u8),
    Atom(&'a str),
}

fn is_delimiter(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\r' | '\n' | '(' | ')' | '[' | ']' | ';' | '\'' | '`' | ',' | '"'
    )
}

fn skip_ws_and_comments(mut s: &str) -> &str {
    loop {
        let trimmed = s.trim_start_matches([' ', '\t', '\r', '\n']);
        if trimmed.starts_with(';') {
            let mut docs = Vec::new();
            let mut rest = trimmed;
            while rest.starts_with(';') {
                let line_end = rest.find('\n').unwrap_or(rest.len());
                let (line, after) = rest.split_at(line_end);
                if let Some(doc) = line.strip_prefix(";;;") {
                    docs.push(doc.trim().to_string());
                }
                rest = after;
            }
            if !docs.is_empty() {
                PENDING_DOCS.with(|d| d.borrow_mut().extend(docs));
            }
            s = rest;
            continue;
        }
        if trimmed.len() == s.len() {
            return trimmed;
        }
        s = trimmed;
    }
}

fn lex_atom_token(s: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !is_delimiter(c))(s)
}

/// Scans a double-quoted string body starting just past the opening `"`.
/// Backslash escapes one character; `\r \n \t` map to their control bytes,
/// every other escaped byte passes through literally (§4.1). An unescaped
/// closing quote ends the string; running out of input first is an
/// `unterminated-input` signal, not a syntax error.
fn lex_string(s: &str) -> Result<(Vec<u8>, &str), ArcError> {
    let bytes = s.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    loop {
        if i >= bytes.len() {
            return Err(ArcError::UnterminatedInput);
        }
        match bytes[i] {
            b'"' => return Ok((out, &s[i + 1..])),
            b'\\' => {
                i += 1;
                if i >= bytes.len() {
                    return Err(ArcError::UnterminatedInput);
                }
                let mapped = match bytes[i] {
                    b'r' => b'\r',
                    b'n' => b'\n',
                    b't' => b'\t',
                    other => other,
                };
                out.push(mapped);
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
}

const NAMED_CHARS: &[(&str, u8)] = &[
    ("nul", 0),
    ("return", b'\r'),
    ("newline", b'\n'),
    ("tab", b'\t'),
    ("space", b' '),
];

/// `s` is the text following `#`; a character literal must start with `\`.
/// Recognizes the five named forms and the single-character form `#\X`.
fn lex_char_literal(s: &str) -> Result<(u8, &str), ArcError> {
    let rest = s.strip_prefix('\\').ok_or(ArcError::Syntax)?;
    for (name, byte) in NAMED_CHARS {
        if let Some(after) = rest.strip_prefix(name) {
            let boundary_ok = after.is_empty()
                || after.starts_with(|c: char| is_delimiter(c) || c.is_whitespace());
            if boundary_ok {
                return Ok((*byte, after));
            }
        }
    }
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if (c as u32) < 256 => {
            let consumed = c.len_utf8();
            Ok((c as u8, &rest[consumed..]))
        }
        _ => Err(ArcError::Syntax),
    }
}

fn next_token(s: &str) -> Result<Option<(Token<'_>, &str)>, ArcError> {
    let s = skip_ws_and_comments(s);
    if s.is_empty() {
        return Ok(None);
    }
    let mut chars = s.char_indices();
    let (_, first) = chars.next().unwrap();
    let rest = &s[first.len_utf8()..];
    let tok = match first {
        '(' => (Token::LParen, rest),
        ')' => (Token::RParen, rest),
        '[' => (Token::LBracket, rest),
        ']' => (Token::RBracket, rest),
        '\'' => (Token::Quote, rest),
        '`' => (Token::Quasiquote, rest),
        ',' => {
            if let Some(r2) = rest.strip_prefix('@') {
                (Token::UnquoteSplicing, r2)
            } else {
                (Token::Unquote, rest)
            }
        }
        '"' => {
            let (bytes, r2) = lex_string(rest)?;
            (Token::Str(bytes), r2)
        }
        '#' => {
            let (c, r2) = lex_char_literal(rest)?;
            (Token::CharLit(c), r2)
        }
        _ => {
            let (r2, text) = lex_atom_token(s).map_err(|_| ArcError::Syntax)?;
            (Token::Atom(text), r2)
        }
    };
    Ok(Some(tok))
}

/// Reads one S-expression from `input`. Returns `Ok(None)` when nothing
/// but whitespace/comments remains (clean end of a buffer, not an error);
/// `Err(UnterminatedInput)` when a list or string was left open; leaves
/// the cursor positioned just past the parsed expression on success (§9
/// "reader re-entry").
pub fn read_expr(input: &str) -> Result<Option<(Value, &str)>, ArcError> {
    match next_token(input)? {
        None => Ok(None),
        Some((tok, rest)) => parse_from_token(tok, rest).map(Some),
    }
}

/// Reads every top-level expression in `input`.
pub fn read_all(input: &str) -> Result<Vec<Value>, ArcError> {
    let mut rest = input;
    let mut forms = Vec::new();
    while let Some((value, r)) = read_expr(rest)? {
        forms.push(value);
        rest = r;
    }
    Ok(forms)
}

fn parse_from_token<'a>(tok: Token<'a>, rest: &'a str) -> Result<(Value, &'a str), ArcError> {
    match tok {
        Token::LParen => parse_list(rest),
        Token::RParen | Token::RBracket => Err(ArcError::Syntax),
        Token::LBracket => parse_bracket(rest),
        Token::Quote => wrap_reader_macro("quote", rest),
        Token::Quasiquote => wrap_reader_macro("quasiquote", rest),
        Token::Unquote => wrap_reader_macro("unquote", rest),
        Token::UnquoteSplicing => wrap_reader_macro("unquote-splicing", rest),
        Token::Str(bytes) => Ok((Value::Str(Rc::new(RefCell::new(bytes))), rest)),
        Token::CharLit(c) => Ok((Value::Char(c), rest)),
        Token::Atom(text) => Ok((parse_atom_text(text)?, rest)),
    }
}

fn wrap_reader_macro<'a>(name: &str, rest: &'a str) -> Result<(Value, &'a str), ArcError> {
    let (inner, rest2) = match next_token(rest)? {
        None => return Err(ArcError::UnterminatedInput),
        Some((tok, r)) => parse_from_token(tok, r)?,
    };
    Ok((Value::from_vec(vec![Value::sym(name), inner]), rest2))
}

/// `(` ... `)` → proper or improper list (§4.1). A `.` token with at least
/// one preceding element starts an improper tail.
fn parse_list(mut s: &str) -> Result<(Value, &str), ArcError> {
    let mut items = Vec::new();
    let mut tail = Value::Nil;
    loop {
        let (tok, rest) = match next_token(s)? {
            None => return Err(ArcError::UnterminatedInput),
            Some(t) => t,
        };
        match tok {
            Token::RParen => {
                s = rest;
                break;
            }
            Token::Atom(".") if !items.is_empty() => {
                let (tail_value, rest2) = match next_token(rest)? {
                    None => return Err(ArcError::UnterminatedInput),
                    Some((t, r)) => parse_from_token(t, r)?,
                };
                tail = tail_value;
                match next_token(rest2)? {
                    Some((Token::RParen, rest3)) => {
                        s = rest3;
                        break;
                    }
                    None => return Err(ArcError::UnterminatedInput),
                    _ => return Err(ArcError::Syntax),
                }
            }
            _ => {
                let (value, rest2) = parse_from_token(tok, rest)?;
                items.push(value);
                s = rest2;
            }
        }
    }
    let mut result = tail;
    for item in items.into_iter().rev() {
        result = Value::cons(item, result);
    }
    Ok((result, s))
}

/// `[` ... `]` → `(fn (_) ...)` (§4.1).
fn parse_bracket(mut s: &str) -> Result<(Value, &str), ArcError> {
    let mut body = Vec::new();
    loop {
        let (tok, rest) = match next_token(s)? {
            None => return Err(ArcError::UnterminatedInput),
            Some(t) => t,
        };
        match tok {
            Token::RBracket => {
                s = rest;
                break;
            }
            _ => {
                let (value, rest2) = parse_from_token(tok, rest)?;
                body.push(value);
                s = rest2;
            }
        }
    }
    let params = Value::cons(Value::sym("_"), Value::Nil);
    let mut form = vec![Value::sym("fn"), params];
    form.append(&mut body);
    Ok((Value::from_vec(form), s))
}

fn try_parse_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let first = *bytes.first()?;
    if !(first.is_ascii_digit() || first == b'-' || first == b'+' || first == b'.') {
        return None;
    }
    if !bytes.iter().any(u8::is_ascii_digit) {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// The priority order of §4.1: numeric literal, `nil`, infix rewrite, else
/// plain symbol. Strings and characters are already distinct token kinds
/// by the time this runs.
fn parse_atom_text(text: &str) -> Result<Value, ArcError> {
    if text == "." {
        return Ok(Value::sym("."));
    }
    if let Some(n) = try_parse_number(text) {
        return Ok(Value::Num(n));
    }
    if text == "nil" {
        return Ok(Value::Nil);
    }
    if let Some(v) = try_infix_rewrite(text)? {
        return Ok(v);
    }
    Ok(Value::sym(text))
}

/// Scans `text` right-to-left for the first occurrence of `.`, `!`, or `:`
/// and rewrites per the table in §4.1; failing that, checks for a leading
/// `~`. Both sides of an infix split must be non-empty. Each side recurses
/// through the full atom grammar, not just plain-symbol parsing.
fn try_infix_rewrite(text: &str) -> Result<Option<Value>, ArcError> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    for i in (0..len).rev() {
        if matches!(chars[i], '.' | '!' | ':') {
            if i == 0 || i == len - 1 {
                return Err(ArcError::Syntax);
            }
            let left: String = chars[..i].iter().collect();
            let right: String = chars[i + 1..].iter().collect();
            let lv = parse_atom_text(&left)?;
            let rv = parse_atom_text(&right)?;
            let rewritten = match chars[i] {
                '.' => Value::from_vec(vec![lv, rv]),
                '!' => {
                    let quoted = Value::from_vec(vec![Value::sym("quote"), rv]);
                    Value::from_vec(vec![lv, quoted])
                }
                ':' => Value::from_vec(vec![Value::sym("compose"), lv, rv]),
                _ => unreachable!(),
            };
            return Ok(Some(rewritten));
        }
    }
    if len >= 2 && chars[0] == '~' {
        let remainder: String = chars[1..].iter().collect();
        let v = parse_atom_text(&remainder)?;
        return Ok(Some(Value::from_vec(vec![Value::sym("complement"), v])));
    }
    Ok(None)
}
