// ABOUTME: Error types for evaluation failures in the Lisp interpreter

use crate::value::Value;
use std::cell::RefCell;
use thiserror::Error;

/// The seven error kinds of §7, plus `NotCallable` for the "anything else"
/// row of §4.4's application-by-tag table. Every fallible internal
/// operation returns `Result<Value, ArcError>`; nothing but the top-level
/// driver (or `ccc`, for `ContinuationUnwind`) ever catches one.
#[derive(Debug, Error, Clone)]
pub enum ArcError {
    #[error("syntax")]
    Syntax,

    #[error("unterminated-input")]
    UnterminatedInput,

    #[error("unbound-symbol")]
    UnboundSymbol,

    #[error("wrong-argument-count")]
    WrongArgCount,

    #[error("wrong-type")]
    WrongType,

    #[error("file")]
    File,

    #[error("not-callable")]
    NotCallable,

    /// Raised by `err`; printed without an internal kind prefix (§6/§7).
    #[error("user")]
    User(Vec<String>),

    /// Not a real error kind: the one-shot call/cc escape (§4.4, §9).
    /// Carries an identity token matching the `ccc` frame that should
    /// catch it, and the value the continuation was invoked with. An
    /// unwind whose token matches no live `ccc` frame propagates to the
    /// driver as a runtime error.
    #[error("continuation-unwind")]
    ContinuationUnwind { token: u64, value: Box<Value> },
}

impl ArcError {
    pub fn user(messages: Vec<String>) -> Self {
        ArcError::User(messages)
    }

    /// The kind name the driver prints before the offending expression
    /// (§6). `User` and `ContinuationUnwind` have no such prefix.
    pub fn kind_name(&self) -> Option<&'static str> {
        match self {
            ArcError::Syntax => Some("syntax"),
            ArcError::UnterminatedInput => Some("unterminated-input"),
            ArcError::UnboundSymbol => Some("unbound-symbol"),
            ArcError::WrongArgCount => Some("wrong-argument-count"),
            ArcError::WrongType => Some("wrong-type"),
            ArcError::File => Some("file"),
            ArcError::NotCallable => Some("not-callable"),
            ArcError::User(_) | ArcError::ContinuationUnwind { .. } => None,
        }
    }
}

thread_local! {
    /// Mirrors arc.cpp's `err_expr` global: the most recently evaluated
    /// sub-expression at the point an error occurred, for driver reporting.
    static LAST_ERROR_EXPR: RefCell<Option<Value>> = RefCell::new(None);
}

pub fn set_last_error_expr(expr: Value) {
    LAST_ERROR_EXPR.with(|slot| *slot.borrow_mut() = Some(expr));
}

pub fn take_last_error_expr() -> Option<Value> {
    LAST_ERROR_EXPR.with(|slot| slot.borrow_mut().take())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_name_matches_error_kinds() {
        assert_eq!(ArcError::Syntax.kind_name(), Some("syntax"));
        assert_eq!(ArcError::UnboundSymbol.kind_name(), Some("unbound-symbol"));
        assert_eq!(ArcError::User(vec!["boom".into()]).kind_name(), None);
    }

    #[test]
    fn last_error_expr_round_trips() {
        set_last_error_expr(Value::Num(1.0));
        assert!(matches!(take_last_error_expr(), Some(Value::Num(n)) if n == 1.0));
        assert!(take_last_error_expr().is_none());
    }
}
