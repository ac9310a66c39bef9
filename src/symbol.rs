//! Process-wide symbol interning.
//!
//! Symbol identity is pointer identity (§3): interning the same name twice
//! must yield handles that compare equal by pointer, not by string content,
//! so that `(is (sym "a") (sym "a"))` and a literal `a` read twice from
//! source both refer to the same canonical symbol.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

thread_local! {
    static INTERNER: RefCell<HashMap<Rc<str>, Symbol>> = RefCell::new(HashMap::new());
}

/// An interned identifier. Cloning is cheap (an `Rc` bump); equality and
/// hashing are by pointer, never by string content.
#[derive(Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const ()).hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interns `name`, returning the canonical symbol. Entries are never
/// removed: the intern table grows monotonically for the life of the
/// process (§3).
pub fn intern(name: &str) -> Symbol {
    INTERNER.with(|table| {
        let mut table = table.borrow_mut();
        if let Some(sym) = table.get(name) {
            return Symbol(Rc::clone(&sym.0));
        }
        let rc: Rc<str> = Rc::from(name);
        let sym = Symbol(Rc::clone(&rc));
        table.insert(rc, sym.clone());
        sym
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_interns_to_identical_pointer() {
        let a = intern("hello");
        let b = intern("hello");
        assert!(Rc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, b);
    }

    #[test]
    fn different_names_are_distinct() {
        let a = intern("foo");
        let b = intern("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn repeated_interning_does_not_grow_unboundedly_per_call() {
        let first = intern("stable");
        for _ in 0..100 {
            let again = intern("stable");
            assert_eq!(first, again);
        }
    }
}
