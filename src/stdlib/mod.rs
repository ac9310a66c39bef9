//! The bundled standard-library source text (§1, §6): a thin shim whose
//! only contract with the core is "provides textual source", loaded
//! verbatim into the global environment before any user code runs.

use crate::env::Environment;
use crate::error::ArcError;
use std::rc::Rc;

/// `prelude.arc` itself: list/predicate helpers and the `and`/`or`/
/// `when`/`unless`/`quasiquote`/`let`/`withs`/`while` macros, built only
/// out of the special forms and native operators the core provides.
const PRELUDE: &str = include_str!("prelude.arc");

/// Reads and evaluates every top-level form of the bundled prelude
/// against `env`, expanding macros as they're defined along the way (so
/// later prelude forms can use macros earlier ones introduced).
pub fn register_stdlib(env: &Rc<Environment>) -> Result<(), ArcError> {
    for form in crate::reader::read_all(PRELUDE)? {
        let expanded = crate::macros::macex(&form, env)?;
        crate::eval::eval(&expanded, env)?;
    }
    Ok(())
}
