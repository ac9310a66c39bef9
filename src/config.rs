// ABOUTME: Version, banner and usage text constants for the CLI/REPL driver

pub const VERSION: &str = "0.31";

pub const WELCOME_MESSAGE: &str = "arcadia";
pub const WELCOME_SUBTITLE: &str = "Arc-family Lisp, interactively";

pub const USAGE_TEXT: &str = "Usage: arcadia [OPTIONS...] [FILES...]
OPTIONS:
-h    print this screen.
-v    print version.

With no FILES, starts an interactive REPL. Each FILE is loaded and
evaluated in order; its top-level forms run against the global
environment before the REPL (or the next file) starts.";
