//! User-facing progress reporting.
//!
//! Components that narrate long operations (installer, updater, inference
//! manager) take a `&dyn Reporter` at construction instead of sharing a
//! global logger. The CLI passes a [`Console`]; daemon handlers pass an
//! [`crate::daemon::OpLog`] so the same lines end up in the API response.

use console::style;

pub trait Reporter: Send + Sync {
    fn info(&self, msg: &str);
    fn success(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
    fn debug(&self, msg: &str);
}

/// Colored terminal reporter. `verbose` gates debug lines; `silent` drops
/// everything (used when another sink owns the narration).
pub struct Console {
    verbose: bool,
    silent: bool,
}

impl Console {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            silent: false,
        }
    }

    pub fn silent() -> Self {
        Self {
            verbose: false,
            silent: true,
        }
    }
}

impl Reporter for Console {
    fn info(&self, msg: &str) {
        if self.silent {
            return;
        }
        println!("{msg}");
    }

    fn success(&self, msg: &str) {
        if self.silent {
            return;
        }
        println!("{} {msg}", style("✓").green());
    }

    fn warn(&self, msg: &str) {
        if self.silent {
            return;
        }
        eprintln!("{} {msg}", style("⚠").yellow());
    }

    fn error(&self, msg: &str) {
        if self.silent {
            return;
        }
        eprintln!("{} {msg}", style("✗").red());
    }

    fn debug(&self, msg: &str) {
        if self.silent || !self.verbose {
            return;
        }
        println!("{} {msg}", style("[debug]").cyan());
    }
}
