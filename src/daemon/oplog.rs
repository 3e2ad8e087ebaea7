//! Request-scoped log collector for control-plane handlers.

use crate::daemon::protocol::LogEntry;
use crate::report::Reporter;
use chrono::Utc;
use std::sync::Mutex;

const DEFAULT_CAPACITY: usize = 1000;

/// Capacity-bounded collector holding the log lines produced while one API
/// operation runs. Implements [`Reporter`] so the installer/updater narrate
/// into the response envelope instead of a terminal.
pub struct OpLog {
    capacity: usize,
    entries: Mutex<Vec<LogEntry>>,
}

impl OpLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// All captured entries, cloned out in order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().expect("OpLog lock poisoned").clone()
    }

    fn push(&self, level: &str, message: &str) {
        let mut entries = self.entries.lock().expect("OpLog lock poisoned");
        entries.push(LogEntry {
            timestamp: Utc::now(),
            level: level.to_string(),
            message: message.to_string(),
        });
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }
    }
}

impl Default for OpLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for OpLog {
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }

    fn success(&self, msg: &str) {
        self.push("success", msg);
    }

    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }

    fn error(&self, msg: &str) {
        self.push("error", msg);
    }

    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_captured_in_order_with_levels() {
        let log = OpLog::new();
        log.info("starting");
        log.warn("careful");
        log.success("done");

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].level, "info");
        assert_eq!(entries[1].level, "warn");
        assert_eq!(entries[2].message, "done");
    }

    #[test]
    fn capacity_evicts_oldest() {
        let log = OpLog::with_capacity(3);
        for i in 0..5 {
            log.info(&format!("line {i}"));
        }
        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "line 2");
        assert_eq!(entries[2].message, "line 4");
    }
}
