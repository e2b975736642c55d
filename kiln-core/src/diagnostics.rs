//! Diagnostics context
//!
//! Holds user-facing nag messages and renders program listings for
//! debugging. It is an explicit object owned by whoever hosts the CPU, not
//! process-global state.

use crate::program::Program;
use std::fmt::Write;

/// How long a nag message stays pending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NagKind {
    /// Recorded but never shown
    Silent,
    /// Shown once, then dropped
    Once,
    /// Shown every time nags are collected
    Forever,
}

#[derive(Debug, Clone, PartialEq)]
struct Nag {
    kind: NagKind,
    message: String,
}

#[derive(Debug, Default)]
pub struct DiagnosticsContext {
    nags: Vec<Nag>,
}

impl DiagnosticsContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_nag(&mut self, kind: NagKind, message: impl Into<String>) {
        self.nags.push(Nag {
            kind,
            message: message.into(),
        });
    }

    /// Messages to show now; everything except `Forever` nags is dropped afterwards
    pub fn pending_nags(&mut self) -> Vec<String> {
        let shown = self
            .nags
            .iter()
            .filter(|nag| nag.kind != NagKind::Silent)
            .map(|nag| nag.message.clone())
            .collect();
        self.nags.retain(|nag| nag.kind == NagKind::Forever);
        shown
    }

    pub fn has_pending(&self) -> bool {
        self.nags.iter().any(|nag| nag.kind != NagKind::Silent)
    }

    pub fn teardown(&mut self) {
        self.nags.clear();
    }

    /// Listing of `program` with one row per opcode
    pub fn code_fragment(&self, program: &Program) -> String {
        let mut out = String::from("File                 Line:Col    IP   opcode\n");
        for (ip, inst) in program.instructions.iter().enumerate() {
            let loc = &inst.location;
            let _ = writeln!(
                out,
                "{:<20} {:>5}:{:<4} {:04} {}",
                loc.file, loc.line, loc.column, ip, inst.opcode
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Literal, Opcode};

    #[test]
    fn test_nag_lifetimes() {
        let mut diag = DiagnosticsContext::new();
        diag.add_nag(NagKind::Silent, "hidden");
        diag.add_nag(NagKind::Once, "once");
        diag.add_nag(NagKind::Forever, "forever");
        assert!(diag.has_pending());

        assert_eq!(diag.pending_nags(), vec!["once", "forever"]);
        assert_eq!(diag.pending_nags(), vec!["forever"]);

        diag.teardown();
        assert!(!diag.has_pending());
        assert!(diag.pending_nags().is_empty());
    }

    #[test]
    fn test_code_fragment() {
        let program = Program::from_opcodes("boot.ks", [Opcode::Push(Literal::Int(1)), Opcode::Print]);
        let listing = DiagnosticsContext::new().code_fragment(&program);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("boot.ks"));
        assert!(lines[1].contains("0000 push 1"));
        assert!(lines[2].ends_with("0001 print"));
    }
}
