//! Sequence gate for racing rebuilds.
//!
//! When rebuilds can overlap (an import finishing after a newer edit
//! already triggered another derivation), only the result holding the
//! newest token may be applied. Issue a token when starting work, then
//! `admit` it before publishing; a stale token is refused.

/// Opaque proof of when a rebuild started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqToken(u64);

/// Monotonic gate. Each `issue` invalidates all previously issued tokens.
#[derive(Debug, Default)]
pub struct SeqGate {
    newest: u64,
}

impl SeqGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new unit of work; all earlier tokens become stale.
    pub fn issue(&mut self) -> SeqToken {
        self.newest += 1;
        SeqToken(self.newest)
    }

    /// Whether a finished unit of work is still the newest one.
    pub fn admit(&self, token: SeqToken) -> bool {
        token.0 == self.newest
    }
}
