//! Fixed-width context window fed to the scorer

use super::vocab::UNK_ID;

/// Number of token ids the scorer sees per step
pub const CONTEXT_WIDTH: usize = 23;

/// Exactly `CONTEXT_WIDTH` ids: left-padded with the unknown id, or the
/// most recent ids when the history is longer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextWindow {
    ids: [u32; CONTEXT_WIDTH],
}

impl ContextWindow {
    pub fn from_tail(history: &[u32]) -> Self {
        let mut ids = [UNK_ID; CONTEXT_WIDTH];
        let tail = &history[history.len().saturating_sub(CONTEXT_WIDTH)..];
        ids[CONTEXT_WIDTH - tail.len()..].copy_from_slice(tail);
        ContextWindow { ids }
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
