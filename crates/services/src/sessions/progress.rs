use serde::Serialize;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub cursor: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Every question has a selection.
    #[must_use]
    pub fn all_answered(&self) -> bool {
        self.total > 0 && self.unanswered == 0
    }
}
