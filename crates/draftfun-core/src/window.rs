//! Bounded conversation window for generation sessions.
//!
//! The window holds the committed conversation history plus a staging
//! area for the in-flight turn. Staged messages are visible to prompt
//! construction but only enter the history when the turn commits; a
//! failed or cancelled turn discards them, leaving the history exactly
//! as it was.

use std::collections::VecDeque;

use draftfun_types::llm::Message;

/// A bounded FIFO of conversation messages with a staging area.
///
/// The bound caps how many messages a prompt can see. When the
/// committed history exceeds it, the oldest messages are evicted.
#[derive(Debug, Clone)]
pub struct MessageWindow {
    messages: VecDeque<Message>,
    staged: Vec<Message>,
    bound: usize,
}

impl MessageWindow {
    /// Create an empty window with the given bound. A zero bound is
    /// clamped to 1 so a prompt can always see the current request.
    pub fn new(bound: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            staged: Vec::new(),
            bound: bound.max(1),
        }
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Number of committed messages. Staged messages are not counted.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether a turn currently has staged messages.
    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Append a message directly to the committed history, evicting
    /// the oldest messages past the bound.
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        self.evict();
    }

    /// Stage a message for the in-flight turn. It participates in
    /// [`snapshot`](Self::snapshot) but is not committed yet.
    pub fn stage(&mut self, message: Message) {
        self.staged.push(message);
    }

    /// The messages a prompt should see: committed history followed by
    /// staged messages, trimmed to the most recent `bound` entries.
    pub fn snapshot(&self) -> Vec<Message> {
        let combined: Vec<Message> = self
            .messages
            .iter()
            .chain(self.staged.iter())
            .cloned()
            .collect();
        let skip = combined.len().saturating_sub(self.bound);
        combined.into_iter().skip(skip).collect()
    }

    /// Move all staged messages into the committed history, in staging
    /// order, then evict past the bound.
    pub fn commit_staged(&mut self) {
        for message in self.staged.drain(..) {
            self.messages.push_back(message);
        }
        self.evict();
    }

    /// Drop all staged messages, leaving the committed history untouched.
    pub fn discard_staged(&mut self) {
        self.staged.clear();
    }

    /// The most recent committed message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    /// Clear the window, optionally seeding it with one message. Used
    /// when a previously saved artifact is opened for further editing.
    pub fn reset(&mut self, seed: Option<Message>) {
        self.messages.clear();
        self.staged.clear();
        if let Some(message) = seed {
            self.messages.push_back(message);
        }
    }

    fn evict(&mut self) {
        while self.messages.len() > self.bound {
            self.messages.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftfun_types::llm::MessageRole;

    #[test]
    fn test_push_evicts_oldest_past_bound() {
        let mut window = MessageWindow::new(3);
        for i in 0..5 {
            window.push(Message::user(format!("m{i}")));
        }
        assert_eq!(window.len(), 3);
        let snapshot = window.snapshot();
        assert_eq!(snapshot[0].content, "m2");
        assert_eq!(snapshot[2].content, "m4");
    }

    #[test]
    fn test_snapshot_includes_staged() {
        let mut window = MessageWindow::new(5);
        window.push(Message::assistant("artifact-v1"));
        window.stage(Message::user("make it blue"));

        let snapshot = window.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1].role, MessageRole::User);
        assert_eq!(snapshot[1].content, "make it blue");
        // Staged only, not committed.
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_snapshot_trims_to_bound_with_staged() {
        let mut window = MessageWindow::new(2);
        window.push(Message::assistant("a1"));
        window.push(Message::user("u1"));
        window.stage(Message::user("u2"));

        let snapshot = window.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].content, "u1");
        assert_eq!(snapshot[1].content, "u2");
    }

    #[test]
    fn test_commit_staged_applies_in_order() {
        let mut window = MessageWindow::new(5);
        window.push(Message::assistant("a1"));
        window.stage(Message::user("u1"));
        window.commit_staged();

        assert_eq!(window.len(), 2);
        assert!(!window.has_staged());
        assert_eq!(window.last().unwrap().content, "u1");
    }

    #[test]
    fn test_discard_staged_leaves_history_untouched() {
        let mut window = MessageWindow::new(5);
        window.push(Message::assistant("a1"));
        window.stage(Message::user("u1"));
        window.stage(Message::user("u2"));
        window.discard_staged();

        assert_eq!(window.len(), 1);
        assert!(!window.has_staged());
        assert_eq!(window.snapshot().len(), 1);
    }

    #[test]
    fn test_reset_with_seed() {
        let mut window = MessageWindow::new(5);
        window.push(Message::user("u1"));
        window.stage(Message::user("u2"));
        window.reset(Some(Message::assistant("loaded artifact")));

        assert_eq!(window.len(), 1);
        assert!(!window.has_staged());
        assert_eq!(window.last().unwrap().content, "loaded artifact");
    }

    #[test]
    fn test_zero_bound_clamped() {
        let window = MessageWindow::new(0);
        assert_eq!(window.bound(), 1);
    }
}
