//! Thread messages and reply selection.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, RunId};

/// Citation marker the knowledge index appends to grounded answers.
pub const CITATION_MARKER: &str = "【0:knowledge.txt†source】";

/// Who authored a thread message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A message read back from a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub id: MessageId,
    pub role: MessageRole,
    /// Run that produced the message; absent for user messages.
    pub run_id: Option<RunId>,
    /// First text block of the message, empty if it has none.
    pub text: String,
}

/// Finds the assistant reply produced by `run_id`.
///
/// `messages` must be newest first, so the first hit is the most recent reply.
pub fn select_reply<'a>(messages: &'a [ThreadMessage], run_id: &RunId) -> Option<&'a ThreadMessage> {
    messages
        .iter()
        .find(|m| m.role == MessageRole::Assistant && m.run_id.as_ref() == Some(run_id))
}

/// Removes every citation marker from `text`.
pub fn strip_citations(text: &str) -> String {
    text.replace(CITATION_MARKER, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, role: MessageRole, run: Option<&str>, text: &str) -> ThreadMessage {
        ThreadMessage {
            id: MessageId::new(id).unwrap(),
            role,
            run_id: run.map(|r| RunId::new(r).unwrap()),
            text: text.to_string(),
        }
    }

    #[test]
    fn strips_marker() {
        let text = format!("Our hours are 9-5.{}", CITATION_MARKER);
        assert_eq!(strip_citations(&text), "Our hours are 9-5.");
    }

    #[test]
    fn strips_every_occurrence() {
        let text = format!("A{m} B{m}", m = CITATION_MARKER);
        assert_eq!(strip_citations(&text), "A B");
    }

    #[test]
    fn text_without_marker_is_unchanged() {
        assert_eq!(strip_citations("plain reply"), "plain reply");
        assert_eq!(strip_citations(""), "");
    }

    #[test]
    fn other_citations_are_kept() {
        let text = "see 【1:other.txt†source】";
        assert_eq!(strip_citations(text), text);
    }

    #[test]
    fn select_reply_matches_run_and_role() {
        let run = RunId::new("run_2").unwrap();
        let messages = vec![
            message("m4", MessageRole::Assistant, Some("run_2"), "newest"),
            message("m3", MessageRole::Assistant, Some("run_2"), "older"),
            message("m2", MessageRole::User, None, "question"),
            message("m1", MessageRole::Assistant, Some("run_1"), "previous run"),
        ];

        let reply = select_reply(&messages, &run).unwrap();
        assert_eq!(reply.text, "newest");
    }

    #[test]
    fn select_reply_ignores_other_runs() {
        let run = RunId::new("run_9").unwrap();
        let messages = vec![
            message("m2", MessageRole::User, None, "question"),
            message("m1", MessageRole::Assistant, Some("run_1"), "previous run"),
        ];

        assert!(select_reply(&messages, &run).is_none());
    }
}
