use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest answer excerpt carried into the transcript.
const ANSWER_PREVIEW_CHARS: usize = 200;

/// Char-safe truncation with a trailing ellipsis; never splits a multibyte
/// character.
pub fn safe_truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            asked_at: Utc::now(),
        }
    }
}

/// Fixed-capacity FIFO of conversation turns, owned by a single session.
/// Capacity is the only eviction trigger; there is no time-based expiry and
/// the buffer is not persisted.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl ConversationContext {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        if self.capacity == 0 {
            return;
        }
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Bounded transcript of the retained turns, oldest first, answers
    /// truncated to a preview.
    #[must_use]
    pub fn render(&self) -> String {
        if self.turns.is_empty() {
            return String::new();
        }

        let mut transcript = String::from("=== Conversation History ===\n");
        for turn in &self.turns {
            transcript.push_str(&format!(
                "User: {}\nAssistant: {}\n\n",
                turn.question,
                safe_truncate_ellipsis(&turn.answer, ANSWER_PREVIEW_CHARS)
            ));
        }
        transcript
    }

    /// Prefix a query with the transcript for context-aware retrieval.
    /// Passes the query through untouched when there is no history.
    #[must_use]
    pub fn prefix_query(&self, query: &str) -> String {
        if self.turns.is_empty() {
            query.to_string()
        } else {
            format!("{}\nCurrent Question: {}", self.render(), query)
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }
}
