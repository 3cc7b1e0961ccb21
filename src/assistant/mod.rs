pub mod gemini;

use async_trait::async_trait;

pub use gemini::GeminiClient;

use crate::models::chat_messages::{self, ChatRole};

/// Number of earlier messages sent along as context.
pub const HISTORY_LIMIT: u64 = 10;
const TITLE_LIMIT: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("{0}")]
    Request(String),
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("response contained no text")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Generative model behind the AI chat.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn reply(&self, history: &[HistoryTurn], message: &str) -> Result<String, AssistantError>;
}

pub fn build_prompt(message: &str) -> String {
    format!("You are SoulTalk AI, a compassionate mental wellness companion.\nUser says: {message}")
}

/// First 50 characters of the opening message, with an ellipsis when cut.
pub fn session_title(message: &str) -> String {
    if message.chars().count() > TITLE_LIMIT {
        let head: String = message.chars().take(TITLE_LIMIT).collect();
        format!("{head}...")
    } else {
        message.to_string()
    }
}

/// Turn the most recent messages (newest first) into chronological history,
/// skipping blank ones.
pub fn build_history(newest_first: Vec<chat_messages::Model>) -> Vec<HistoryTurn> {
    newest_first
        .into_iter()
        .rev()
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| HistoryTurn {
            role: m.role,
            content: m.content,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn message(role: ChatRole, content: &str, minutes_ago: i64) -> chat_messages::Model {
        chat_messages::Model {
            id: Uuid::new_v4(),
            session_id: Uuid::nil(),
            role,
            content: content.to_string(),
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn short_titles_are_kept() {
        assert_eq!(session_title("I feel anxious"), "I feel anxious");
        let exactly_fifty = "a".repeat(50);
        assert_eq!(session_title(&exactly_fifty), exactly_fifty);
    }

    #[test]
    fn long_titles_are_truncated_on_char_boundary() {
        let long = "é".repeat(60);
        let title = session_title(&long);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn history_is_chronological_and_skips_blanks() {
        let newest_first = vec![
            message(ChatRole::Assistant, "How can I help?", 1),
            message(ChatRole::User, "   ", 2),
            message(ChatRole::User, "Hello", 3),
        ];
        let history = build_history(newest_first);
        assert_eq!(
            history,
            vec![
                HistoryTurn { role: ChatRole::User, content: "Hello".into() },
                HistoryTurn { role: ChatRole::Assistant, content: "How can I help?".into() },
            ]
        );
    }

    #[test]
    fn prompt_wraps_message() {
        assert_eq!(
            build_prompt("hi"),
            "You are SoulTalk AI, a compassionate mental wellness companion.\nUser says: hi"
        );
    }
}
