use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::effects::{Effect, HapticPulse};
use crate::models::{ChatMessage, Conversation, MessageRole};

#[derive(Debug, Error, PartialEq)]
pub enum ChatError {
    #[error("No conversation with {0}")]
    UnknownConversation(String),
}

/// `hh:mm AM/PM`, the stamp shown under each bubble
pub fn stamp(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

/// The DMs tab: every conversation plus per-thread drafts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    conversations: Vec<Conversation>,
    drafts: Vec<(String, String)>,
}

impl Inbox {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        Self {
            conversations,
            drafts: Vec::new(),
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn unread_count(&self) -> usize {
        self.conversations.iter().filter(|c| c.unread).count()
    }

    fn find_mut(&mut self, profile_id: &str) -> Result<&mut Conversation, ChatError> {
        self.conversations
            .iter_mut()
            .find(|c| c.profile_id == profile_id)
            .ok_or_else(|| ChatError::UnknownConversation(profile_id.to_string()))
    }

    /// Open a thread, marking it read
    pub fn open(&mut self, profile_id: &str) -> Result<Conversation, ChatError> {
        let conversation = self.find_mut(profile_id)?;
        conversation.unread = false;
        Ok(conversation.clone())
    }

    pub fn draft(&self, profile_id: &str) -> &str {
        self.drafts
            .iter()
            .find(|(id, _)| id == profile_id)
            .map(|(_, text)| text.as_str())
            .unwrap_or("")
    }

    /// Replace the unsent text of a thread, e.g. with an AI proposal
    pub fn set_draft(&mut self, profile_id: &str, text: impl Into<String>) -> Result<(), ChatError> {
        self.find_mut(profile_id)?;
        let text = text.into();
        match self.drafts.iter_mut().find(|(id, _)| id == profile_id) {
            Some((_, draft)) => *draft = text,
            None => self.drafts.push((profile_id.to_string(), text)),
        }
        Ok(())
    }

    /// Append an outgoing message. Blank input is ignored.
    pub fn send(
        &mut self,
        profile_id: &str,
        text: &str,
        now: NaiveTime,
    ) -> Result<Vec<Effect>, ChatError> {
        let conversation = self.find_mut(profile_id)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let time = stamp(now);
        conversation.messages.push(ChatMessage {
            role: MessageRole::Me,
            text: text.to_string(),
            time: time.clone(),
        });
        conversation.last_message = text.to_string();
        conversation.time = time;
        self.drafts.retain(|(id, _)| id != profile_id);

        tracing::debug!("Message sent to {}", profile_id);
        Ok(vec![Effect::Haptic(HapticPulse::LIGHT)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::Catalog;

    fn inbox() -> Inbox {
        Inbox::new(Catalog::seeded().unwrap().conversations)
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_stamp_format() {
        assert_eq!(stamp(at(9, 5)), "09:05 AM");
        assert_eq!(stamp(at(23, 41)), "11:41 PM");
        assert_eq!(stamp(at(12, 0)), "12:00 PM");
    }

    #[test]
    fn test_seeded_inbox() {
        let inbox = inbox();
        assert_eq!(inbox.unread_count(), 1);
        assert!(inbox.conversations()[0]
            .last_message
            .starts_with("Can't wait for our Sesh on Tuesday!"));
    }

    #[test]
    fn test_open_marks_read() {
        let mut inbox = inbox();
        let thread = inbox.open("u2").unwrap();
        assert_eq!(thread.messages.len(), 2);
        assert_eq!(inbox.unread_count(), 0);
    }

    #[test]
    fn test_send_appends_and_clears_draft() {
        let mut inbox = inbox();
        inbox.set_draft("u2", "Friday at the listening bar?").unwrap();

        let effects = inbox.send("u2", "Friday at the listening bar?", at(20, 15)).unwrap();
        assert_eq!(effects, vec![Effect::Haptic(HapticPulse::LIGHT)]);

        let thread = inbox.open("u2").unwrap();
        let last = thread.messages.last().unwrap();
        assert_eq!(last.role, MessageRole::Me);
        assert_eq!(last.time, "08:15 PM");
        assert_eq!(thread.last_message, "Friday at the listening bar?");
        assert_eq!(inbox.draft("u2"), "");
    }

    #[test]
    fn test_blank_send_is_ignored() {
        let mut inbox = inbox();
        let before = inbox.open("u3").unwrap().messages.len();

        assert!(inbox.send("u3", "   ", at(10, 0)).unwrap().is_empty());
        assert_eq!(inbox.open("u3").unwrap().messages.len(), before);
    }

    #[test]
    fn test_unknown_thread() {
        let mut inbox = inbox();
        assert_eq!(
            inbox.send("nobody", "hi", at(10, 0)),
            Err(ChatError::UnknownConversation("nobody".into()))
        );
    }
}
