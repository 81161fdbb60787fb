//! Messenger that records outbound messages instead of calling Telegram

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use channelshop::core::error::{AppError, AppResult};
use channelshop::messaging::{Evidence, Keyboard, Messenger};

/// One recorded outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Copy {
        to_chat: i64,
        evidence: Evidence,
    },
}

/// Records every delivered message; chats marked with [`fail_for`](Self::fail_for)
/// behave like users who blocked the bot.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    unreachable: Mutex<HashSet<i64>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every send to `chat_id` fail from now on.
    pub fn fail_for(&self, chat_id: i64) {
        self.unreachable.lock().unwrap().insert(chat_id);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// Texts delivered to `chat_id`, oldest first.
    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { chat_id: to, text, .. } if to == chat_id => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_text_to(&self, chat_id: i64) -> Option<String> {
        self.texts_to(chat_id).pop()
    }

    /// Keyboard of the last message to `chat_id` that carried one.
    pub fn last_keyboard_to(&self, chat_id: i64) -> Option<Keyboard> {
        self.sent().into_iter().rev().find_map(|s| match s {
            Sent::Text {
                chat_id: to,
                keyboard: Some(keyboard),
                ..
            } if to == chat_id => Some(keyboard),
            _ => None,
        })
    }

    pub fn copies_to(&self, chat_id: i64) -> Vec<Evidence> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Copy { to_chat, evidence } if to_chat == chat_id => Some(evidence),
                _ => None,
            })
            .collect()
    }

    fn check_reachable(&self, chat_id: i64) -> AppResult<()> {
        if self.unreachable.lock().unwrap().contains(&chat_id) {
            return Err(AppError::Delivery(format!("Forbidden: bot was blocked by the user {}", chat_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> AppResult<()> {
        self.check_reachable(chat_id)?;
        self.sent.lock().unwrap().push(Sent::Text {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn copy_evidence(&self, to_chat: i64, evidence: &Evidence) -> AppResult<()> {
        self.check_reachable(to_chat)?;
        self.sent.lock().unwrap().push(Sent::Copy {
            to_chat,
            evidence: *evidence,
        });
        Ok(())
    }
}
