//! Outbound messaging seam.
//!
//! The order engine, arbitration and release scheduler talk to users only
//! through [`Messenger`]; they have zero teloxide dependency. The Telegram
//! implementation lives in `telegram::messenger`.

use async_trait::async_trait;

use crate::core::error::AppResult;

/// An inline button: either a callback payload or an external URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    Callback { label: String, data: String },
    Url { label: String, url: String },
}

impl Button {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Button::Callback {
            label: label.into(),
            data: data.into(),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Button::Url {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    /// Iterates over the callback payloads of every button.
    pub fn callback_data(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().filter_map(|b| match b {
            Button::Callback { data, .. } => Some(data.as_str()),
            Button::Url { .. } => None,
        })
    }
}

/// A buyer message (photo or document) submitted as proof of payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evidence {
    pub chat_id: i64,
    pub message_id: i32,
}

/// Delivers text and evidence to users and the operator.
///
/// Implementations must be cheap to share behind an `Arc`.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends `text` to `chat_id`, optionally with inline buttons.
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> AppResult<()>;

    /// Copies the evidence message verbatim into `to_chat`.
    async fn copy_evidence(&self, to_chat: i64, evidence: &Evidence) -> AppResult<()>;
}
