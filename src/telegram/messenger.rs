//! [`Messenger`] backed by the Telegram Bot API.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId};

use crate::core::error::AppResult;
use crate::messaging::{Button, Evidence, Keyboard, Messenger};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Converts transport-neutral buttons into an inline keyboard.
pub fn inline_keyboard(keyboard: &Keyboard) -> AppResult<InlineKeyboardMarkup> {
    let mut rows = Vec::with_capacity(keyboard.rows.len());
    for row in &keyboard.rows {
        let mut buttons = Vec::with_capacity(row.len());
        for button in row {
            buttons.push(match button {
                Button::Callback { label, data } => InlineKeyboardButton::callback(label.clone(), data.clone()),
                Button::Url { label, url } => InlineKeyboardButton::url(label.clone(), url::Url::parse(url)?),
            });
        }
        rows.push(buttons);
    }
    Ok(InlineKeyboardMarkup::new(rows))
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> AppResult<()> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(inline_keyboard(keyboard)?);
        }
        request.await?;
        Ok(())
    }

    async fn copy_evidence(&self, to_chat: i64, evidence: &Evidence) -> AppResult<()> {
        self.bot
            .copy_message(ChatId(to_chat), ChatId(evidence.chat_id), MessageId(evidence.message_id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_rows_and_buttons() {
        let keyboard = Keyboard::new(vec![
            vec![Button::callback("PIX", "pay_pix")],
            vec![Button::url("Support", "https://t.me/support")],
        ]);
        let markup = inline_keyboard(&keyboard).unwrap();
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0][0].text, "PIX");
    }

    #[test]
    fn invalid_url_is_an_error() {
        let keyboard = Keyboard::new(vec![vec![Button::url("Support", "not a url")]]);
        assert!(inline_keyboard(&keyboard).is_err());
    }
}
