//! Adapters from Telegram (teloxide) types to dbot_core types.
//! Depends only on teloxide and dbot_core type definitions.

use dbot_core::{Chat, Message, ReplyRef, ToCoreMessage, ToCoreUser, User};

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> ToCoreUser for TelegramUserWrapper<'a> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
        }
    }
}

/// Wraps a teloxide Message for conversion to core [`Message`].
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl<'a> ToCoreMessage for TelegramMessageWrapper<'a> {
    fn to_core(&self) -> Message {
        Message {
            id: self.0.id.to_string(),
            user: self
                .0
                .from
                .as_ref()
                .map(|u| TelegramUserWrapper(u).to_core())
                .unwrap_or_else(|| User {
                    id: 0,
                    username: None,
                    first_name: None,
                    last_name: None,
                }),
            chat: Chat {
                id: self.0.chat.id.0,
                chat_type: format!("{:?}", self.0.chat.kind),
            },
            content: self.0.text().unwrap_or("").to_string(),
            created_at: self.0.date,
            reply_to: self.reply_ref(),
        }
    }
}

impl<'a> TelegramMessageWrapper<'a> {
    /// The replied-to message, if any. Used by /msginfo.
    fn reply_ref(&self) -> Option<ReplyRef> {
        let replied = self.0.reply_to_message()?;
        Some(ReplyRef {
            message_id: replied.id.to_string(),
            user_id: replied.from.as_ref().map(|u| u.id.0 as i64),
            from_bot: replied.from.as_ref().map(|u| u.is_bot).unwrap_or(false),
            content: replied.text().map(|s| s.to_string()),
            created_at: replied.date,
        })
    }
}
