use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to send Telegram message: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("no response from notification channel within {} seconds", .0.as_secs())]
    Timeout(Duration),
}

/// An external delivery channel for plain-text messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<(), NotifyError>;

    fn destination(&self) -> String;
}

const TELEGRAM_SEND_TIMEOUT: Duration = Duration::from_secs(30);

pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(bot_token),
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        let request = self.bot.send_message(self.chat_id, text);
        match tokio::time::timeout(TELEGRAM_SEND_TIMEOUT, request).await {
            Ok(result) => result.map(|_| ()).map_err(NotifyError::from),
            Err(_) => Err(NotifyError::Timeout(TELEGRAM_SEND_TIMEOUT)),
        }
    }

    fn destination(&self) -> String {
        format!("Telegram chat {}", self.chat_id.0)
    }
}

/// Delivery boundary: errors from the channel are logged here and never propagate.
#[derive(Clone)]
pub struct NotificationSink {
    notifier: Arc<dyn Notifier>,
}

impl NotificationSink {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Returns whether the message was delivered.
    pub async fn send(&self, text: &str) -> bool {
        match self.notifier.send_message(text).await {
            Ok(()) => {
                info!("Message sent to {}", self.notifier.destination());
                true
            }
            Err(e) => {
                error!("Failed to deliver message to {}: {}", self.notifier.destination(), e);
                false
            }
        }
    }
}
