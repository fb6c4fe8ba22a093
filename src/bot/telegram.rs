//! Telegram Bot API transport
//!
//! Long-polls `getUpdates`, turns each update into an [`InboundEvent`] and
//! handles it in its own task. Surfaces are drawn with `sendMessage` or
//! `editMessageText` using HTML parse mode and an inline keyboard. The poll
//! offset always moves past every received update, whatever the outcome of
//! handling it, so nothing is redelivered.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::bot::service::{CatalogService, InboundEvent};
use crate::bot::surface::{RenderTarget, Surface};
use crate::types::{JustShakeError, Result};

/// Pause after a failed poll before trying again
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

// ============================================================================
// Transport trait (for dependency injection)
// ============================================================================

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Draw `surface` at `target`
    async fn render(&self, target: &RenderTarget, surface: &Surface) -> Result<()>;

    /// Acknowledge a pressed control, optionally with a pop-up text
    async fn answer(&self, callback_id: &str, alert: Option<&str>) -> Result<()>;
}

// ============================================================================
// Bot API types
// ============================================================================

#[derive(Deserialize, Debug)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<TgUser>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Chat {
    pub id: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TgUser {
    pub id: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TgUser,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Serialize, Debug, PartialEq)]
struct InlineButton<'a> {
    text: &'a str,
    callback_data: &'a str,
}

impl Update {
    /// Event for this update, or `None` for update kinds the bot ignores
    pub fn into_event(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            let message = query.message?;
            return Some(InboundEvent::Control {
                user_id: query.from.id,
                chat_id: message.chat.id,
                message_id: message.message_id,
                callback_id: query.id,
                payload: query.data.unwrap_or_default(),
            });
        }

        let message = self.message?;
        let text = message.text?;
        Some(InboundEvent::Text {
            user_id: message.from.map(|u| u.id).unwrap_or(message.chat.id),
            chat_id: message.chat.id,
            text,
        })
    }
}

fn inline_keyboard(surface: &Surface) -> Vec<Vec<InlineButton<'_>>> {
    surface
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|c| InlineButton {
                    text: &c.label,
                    callback_data: &c.payload,
                })
                .collect()
        })
        .collect()
}

// ============================================================================
// Client
// ============================================================================

pub struct TelegramClient {
    http: reqwest::Client,
    /// `<api url>/bot<token>`; never logged
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(poll_timeout + Duration::from_secs(10))
            .user_agent("justshake-bot/0.1")
            .build()?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let response: ApiResponse<T> = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(&body)
            .send()
            .await
            .map_err(|e| JustShakeError::Transport(format!("{} failed: {}", method, e.without_url())))?
            .json()
            .await
            .map_err(|e| JustShakeError::Transport(format!("{} returned bad body: {}", method, e.without_url())))?;

        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(JustShakeError::Transport(format!(
                "{}: {}",
                method,
                response.description.unwrap_or_else(|| "unknown error".to_string())
            ))),
        }
    }

    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout.as_secs(),
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn render(&self, target: &RenderTarget, surface: &Surface) -> Result<()> {
        let markup = json!({ "inline_keyboard": inline_keyboard(surface) });
        let result: Result<serde_json::Value> = match target.message_id {
            Some(message_id) => {
                self.call(
                    "editMessageText",
                    json!({
                        "chat_id": target.chat_id,
                        "message_id": message_id,
                        "text": surface.text,
                        "parse_mode": "HTML",
                        "reply_markup": markup,
                    }),
                )
                .await
            }
            None => {
                self.call(
                    "sendMessage",
                    json!({
                        "chat_id": target.chat_id,
                        "text": surface.text,
                        "parse_mode": "HTML",
                        "reply_markup": markup,
                    }),
                )
                .await
            }
        };

        match result {
            Ok(_) => Ok(()),
            // Pressing a control that redraws the same surface
            Err(JustShakeError::Transport(msg)) if msg.contains("message is not modified") => {
                debug!(chat_id = target.chat_id, "Surface unchanged");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn answer(&self, callback_id: &str, alert: Option<&str>) -> Result<()> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = alert {
            body["text"] = json!(text);
            body["show_alert"] = json!(true);
        }
        let _: bool = self.call("answerCallbackQuery", body).await?;
        Ok(())
    }
}

// ============================================================================
// Polling loop
// ============================================================================

/// Handle one event and draw the reply
pub async fn dispatch(service: &CatalogService, transport: &dyn ChatTransport, event: InboundEvent) {
    let reply = service.handle(&event).await;

    if let Some(callback_id) = event.callback_id() {
        if let Err(e) = transport.answer(callback_id, reply.alert.as_deref()).await {
            warn!(user_id = event.user_id(), error = %e, "Failed to answer callback");
        }
    }

    if let Err(e) = transport.render(&reply.target, &reply.surface).await {
        error!(user_id = event.user_id(), error = %e, "Failed to render surface");
    }
}

/// Long-poll forever, spawning a task per update
pub async fn run_polling(
    service: Arc<CatalogService>,
    client: Arc<TelegramClient>,
    poll_timeout: Duration,
) {
    info!("Telegram bot polling started");
    let mut offset: i64 = 0;

    loop {
        let updates = match client.get_updates(offset, poll_timeout).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "getUpdates failed, retrying");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let update_id = update.update_id;

            let Some(event) = update.into_event() else {
                debug!(update_id, "Ignoring update");
                continue;
            };

            let service = Arc::clone(&service);
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                dispatch(&service, client.as_ref(), event).await;
            });
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::service::BotSettings;
    use crate::db::{InMemoryCatalogStore, InMemoryUserStore};
    use crate::services::{Catalog, Favorites};
    use crate::session::InMemorySessionCache;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        rendered: Mutex<Vec<(RenderTarget, Surface)>>,
        answered: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn render(&self, target: &RenderTarget, surface: &Surface) -> Result<()> {
            self.rendered.lock().unwrap().push((*target, surface.clone()));
            Ok(())
        }

        async fn answer(&self, callback_id: &str, alert: Option<&str>) -> Result<()> {
            self.answered
                .lock()
                .unwrap()
                .push((callback_id.to_string(), alert.map(str::to_string)));
            Ok(())
        }
    }

    fn service() -> CatalogService {
        let timeout = Duration::from_secs(5);
        CatalogService::new(
            Catalog::new(Arc::new(InMemoryCatalogStore::new()), timeout),
            Favorites::new(Arc::new(InMemoryUserStore::new()), timeout),
            Arc::new(InMemorySessionCache::new()),
            BotSettings::default(),
        )
    }

    #[test]
    fn test_message_update_to_event() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "from": {"id": 42, "is_bot": false, "first_name": "A"},
                "chat": {"id": 4242, "type": "private"},
                "text": "/menu"
            }
        }))
        .unwrap();

        assert_eq!(
            update.into_event(),
            Some(InboundEvent::Text {
                user_id: 42,
                chat_id: 4242,
                text: "/menu".into()
            })
        );
    }

    #[test]
    fn test_callback_update_to_event() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 11,
            "callback_query": {
                "id": "abc",
                "from": {"id": 42},
                "message": {"message_id": 5, "chat": {"id": 4242}},
                "data": "lst:1"
            }
        }))
        .unwrap();

        assert_eq!(
            update.into_event(),
            Some(InboundEvent::Control {
                user_id: 42,
                chat_id: 4242,
                message_id: 5,
                callback_id: "abc".into(),
                payload: "lst:1".into()
            })
        );
    }

    #[test]
    fn test_non_text_updates_are_ignored() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 12,
            "message": {"message_id": 5, "chat": {"id": 4242}}
        }))
        .unwrap();
        assert_eq!(update.into_event(), None);

        let update: Update = serde_json::from_value(json!({"update_id": 13})).unwrap();
        assert_eq!(update.into_event(), None);
    }

    #[test]
    fn test_inline_keyboard_layout() {
        let surface = Surface::new("x")
            .button("a", "mnu")
            .row(vec![
                crate::bot::surface::Control::new("b", "lst:0"),
                crate::bot::surface::Control::new("c", "lst:1"),
            ]);
        let value = serde_json::to_value(inline_keyboard(&surface)).unwrap();
        assert_eq!(
            value,
            json!([
                [{"text": "a", "callback_data": "mnu"}],
                [{"text": "b", "callback_data": "lst:0"}, {"text": "c", "callback_data": "lst:1"}]
            ])
        );
    }

    #[tokio::test]
    async fn test_dispatch_answers_then_renders() {
        let service = service();
        let transport = RecordingTransport::default();

        dispatch(
            &service,
            &transport,
            InboundEvent::Control {
                user_id: 42,
                chat_id: 4242,
                message_id: 5,
                callback_id: "abc".into(),
                payload: "rgc".into(),
            },
        )
        .await;

        let answered = transport.answered.lock().unwrap();
        assert_eq!(answered.len(), 1);
        assert_eq!(answered[0].0, "abc");
        assert!(answered[0].1.is_some());

        let rendered = transport.rendered.lock().unwrap();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].0, RenderTarget::edit(4242, 5));
    }

    #[tokio::test]
    async fn test_dispatch_text_sends_new_message_without_answer() {
        let service = service();
        let transport = RecordingTransport::default();

        dispatch(
            &service,
            &transport,
            InboundEvent::Text {
                user_id: 42,
                chat_id: 4242,
                text: "/start".into(),
            },
        )
        .await;

        assert!(transport.answered.lock().unwrap().is_empty());
        let rendered = transport.rendered.lock().unwrap();
        assert_eq!(rendered[0].0, RenderTarget::new_message(4242));
    }
}
