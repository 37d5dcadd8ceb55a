use super::delivery::{
    ChannelUpdate, DeliveryResult, IDeliveryChannel, IncomingAction, IncomingMessage,
    ReminderAction,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

// https://core.telegram.org/bots/api

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Delivery channel backed by the Telegram Bot API
pub struct TelegramChannel {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl TelegramChannel {
    pub fn new(token: String, api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            token,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn call<B: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> anyhow::Result<ApiResponse<R>> {
        let res = self
            .client
            .post(&self.method_url(method))
            .json(body)
            .send()
            .await?;
        Ok(res.json::<ApiResponse<R>>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<R> {
    ok: bool,
    result: Option<R>,
    error_code: Option<i32>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRaw {
    message_id: i64,
    chat: ChatRaw,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatRaw {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct CallbackQueryRaw {
    id: String,
    data: Option<String>,
    message: Option<MessageRaw>,
}

#[derive(Debug, Deserialize)]
struct UpdateRaw {
    update_id: i64,
    message: Option<MessageRaw>,
    callback_query: Option<CallbackQueryRaw>,
}

impl From<UpdateRaw> for ChannelUpdate {
    fn from(u: UpdateRaw) -> Self {
        let message = u.message.and_then(|m| {
            let target = m.chat.id.to_string();
            m.text.map(|text| IncomingMessage { target, text })
        });
        let action = u.callback_query.and_then(|q| {
            let message = q.message?;
            Some(IncomingAction {
                action_id: q.id,
                target: message.chat.id.to_string(),
                message_id: Some(message.message_id),
                data: q.data.unwrap_or_default(),
            })
        });
        Self {
            update_id: u.update_id,
            message,
            action,
        }
    }
}

fn inline_keyboard(action: &ReminderAction) -> serde_json::Value {
    json!({
        "inline_keyboard": [[{
            "text": action.label,
            "callback_data": action.callback_data,
        }]]
    })
}

#[async_trait::async_trait]
impl IDeliveryChannel for TelegramChannel {
    async fn send_message(
        &self,
        target: &str,
        text: &str,
        action: Option<ReminderAction>,
    ) -> anyhow::Result<DeliveryResult> {
        let chat_id: i64 = match target.parse() {
            Ok(chat_id) => chat_id,
            Err(_) => {
                return Ok(DeliveryResult::error(
                    None,
                    format!("Delivery target is not a chat id: {}", target),
                ))
            }
        };
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(action) = &action {
            body["reply_markup"] = inline_keyboard(action);
        }
        let res: ApiResponse<MessageRaw> = self.call("sendMessage", &body).await?;
        if !res.ok {
            return Ok(DeliveryResult::error(
                res.error_code,
                res.description.unwrap_or_default(),
            ));
        }
        Ok(DeliveryResult::ok(res.result.map(|m| m.message_id)))
    }

    async fn edit_message(&self, target: &str, message_id: i64, text: &str) {
        let body = json!({
            "chat_id": target,
            "message_id": message_id,
            "text": text,
            "reply_markup": { "inline_keyboard": [] },
        });
        match self.call::<_, serde_json::Value>("editMessageText", &body).await {
            Ok(res) if !res.ok => warn!(
                "Failed to edit message {} for chat {} (errorCode={:?}, description={:?})",
                message_id, target, res.error_code, res.description
            ),
            Err(e) => warn!(
                "Failed to edit message {} for chat {}: {:?}",
                message_id, target, e
            ),
            _ => {}
        }
    }

    async fn delete_message(&self, target: &str, message_id: i64) {
        let body = json!({
            "chat_id": target,
            "message_id": message_id,
        });
        match self.call::<_, bool>("deleteMessage", &body).await {
            Ok(res) if !res.ok => warn!(
                "Failed to delete message {} for chat {} (errorCode={:?}, description={:?})",
                message_id, target, res.error_code, res.description
            ),
            Err(e) => warn!(
                "Failed to delete message {} for chat {}: {:?}",
                message_id, target, e
            ),
            _ => {}
        }
    }

    async fn answer_action(&self, action_id: &str, text: &str) {
        let body = json!({
            "callback_query_id": action_id,
            "text": text,
        });
        match self.call::<_, bool>("answerCallbackQuery", &body).await {
            Ok(res) if !res.ok => warn!(
                "Failed to answer callback query {} (errorCode={:?}, description={:?})",
                action_id, res.error_code, res.description
            ),
            Err(e) => warn!("Failed to answer callback query {}: {:?}", action_id, e),
            _ => {}
        }
    }

    async fn poll_updates(&self, offset: i64, limit: u32) -> anyhow::Result<Vec<ChannelUpdate>> {
        let body = json!({
            "offset": offset,
            "limit": limit,
            "timeout": 0,
        });
        let res: ApiResponse<Vec<UpdateRaw>> = self.call("getUpdates", &body).await?;
        if !res.ok {
            return Err(anyhow::anyhow!(
                "getUpdates failed (errorCode={:?}, description={:?})",
                res.error_code,
                res.description
            ));
        }
        Ok(res
            .result
            .unwrap_or_default()
            .into_iter()
            .map(|u| u.into())
            .collect())
    }
}
