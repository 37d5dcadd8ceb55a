use nudge_domain::ID;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// Outcome of one send call against the delivery channel. Transport level
/// failures are surfaced separately as `Err` by `IDeliveryChannel::send_message`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryResult {
    pub success: bool,
    pub message_id: Option<i64>,
    pub error_code: Option<i32>,
    pub description: Option<String>,
}

impl DeliveryResult {
    pub fn ok(message_id: Option<i64>) -> Self {
        Self {
            success: true,
            message_id,
            error_code: None,
            description: None,
        }
    }

    pub fn error(error_code: Option<i32>, description: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error_code,
            description: Some(description.into()),
        }
    }

    /// The recipient is permanently invalid or unreachable. Never retried.
    pub fn is_target_gone(&self) -> bool {
        self.error_code == Some(404)
    }
}

/// An inline action attached to a notification, resolving back to the
/// reminder it was sent for.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderAction {
    pub label: String,
    pub callback_data: String,
}

impl ReminderAction {
    pub const COMPLETE_PREFIX: &'static str = "complete:";

    pub fn complete(reminder_id: &ID) -> Self {
        Self {
            label: "\u{2705} Completed".to_string(),
            callback_data: format!("{}{}", Self::COMPLETE_PREFIX, reminder_id),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChannelUpdate {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
    pub action: Option<IncomingAction>,
}

#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub target: String,
    pub text: String,
}

/// A triggered `ReminderAction`, for example a pressed "completed" button
#[derive(Debug, Clone)]
pub struct IncomingAction {
    pub action_id: String,
    pub target: String,
    pub message_id: Option<i64>,
    pub data: String,
}

#[async_trait::async_trait]
pub trait IDeliveryChannel: Send + Sync {
    /// Delivers a notification. `Err` means the transport itself failed and
    /// is treated by callers like a transient delivery failure.
    async fn send_message(
        &self,
        target: &str,
        text: &str,
        action: Option<ReminderAction>,
    ) -> anyhow::Result<DeliveryResult>;

    /// Best effort, failures are logged by the implementation
    async fn edit_message(&self, target: &str, message_id: i64, text: &str);

    /// Best effort, failures are logged by the implementation
    async fn delete_message(&self, target: &str, message_id: i64);

    /// Best effort acknowledgement of a triggered action
    async fn answer_action(&self, action_id: &str, text: &str);

    /// Fetches updates with id >= `offset`. The cursor is owned by the
    /// caller and threaded through explicitly, the channel keeps no hidden
    /// polling state.
    async fn poll_updates(&self, offset: i64, limit: u32) -> anyhow::Result<Vec<ChannelUpdate>>;
}

/// Scriptable outcome for `InMemoryDeliveryChannel::send_message`
#[derive(Debug, Clone)]
pub enum SendOutcome {
    Delivered,
    Failed(DeliveryResult),
    TransportError(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub target: String,
    pub text: String,
    pub action: Option<ReminderAction>,
    pub message_id: Option<i64>,
}

/// Channel double used by tests and local development. Records all outgoing
/// traffic and pops scripted send outcomes, defaulting to successful
/// delivery with incrementing message ids.
pub struct InMemoryDeliveryChannel {
    pub sent: Mutex<Vec<SentMessage>>,
    pub edited: Mutex<Vec<(String, i64, String)>>,
    pub deleted: Mutex<Vec<(String, i64)>>,
    pub answered: Mutex<Vec<(String, String)>>,
    outcomes: Mutex<VecDeque<SendOutcome>>,
    updates: Mutex<Vec<ChannelUpdate>>,
    next_message_id: AtomicI64,
}

impl InMemoryDeliveryChannel {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            edited: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            answered: Mutex::new(Vec::new()),
            outcomes: Mutex::new(VecDeque::new()),
            updates: Mutex::new(Vec::new()),
            next_message_id: AtomicI64::new(1),
        }
    }

    pub fn script_send(&self, outcome: SendOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn queue_update(&self, update: ChannelUpdate) {
        self.updates.lock().unwrap().push(update);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Default for InMemoryDeliveryChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IDeliveryChannel for InMemoryDeliveryChannel {
    async fn send_message(
        &self,
        target: &str,
        text: &str,
        action: Option<ReminderAction>,
    ) -> anyhow::Result<DeliveryResult> {
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SendOutcome::Delivered);
        let (result, message_id) = match outcome {
            SendOutcome::Delivered => {
                let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
                (DeliveryResult::ok(Some(message_id)), Some(message_id))
            }
            SendOutcome::Failed(result) => (result, None),
            SendOutcome::TransportError(reason) => return Err(anyhow::anyhow!(reason)),
        };
        self.sent.lock().unwrap().push(SentMessage {
            target: target.to_string(),
            text: text.to_string(),
            action,
            message_id,
        });
        Ok(result)
    }

    async fn edit_message(&self, target: &str, message_id: i64, text: &str) {
        self.edited
            .lock()
            .unwrap()
            .push((target.to_string(), message_id, text.to_string()));
    }

    async fn delete_message(&self, target: &str, message_id: i64) {
        self.deleted
            .lock()
            .unwrap()
            .push((target.to_string(), message_id));
    }

    async fn answer_action(&self, action_id: &str, text: &str) {
        self.answered
            .lock()
            .unwrap()
            .push((action_id.to_string(), text.to_string()));
    }

    async fn poll_updates(&self, offset: i64, limit: u32) -> anyhow::Result<Vec<ChannelUpdate>> {
        let updates = self.updates.lock().unwrap();
        Ok(updates
            .iter()
            .filter(|update| update.update_id >= offset)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
