mod delivery;
mod telegram;

pub use delivery::{
    ChannelUpdate, DeliveryResult, IDeliveryChannel, InMemoryDeliveryChannel, IncomingAction,
    IncomingMessage, ReminderAction, SendOutcome, SentMessage,
};
pub use telegram::{TelegramChannel, DEFAULT_API_URL};
