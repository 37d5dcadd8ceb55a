mod reminder;
pub mod retry;
mod shared;
mod user_settings;

pub use reminder::Reminder;
pub use shared::entity::{Entity, ID};
pub use shared::recurrence::Recurrence;
pub use user_settings::UserSettings;
