pub mod complete_reminder;
pub mod create_reminder;
pub mod delete_reminder;
pub mod dispatch_due_reminders;
pub mod get_reminders;

pub use complete_reminder::{CompleteReminderUseCase, CompletionNotice};
pub use create_reminder::CreateReminderUseCase;
pub use delete_reminder::DeleteReminderUseCase;
pub use dispatch_due_reminders::{DispatchDueRemindersUseCase, DispatchReport};
pub use get_reminders::GetRemindersUseCase;
