use crate::reminder::{
    CompleteReminderUseCase, CreateReminderUseCase, DeleteReminderUseCase,
    DispatchDueRemindersUseCase, GetRemindersUseCase,
};
use crate::settings::{GetSettingsUseCase, UpdateSettingsUseCase};
use crate::shared::usecase::execute;
use chrono::{NaiveDateTime, TimeZone, Utc};
use nudge_domain::{Recurrence, Reminder, UserSettings, ID};
use nudge_infra::{ChannelUpdate, IncomingAction, IncomingMessage, NudgeContext, ReminderAction};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::warn;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const UPDATES_BATCH_SIZE: u32 = 20;

/// Runs the dispatch tick at the configured interval. Each tick is awaited
/// inline, so a slow tick delays the next one instead of overlapping with it.
pub fn start_dispatch_job(ctx: NudgeContext) {
    tokio::spawn(async move {
        let mut tick_interval =
            interval(Duration::from_millis(ctx.config.tick_interval_millis));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick_interval.tick().await;
            let _ = execute(DispatchDueRemindersUseCase, &ctx).await;
        }
    });
}

/// Polls the delivery channel for inbound updates (completion actions and
/// text commands). The polling cursor lives on this task's stack and is
/// threaded through every poll call.
pub fn start_channel_updates_job(ctx: NudgeContext) {
    tokio::spawn(async move {
        let mut poll_interval = interval(Duration::from_millis(
            ctx.config.channel_polling_delay_millis,
        ));
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cursor: i64 = 0;
        loop {
            poll_interval.tick().await;
            let updates = match ctx.channel.poll_updates(cursor + 1, UPDATES_BATCH_SIZE).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("Polling channel updates failed: {:?}", e);
                    continue;
                }
            };
            for update in updates {
                cursor = cursor.max(update.update_id);
                handle_update(&ctx, update).await;
            }
        }
    });
}

pub async fn handle_update(ctx: &NudgeContext, update: ChannelUpdate) {
    if let Some(action) = update.action {
        handle_action(ctx, action).await;
    } else if let Some(message) = update.message {
        handle_message(ctx, message).await;
    }
}

async fn handle_action(ctx: &NudgeContext, action: IncomingAction) {
    let reminder_id = match action.data.strip_prefix(ReminderAction::COMPLETE_PREFIX) {
        Some(raw_id) => match raw_id.parse::<ID>() {
            Ok(id) => id,
            Err(_) => {
                ctx.channel
                    .answer_action(&action.action_id, "Invalid action")
                    .await;
                return;
            }
        },
        None => {
            ctx.channel
                .answer_action(&action.action_id, "Unknown action")
                .await;
            return;
        }
    };

    let usecase = CompleteReminderUseCase {
        reminder_id,
        requester: action.target.clone(),
    };
    match execute(usecase, ctx).await {
        Ok(notice) => {
            if let Some(message_id) = notice.message_id.or(action.message_id) {
                ctx.channel
                    .edit_message(&action.target, message_id, &notice.updated_text)
                    .await;
            }
            ctx.channel
                .answer_action(&action.action_id, "Marked as completed")
                .await;
        }
        Err(_) => {
            ctx.channel
                .answer_action(&action.action_id, "Reminder not found")
                .await;
        }
    }
}

async fn handle_message(ctx: &NudgeContext, message: IncomingMessage) {
    let text = message.text.trim();
    let reply = if text.starts_with("/list") {
        match execute(
            GetRemindersUseCase {
                target: message.target.clone(),
            },
            ctx,
        )
        .await
        {
            Ok(reminders) if reminders.is_empty() => "You have no reminders yet.".to_string(),
            Ok(reminders) => format_reminder_list(&reminders),
            Err(_) => "Something went wrong.".to_string(),
        }
    } else if text == "/settings" {
        match execute(GetSettingsUseCase, ctx).await {
            Ok(settings) => format_settings(&settings),
            Err(_) => "Something went wrong.".to_string(),
        }
    } else if let Some(raw_timezone) = text.strip_prefix("/timezone") {
        let raw_timezone = raw_timezone.trim();
        if raw_timezone.is_empty() {
            "Usage: /timezone <IANA timezone, for example Europe/Oslo>".to_string()
        } else {
            match execute(GetSettingsUseCase, ctx).await {
                Ok(mut settings) => {
                    settings.timezone = Some(raw_timezone.to_string());
                    match execute(
                        UpdateSettingsUseCase {
                            updated_settings: settings,
                        },
                        ctx,
                    )
                    .await
                    {
                        // An unknown timezone is replaced by the default, the
                        // reply reflects what was actually stored
                        Ok(saved) => format!(
                            "Timezone set to {}",
                            saved.timezone.as_deref().unwrap_or("UTC")
                        ),
                        Err(_) => "Something went wrong.".to_string(),
                    }
                }
                Err(_) => "Something went wrong.".to_string(),
            }
        }
    } else if let Some(raw_id) = text.strip_prefix("/delete") {
        match raw_id.trim().parse::<ID>() {
            Ok(reminder_id) => {
                let usecase = DeleteReminderUseCase {
                    reminder_id,
                    requester: message.target.clone(),
                };
                match execute(usecase, ctx).await {
                    Ok(_) => "Reminder deleted.".to_string(),
                    Err(_) => "Reminder not found.".to_string(),
                }
            }
            Err(_) => "Usage: /delete <id>".to_string(),
        }
    } else {
        match parse_reminder_text(text) {
            Some(parsed) => {
                let usecase = CreateReminderUseCase {
                    target: Some(message.target.clone()),
                    title: parsed.title.clone(),
                    description: parsed.description,
                    start_time: parsed.start_time,
                    recurrence: parsed.recurrence,
                };
                match execute(usecase, ctx).await {
                    Ok(reminder) => format!("Reminder saved: {}", reminder.title),
                    Err(_) => "Something went wrong.".to_string(),
                }
            }
            None => format!(
                "Send: title; {}; once|daily|weekly|monthly[; description]",
                "yyyy-mm-dd HH:MM"
            ),
        }
    };

    if let Err(e) = ctx.channel.send_message(&message.target, &reply, None).await {
        warn!(
            "Failed to reply to target {} because of a transport error: {:?}",
            message.target, e
        );
    }
}

#[derive(Debug, PartialEq)]
struct ParsedReminder {
    title: String,
    start_time: i64,
    recurrence: Recurrence,
    description: Option<String>,
}

/// Parses `title; yyyy-mm-dd HH:MM; recurrence[; description]`
fn parse_reminder_text(text: &str) -> Option<ParsedReminder> {
    let parts: Vec<&str> = text.splitn(4, ';').map(str::trim).collect();
    if parts.len() < 3 || parts[0].is_empty() {
        return None;
    }
    let start = NaiveDateTime::parse_from_str(parts[1], TIME_FORMAT).ok()?;
    let recurrence = parts[2].parse::<Recurrence>().ok()?;
    Some(ParsedReminder {
        title: parts[0].to_string(),
        start_time: Utc.from_utc_datetime(&start).timestamp_millis(),
        recurrence,
        description: parts
            .get(3)
            .filter(|description| !description.is_empty())
            .map(|description| description.to_string()),
    })
}

fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn format_settings(settings: &UserSettings) -> String {
    format!(
        "Timezone: {}\nRetries per reminder: {}\nQuiet hours: {} - {}",
        settings.timezone.as_deref().unwrap_or("UTC"),
        settings.max_retry_count.unwrap_or(2),
        format_minutes(settings.quiet_hours_start.unwrap_or(22 * 60)),
        format_minutes(settings.quiet_hours_end.unwrap_or(7 * 60)),
    )
}

fn format_reminder_list(reminders: &[Reminder]) -> String {
    let mut lines = vec!["Your reminders:".to_string()];
    for reminder in reminders {
        let start = Utc
            .timestamp_millis_opt(reminder.start_time)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| reminder.start_time.to_string());
        lines.push(format!(
            "{} | {} | {} | {}",
            reminder.id, reminder.title, start, reminder.recurrence
        ));
    }
    lines.join("\n")
}
