use crate::shared::usecase::UseCase;
use nudge_domain::retry::{resolve_max_delivery_attempts, RESEND_INTERVAL_MILLIS};
use nudge_domain::Reminder;
use nudge_infra::{DeliveryResult, NudgeContext, ReminderAction};
use tracing::{error, warn};

/// One dispatch tick: find every due reminder and run the delivery attempt
/// state machine for each of them. Reminders are processed independently, a
/// failure for one never aborts the tick for the rest, and each reminder is
/// persisted as its own unit of work right after its transition.
#[derive(Debug)]
pub struct DispatchDueRemindersUseCase;

#[derive(Debug, Default, PartialEq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub retries_scheduled: usize,
    pub deactivated: usize,
}

#[derive(Debug)]
pub enum UseCaseErrors {}

#[async_trait::async_trait]
impl UseCase for DispatchDueRemindersUseCase {
    type Response = DispatchReport;

    type Errors = UseCaseErrors;

    const NAME: &'static str = "DispatchDueReminders";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Errors> {
        let now = ctx.sys.get_timestamp_millis();
        let due_reminders = ctx.repos.reminders.find_due(now).await;
        let mut report = DispatchReport::default();
        if due_reminders.is_empty() {
            return Ok(report);
        }

        let max_retry_count = ctx
            .repos
            .user_settings
            .get()
            .await
            .and_then(|settings| settings.max_retry_count);
        let max_delivery_attempts = resolve_max_delivery_attempts(max_retry_count);

        for mut reminder in due_reminders {
            process_reminder(&mut reminder, now, max_delivery_attempts, ctx, &mut report).await;
            if let Err(e) = ctx.repos.reminders.save(&reminder).await {
                error!(
                    "Unable to persist reminder {} after dispatch: {:?}",
                    reminder.id, e
                );
            }
        }

        Ok(report)
    }
}

async fn process_reminder(
    reminder: &mut Reminder,
    now: i64,
    max_delivery_attempts: u32,
    ctx: &NudgeContext,
    report: &mut DispatchReport,
) {
    reminder.ensure_next_attempt(now);
    let attempt_number = reminder.send_attempts + 1;
    reminder.send_attempts = attempt_number;
    let is_retry = attempt_number > 1;
    let previous_message_id = reminder.last_sent_message_id;

    let text = reminder.format_message(false);
    let action = ReminderAction::complete(&reminder.id);
    match ctx
        .channel
        .send_message(&reminder.target, &text, Some(action))
        .await
    {
        Ok(result) if result.success => {
            handle_successful_send(
                reminder,
                now,
                &result,
                previous_message_id,
                is_retry,
                max_delivery_attempts,
                ctx,
            )
            .await;
            report.delivered += 1;
        }
        Ok(result) if result.is_target_gone() => {
            reminder.deactivate();
            warn!(
                "Disabling reminder {} because the channel reported target {} gone ({:?}). Check that the target id is correct.",
                reminder.id, reminder.target, result.description
            );
            report.deactivated += 1;
        }
        Ok(result) => {
            let description = result.description.as_deref().unwrap_or("unknown error");
            handle_failed_send(reminder, now, description, max_delivery_attempts);
            report.retries_scheduled += 1;
        }
        Err(e) => {
            error!(
                "Failed to send reminder {} to target {} because of a transport error; scheduling retry. {:?}",
                reminder.id, reminder.target, e
            );
            handle_failed_send(reminder, now, "transport error", max_delivery_attempts);
            report.retries_scheduled += 1;
        }
    }
}

async fn handle_successful_send(
    reminder: &mut Reminder,
    now: i64,
    result: &DeliveryResult,
    previous_message_id: Option<i64>,
    is_retry: bool,
    max_delivery_attempts: u32,
    ctx: &NudgeContext,
) {
    reminder.last_sent_at = Some(now);
    reminder.last_sent_message_id = result.message_id;

    // A retry leaves the previous notification dangling in the chat, clean
    // it up now that the replacement is delivered
    if is_retry {
        if let (Some(previous_id), Some(new_id)) = (previous_message_id, result.message_id) {
            if previous_id != new_id {
                ctx.channel
                    .delete_message(&reminder.target, previous_id)
                    .await;
            }
        }
    }

    if reminder.has_used_all_attempts(max_delivery_attempts) {
        reminder.finish_occurrence();
    } else {
        reminder.next_attempt_at = Some(now + RESEND_INTERVAL_MILLIS);
    }
}

fn handle_failed_send(
    reminder: &mut Reminder,
    now: i64,
    description: &str,
    max_delivery_attempts: u32,
) {
    if reminder.has_used_all_attempts(max_delivery_attempts) {
        reminder.finish_occurrence();
        warn!(
            "Reminder {} reached max attempts after failure ({}); moving forward.",
            reminder.id, description
        );
    } else {
        reminder.next_attempt_at = Some(now + RESEND_INTERVAL_MILLIS);
        warn!(
            "Reminder {} will retry after failure ({} (retry {} of {})). Next attempt at {:?} UTC millis.",
            reminder.id,
            description,
            reminder.send_attempts + 1,
            max_delivery_attempts,
            reminder.next_attempt_at
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use nudge_domain::{Recurrence, UserSettings};
    use nudge_infra::{FixedSys, InMemoryDeliveryChannel, SendOutcome};
    use std::sync::Arc;

    fn ts(year: i32, month: u32, day: u32, hour: u32, min: u32) -> i64 {
        Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(year, month, day)
                .unwrap()
                .and_hms_opt(hour, min, 0)
                .unwrap(),
        )
        .timestamp_millis()
    }

    fn base_time() -> i64 {
        ts(2024, 1, 1, 9, 0)
    }

    fn setup(now: i64) -> (NudgeContext, Arc<InMemoryDeliveryChannel>) {
        let channel = Arc::new(InMemoryDeliveryChannel::new());
        let ctx = NudgeContext::create_inmemory()
            .with_channel(channel.clone())
            .with_sys(Arc::new(FixedSys(now)));
        (ctx, channel)
    }

    async fn set_max_retry_count(ctx: &NudgeContext, max_retry_count: i32) {
        let settings = UserSettings {
            max_retry_count: Some(max_retry_count),
            ..Default::default()
        };
        ctx.repos.user_settings.save(&settings).await.unwrap();
    }

    async fn insert_reminder(ctx: &NudgeContext, recurrence: Recurrence) -> Reminder {
        let reminder = Reminder::new("77".into(), "Standup".into(), base_time(), recurrence);
        ctx.repos.reminders.insert(&reminder).await.unwrap();
        reminder
    }

    async fn stored(ctx: &NudgeContext, reminder: &Reminder) -> Reminder {
        ctx.repos.reminders.find(&reminder.id).await.unwrap()
    }

    async fn tick(ctx: &NudgeContext) -> DispatchReport {
        DispatchDueRemindersUseCase
            .execute(ctx)
            .await
            .expect("Dispatch tick")
    }

    #[tokio::test]
    async fn advances_recurring_reminders_after_final_successful_send() {
        for (recurrence, expected_start) in &[
            (Recurrence::Daily, ts(2024, 1, 2, 9, 0)),
            (Recurrence::Weekly, ts(2024, 1, 8, 9, 0)),
            (Recurrence::Monthly, ts(2024, 2, 1, 9, 0)),
        ] {
            let (ctx, _) = setup(base_time());
            set_max_retry_count(&ctx, 0).await;
            let reminder = insert_reminder(&ctx, *recurrence).await;

            tick(&ctx).await;

            let stored = stored(&ctx, &reminder).await;
            assert_eq!(stored.start_time, *expected_start);
            assert_eq!(stored.next_attempt_at, Some(*expected_start));
            assert_eq!(stored.send_attempts, 0);
            assert_eq!(stored.last_sent_at, None);
            assert_eq!(stored.last_sent_message_id, None);
            assert!(stored.active);
        }
    }

    #[tokio::test]
    async fn deactivates_once_reminder_after_final_successful_send() {
        let (ctx, channel) = setup(base_time());
        set_max_retry_count(&ctx, 0).await;
        let reminder = insert_reminder(&ctx, Recurrence::Once).await;

        let report = tick(&ctx).await;

        assert_eq!(report.delivered, 1);
        let stored = stored(&ctx, &reminder).await;
        assert!(!stored.active);
        assert_eq!(stored.next_attempt_at, None);
        assert_eq!(stored.start_time, base_time());
        assert_eq!(stored.send_attempts, 1);
        assert_eq!(stored.last_sent_at, Some(base_time()));
        assert!(stored.last_sent_message_id.is_some());
        assert_eq!(channel.sent_count(), 1);
    }

    #[tokio::test]
    async fn notification_carries_a_completion_action_for_the_reminder() {
        let (ctx, channel) = setup(base_time());
        let reminder = insert_reminder(&ctx, Recurrence::Once).await;

        tick(&ctx).await;

        let sent = channel.sent.lock().unwrap().remove(0);
        assert_eq!(sent.target, "77");
        assert_eq!(sent.text, "\u{23f0} Standup");
        let action = sent.action.expect("Completion action");
        assert_eq!(action.callback_data, format!("complete:{}", reminder.id));
    }

    #[tokio::test]
    async fn resends_until_attempts_are_exhausted_then_advances() {
        let (ctx, channel) = setup(base_time());
        set_max_retry_count(&ctx, 1).await;
        let reminder = insert_reminder(&ctx, Recurrence::Daily).await;

        tick(&ctx).await;

        let after_first = stored(&ctx, &reminder).await;
        assert_eq!(after_first.send_attempts, 1);
        assert_eq!(
            after_first.next_attempt_at,
            Some(base_time() + RESEND_INTERVAL_MILLIS)
        );
        let first_message_id = after_first.last_sent_message_id.expect("Message id");

        let resend_at = base_time() + RESEND_INTERVAL_MILLIS;
        let ctx_later = ctx.clone().with_sys(Arc::new(FixedSys(resend_at)));
        tick(&ctx_later).await;

        let after_second = stored(&ctx, &reminder).await;
        assert_eq!(after_second.start_time, ts(2024, 1, 2, 9, 0));
        assert_eq!(after_second.send_attempts, 0);
        assert!(after_second.active);
        // The stale retry notification was cleaned up
        let deleted = channel.deleted.lock().unwrap();
        assert_eq!(deleted.as_slice(), &[("77".to_string(), first_message_id)]);
    }

    // Ticks are serialized by the job loop, a tick that fires again right
    // after the previous one must see the rescheduled reminder as not due
    // and leave its attempt count alone
    #[tokio::test]
    async fn immediate_follow_up_tick_does_not_double_deliver() {
        let (ctx, channel) = setup(base_time());
        let reminder = insert_reminder(&ctx, Recurrence::Daily).await;

        tick(&ctx).await;
        let second_report = tick(&ctx).await;

        assert_eq!(second_report, DispatchReport::default());
        assert_eq!(channel.sent_count(), 1);
        let stored = stored(&ctx, &reminder).await;
        assert_eq!(stored.send_attempts, 1);
        assert_eq!(
            stored.next_attempt_at,
            Some(base_time() + RESEND_INTERVAL_MILLIS)
        );
    }

    #[tokio::test]
    async fn schedules_retry_after_failed_send_before_max_attempts() {
        let (ctx, channel) = setup(base_time());
        set_max_retry_count(&ctx, 1).await;
        let reminder = insert_reminder(&ctx, Recurrence::Once).await;
        channel.script_send(SendOutcome::Failed(DeliveryResult::error(
            Some(500),
            "down",
        )));

        let report = tick(&ctx).await;

        assert_eq!(report.retries_scheduled, 1);
        let stored = stored(&ctx, &reminder).await;
        assert!(stored.active);
        assert_eq!(stored.send_attempts, 1);
        assert_eq!(
            stored.next_attempt_at,
            Some(base_time() + RESEND_INTERVAL_MILLIS)
        );
        assert_eq!(stored.last_sent_message_id, None);
    }

    #[tokio::test]
    async fn transport_errors_are_treated_as_transient_failures() {
        let (ctx, channel) = setup(base_time());
        set_max_retry_count(&ctx, 1).await;
        let reminder = insert_reminder(&ctx, Recurrence::Once).await;
        channel.script_send(SendOutcome::TransportError("connection reset".into()));

        let report = tick(&ctx).await;

        assert_eq!(report.retries_scheduled, 1);
        let stored = stored(&ctx, &reminder).await;
        assert!(stored.active);
        assert_eq!(stored.send_attempts, 1);
        assert_eq!(
            stored.next_attempt_at,
            Some(base_time() + RESEND_INTERVAL_MILLIS)
        );
    }

    #[tokio::test]
    async fn permanent_target_failure_deactivates_immediately() {
        let (ctx, channel) = setup(base_time());
        set_max_retry_count(&ctx, 5).await;
        let reminder = insert_reminder(&ctx, Recurrence::Once).await;
        channel.script_send(SendOutcome::Failed(DeliveryResult::error(
            Some(404),
            "chat not found",
        )));

        let report = tick(&ctx).await;

        assert_eq!(report.deactivated, 1);
        let stored = stored(&ctx, &reminder).await;
        assert!(!stored.active);
        assert_eq!(stored.next_attempt_at, None);
        assert_eq!(stored.send_attempts, 1);
    }

    #[tokio::test]
    async fn deactivates_once_reminder_after_final_failure() {
        let (ctx, channel) = setup(base_time());
        set_max_retry_count(&ctx, 0).await;
        let reminder = insert_reminder(&ctx, Recurrence::Once).await;
        channel.script_send(SendOutcome::Failed(DeliveryResult::error(
            Some(500),
            "down",
        )));

        tick(&ctx).await;

        let stored = stored(&ctx, &reminder).await;
        assert!(!stored.active);
        assert_eq!(stored.next_attempt_at, None);
        assert_eq!(stored.send_attempts, 1);
    }

    #[tokio::test]
    async fn advances_recurring_reminder_after_final_failure() {
        let (ctx, channel) = setup(base_time());
        set_max_retry_count(&ctx, 0).await;
        let reminder = insert_reminder(&ctx, Recurrence::Weekly).await;
        channel.script_send(SendOutcome::Failed(DeliveryResult::error(
            Some(500),
            "down",
        )));

        tick(&ctx).await;

        let stored = stored(&ctx, &reminder).await;
        assert!(stored.active);
        assert_eq!(stored.start_time, ts(2024, 1, 8, 9, 0));
        assert_eq!(stored.next_attempt_at, Some(stored.start_time));
        assert_eq!(stored.send_attempts, 0);
    }

    #[tokio::test]
    async fn one_failing_reminder_does_not_block_the_rest_of_the_tick() {
        let (ctx, channel) = setup(base_time());
        let first = insert_reminder(&ctx, Recurrence::Once).await;
        let second = insert_reminder(&ctx, Recurrence::Once).await;
        channel.script_send(SendOutcome::TransportError("connection reset".into()));

        let report = tick(&ctx).await;

        assert_eq!(report.retries_scheduled, 1);
        assert_eq!(report.delivered, 1);
        let first = stored(&ctx, &first).await;
        let second = stored(&ctx, &second).await;
        assert_eq!(first.last_sent_message_id, None);
        assert!(second.last_sent_message_id.is_some());
    }

    #[tokio::test]
    async fn seeds_scheduling_state_for_uninitialized_reminders() {
        let now = base_time();
        let (ctx, _) = setup(now);
        let mut reminder = Reminder::new("77".into(), "Old row".into(), 0, Recurrence::Once);
        reminder.start_time = 0;
        reminder.next_attempt_at = None;
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        tick(&ctx).await;

        let stored = stored(&ctx, &reminder).await;
        assert_eq!(stored.start_time, now);
        assert_eq!(stored.send_attempts, 1);
    }

    #[tokio::test]
    async fn missing_settings_fall_back_to_default_attempt_budget() {
        let (ctx, _) = setup(base_time());
        let reminder = insert_reminder(&ctx, Recurrence::Once).await;

        // Default is 2 retries, so 3 attempts in total
        for attempt in 1..=3u32 {
            let now = base_time() + (attempt as i64 - 1) * RESEND_INTERVAL_MILLIS;
            let ctx_now = ctx.clone().with_sys(Arc::new(FixedSys(now)));
            tick(&ctx_now).await;
        }

        let stored = stored(&ctx, &reminder).await;
        assert!(!stored.active);
    }
}
