use super::IReminderRepo;
use nudge_domain::{Recurrence, Reminder, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresReminderRepo {
    pool: PgPool,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRaw {
    reminder_uid: Uuid,
    target: String,
    title: String,
    description: Option<String>,
    start_time: i64,
    next_attempt_at: Option<i64>,
    last_sent_at: Option<i64>,
    last_sent_message_id: Option<i64>,
    send_attempts: i32,
    recurrence: String,
    active: bool,
}

impl From<ReminderRaw> for Reminder {
    fn from(e: ReminderRaw) -> Self {
        Self {
            id: e.reminder_uid.into(),
            target: e.target,
            title: e.title,
            description: e.description,
            start_time: e.start_time,
            next_attempt_at: e.next_attempt_at,
            last_sent_at: e.last_sent_at,
            last_sent_message_id: e.last_sent_message_id,
            send_attempts: e.send_attempts.max(0) as u32,
            recurrence: e.recurrence.parse().unwrap_or(Recurrence::Once),
            active: e.active,
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for PostgresReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminders(reminder_uid, target, title, description, start_time,
                next_attempt_at, last_sent_at, last_sent_message_id, send_attempts, recurrence, active)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(reminder.id.inner_ref())
        .bind(&reminder.target)
        .bind(&reminder.title)
        .bind(&reminder.description)
        .bind(reminder.start_time)
        .bind(reminder.next_attempt_at)
        .bind(reminder.last_sent_at)
        .bind(reminder.last_sent_message_id)
        .bind(reminder.send_attempts as i32)
        .bind(reminder.recurrence.to_string())
        .bind(reminder.active)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert reminder: {:?}. DB returned error: {:?}",
                reminder, e
            );
            e
        })?;
        Ok(())
    }

    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reminders
            SET target = $2,
            title = $3,
            description = $4,
            start_time = $5,
            next_attempt_at = $6,
            last_sent_at = $7,
            last_sent_message_id = $8,
            send_attempts = $9,
            recurrence = $10,
            active = $11
            WHERE reminder_uid = $1
            "#,
        )
        .bind(reminder.id.inner_ref())
        .bind(&reminder.target)
        .bind(&reminder.title)
        .bind(&reminder.description)
        .bind(reminder.start_time)
        .bind(reminder.next_attempt_at)
        .bind(reminder.last_sent_at)
        .bind(reminder.last_sent_message_id)
        .bind(reminder.send_attempts as i32)
        .bind(reminder.recurrence.to_string())
        .bind(reminder.active)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to save reminder: {:?}. DB returned error: {:?}",
                reminder, e
            );
            e
        })?;
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        let res: Option<ReminderRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reminders
            WHERE reminder_uid = $1
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find reminder with id: {} failed. DB returned error: {:?}",
                reminder_id, e
            );
            e
        })
        .ok()?;
        res.map(|reminder| reminder.into())
    }

    async fn find_due(&self, now: i64) -> Vec<Reminder> {
        let reminders_raw: Vec<ReminderRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reminders
            WHERE active = TRUE AND COALESCE(next_attempt_at, start_time) <= $1
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find due reminders before: {} failed. DB returned error: {:?}",
                now, e
            );
            e
        })
        .unwrap_or_default();

        reminders_raw.into_iter().map(|r| r.into()).collect()
    }

    async fn find_by_target(&self, target: &str) -> Vec<Reminder> {
        let reminders_raw: Vec<ReminderRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reminders
            WHERE target = $1
            ORDER BY start_time ASC
            "#,
        )
        .bind(target)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find reminders for target: {} failed. DB returned error: {:?}",
                target, e
            );
            e
        })
        .unwrap_or_default();

        reminders_raw.into_iter().map(|r| r.into()).collect()
    }

    async fn delete(&self, reminder_id: &ID) -> Option<Reminder> {
        let res: Option<ReminderRaw> = sqlx::query_as(
            r#"
            DELETE FROM reminders
            WHERE reminder_uid = $1
            RETURNING *
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Delete reminder with id: {} failed. DB returned error: {:?}",
                reminder_id, e
            );
            e
        })
        .ok()?;
        res.map(|reminder| reminder.into())
    }
}
