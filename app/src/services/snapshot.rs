use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    TransactionError, TransactionTrait,
};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::models::{
    task::{self, Entity as TaskEntity},
    task_log::{self, Entity as TaskLogEntity},
};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_SECS: u64 = 2;

/// Daily background job that records which tasks are active. Each pass is
/// a single transaction: the active set read and all snapshot inserts
/// commit together, so one run never exposes a partial snapshot.
pub struct SnapshotJob {
    db: DatabaseConnection,
    hour: u32,
    minute: u32,
}

impl SnapshotJob {
    pub fn new(db: DatabaseConnection, hour: u32, minute: u32) -> Self {
        Self {
            db,
            hour: hour.min(23),
            minute: minute.min(59),
        }
    }

    /// One snapshot pass. Returns the number of rows written; zero active
    /// tasks is a successful pass that writes nothing.
    pub async fn run_snapshot_pass(&self) -> Result<u64, DbErr> {
        self.db
            .transaction(|txn| {
                Box::pin(async move {
                    let active_tasks = TaskEntity::find()
                        .filter(task::Column::IsActive.eq(true))
                        .all(txn)
                        .await?;

                    let count = active_tasks.len() as u64;
                    if count == 0 {
                        return Ok(0);
                    }

                    let logged_at = Utc::now().naive_utc();
                    let rows = active_tasks.into_iter().map(|t| task_log::ActiveModel {
                        task_id: Set(t.id),
                        logged_at: Set(logged_at),
                        ..Default::default()
                    });

                    TaskLogEntity::insert_many(rows).exec(txn).await?;

                    Ok(count)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(err) => err,
                TransactionError::Transaction(err) => err,
            })
    }

    /// Run one pass, retrying failures with doubling delays. After the
    /// retry ceiling the run is abandoned and the error surfaced; the
    /// caller decides what to do with it, the job itself stays healthy.
    pub async fn run_with_retry(&self) -> Result<u64, DbErr> {
        let mut attempt = 1;

        loop {
            match self.run_snapshot_pass().await {
                Ok(count) => {
                    info!("Snapshot pass logged {} active tasks", count);
                    return Ok(count);
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    let delay = retry_delay(attempt);
                    warn!(
                        "Snapshot pass failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempt, MAX_ATTEMPTS, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!("Snapshot pass abandoned after {} attempts: {}", MAX_ATTEMPTS, e);
                    return Err(e);
                }
            }
        }
    }

    /// Spawn the scheduler loop: sleep until the configured wall-clock
    /// time, run a pass, go back to sleeping. A failed run never takes
    /// the loop down; the next trigger still fires.
    pub fn start(self) {
        tokio::spawn(async move {
            loop {
                let now = Utc::now().naive_utc();
                let next = next_run_after(now, self.hour, self.minute);
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

                info!("Next snapshot pass scheduled at {} UTC", next);
                tokio::time::sleep(wait).await;

                if let Err(e) = self.run_with_retry().await {
                    error!("Scheduled snapshot run failed: {}", e);
                }
            }
        });
    }
}

/// First occurrence of hour:minute strictly after `now`.
pub fn next_run_after(now: NaiveDateTime, hour: u32, minute: u32) -> NaiveDateTime {
    let hour = hour.min(23);
    let minute = minute.min(59);

    let today_run = now
        .date()
        .and_hms_opt(hour, minute, 0)
        .expect("clamped to a valid wall-clock time");

    if today_run > now {
        today_run
    } else {
        today_run + chrono::Duration::days(1)
    }
}

fn retry_delay(attempt: u32) -> Duration {
    Duration::from_secs(RETRY_BASE_DELAY_SECS << (attempt - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_next_run_later_today() {
        let next = next_run_after(at(1, 0, 0), 2, 43);
        assert_eq!(next, at(2, 43, 0));
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        let next = next_run_after(at(3, 0, 0), 2, 43);
        assert_eq!(
            next,
            NaiveDate::from_ymd_opt(2026, 8, 16)
                .unwrap()
                .and_hms_opt(2, 43, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_exact_trigger_time_waits_a_full_day() {
        let next = next_run_after(at(2, 43, 0), 2, 43);
        assert_eq!(
            next,
            NaiveDate::from_ymd_opt(2026, 8, 16)
                .unwrap()
                .and_hms_opt(2, 43, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_out_of_range_schedule_is_clamped() {
        let next = next_run_after(at(12, 0, 0), 99, 99);
        assert_eq!(next, at(23, 59, 0));
    }

    #[test]
    fn test_retry_delays_double() {
        assert_eq!(retry_delay(1), Duration::from_secs(2));
        assert_eq!(retry_delay(2), Duration::from_secs(4));
        assert_eq!(retry_delay(3), Duration::from_secs(8));
    }
}
