use chrono::{DateTime, Utc};
use contracts::usecases::u501_sync_from_mflow::SyncReport;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::usecases::u501_sync_from_mflow::SyncExecutor;

/// Parse a 6-field cron expression (seconds first), evaluated in UTC.
pub fn parse_schedule(expr: &str) -> anyhow::Result<Schedule> {
    Schedule::from_str(expr.trim())
        .map_err(|e| anyhow::anyhow!("Invalid cron expression '{}': {}", expr, e))
}

/// Фоновый запуск синхронизации по расписанию cron.
pub struct SyncScheduler {
    executor: Arc<SyncExecutor>,
    schedule: Schedule,
}

impl SyncScheduler {
    pub fn new(executor: Arc<SyncExecutor>, cron: &str) -> anyhow::Result<Self> {
        Ok(Self {
            executor,
            schedule: parse_schedule(cron)?,
        })
    }

    pub fn next_fire(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Запуск сразу при старте, затем по каждому срабатыванию расписания.
    /// Неудачный запуск логируется, цикл продолжается.
    pub async fn run_loop(&self) {
        info!("mflow sync scheduler started");
        self.run_once().await;

        loop {
            let now = Utc::now();
            let Some(next) = self.next_fire(now) else {
                warn!("Schedule has no upcoming fire times, scheduler stopped");
                return;
            };
            info!("Next mflow sync at {}", next);

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            self.run_once().await;
        }
    }

    /// Один запуск с логированием результата
    pub async fn run_once(&self) -> Option<SyncReport> {
        match self.executor.sync().await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("Scheduled mflow sync failed: {}", e);
                None
            }
        }
    }
}
