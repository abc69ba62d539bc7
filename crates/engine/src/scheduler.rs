use crate::runner::RunGate;
use chrono::{DateTime, Datelike, Days, Duration, NaiveTime, Utc, Weekday};
use configuration::ScheduleConfig;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A fixed weekly fire time, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    weekday: Weekday,
    time: NaiveTime,
}

impl WeeklySchedule {
    pub fn new(weekday: Weekday, time: NaiveTime) -> Self {
        Self { weekday, time }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(config.weekday, config.time_utc)
    }

    /// The first fire time strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive();
        let days_ahead = (7 + self.weekday.num_days_from_monday()
            - today.weekday().num_days_from_monday())
            % 7;
        let candidate = today
            .checked_add_days(Days::new(u64::from(days_ahead)))
            .unwrap_or(today)
            .and_time(self.time)
            .and_utc();

        if candidate > now {
            candidate
        } else {
            candidate + Duration::days(7)
        }
    }
}

/// Spawns the weekly loop: sleep until the next fire time, run through the
/// gate, repeat. Failed runs are logged and the loop carries on.
pub fn spawn(schedule: WeeklySchedule, gate: Arc<RunGate>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = schedule.next_after(now);
            tracing::info!(next_run = %next, "Scheduled next recommendation run.");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            match gate.run().await {
                Ok(snapshot) => tracing::info!(
                    run_id = %snapshot.run_id,
                    failed = snapshot.is_failed(),
                    "Scheduled run finished."
                ),
                Err(e) => tracing::error!(error = %e, "Scheduled run failed."),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn monday_1435() -> WeeklySchedule {
        WeeklySchedule::new(Weekday::Mon, NaiveTime::from_hms_opt(14, 35, 0).unwrap())
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn later_the_same_day() {
        // 2024-09-02 is a Monday.
        assert_eq!(monday_1435().next_after(at(2024, 9, 2, 9, 0)), at(2024, 9, 2, 14, 35));
    }

    #[test]
    fn exactly_on_time_moves_a_week_on() {
        assert_eq!(monday_1435().next_after(at(2024, 9, 2, 14, 35)), at(2024, 9, 9, 14, 35));
    }

    #[test]
    fn mid_week_waits_for_next_monday() {
        assert_eq!(monday_1435().next_after(at(2024, 9, 4, 12, 0)), at(2024, 9, 9, 14, 35));
        assert_eq!(monday_1435().next_after(at(2024, 9, 8, 23, 59)), at(2024, 9, 9, 14, 35));
    }

    #[test]
    fn crosses_month_and_year_boundaries() {
        let friday = WeeklySchedule::new(Weekday::Fri, NaiveTime::from_hms_opt(21, 0, 0).unwrap());
        // 2024-12-28 is a Saturday.
        assert_eq!(friday.next_after(at(2024, 12, 28, 10, 0)), at(2025, 1, 3, 21, 0));
    }

    #[test]
    fn reads_config() {
        assert_eq!(WeeklySchedule::from_config(&ScheduleConfig::default()), monday_1435());
    }
}
