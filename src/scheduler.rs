use std::sync::Arc;
use std::time::Duration;

use actix_web::rt::{spawn, time::sleep};
use actix_web::web::Data;
use chrono::{Local, NaiveDateTime, NaiveTime};
use tracing::{error, info};

use crate::config::Config;
use crate::service::reconciliation::run_reconciliation;
use crate::store::MySqlStore;
use crate::utils::location::LocationResolver;

/// First occurrence of `at` strictly after `now`.
pub fn next_run(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Runs the auto clock-out once a day at `config.reconcile_at` local time.
pub fn spawn_daily_reconciliation(
    store: Data<MySqlStore>,
    resolver: Arc<dyn LocationResolver>,
    config: &Config,
) {
    let at = config.reconcile_at;
    let refresh_timeout = config.geocoder_timeout();

    spawn(async move {
        loop {
            let now = Local::now().naive_local();
            let next = next_run(now, at);
            let wait = (next - now).to_std().unwrap_or(Duration::from_secs(1));
            info!(%next, "Next auto clock-out scheduled");
            sleep(wait).await;

            let as_of = Local::now().date_naive();
            if let Err(e) =
                run_reconciliation(store.get_ref(), resolver.as_ref(), as_of, refresh_timeout).await
            {
                error!(error = %e, "Auto clock-out could not run");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn runs_later_today_when_time_not_reached() {
        let at = NaiveTime::from_hms_opt(0, 5, 0).unwrap();
        assert_eq!(next_run(dt(14, 0, 1), at), dt(14, 0, 5));
    }

    #[test]
    fn runs_tomorrow_once_time_has_passed() {
        let at = NaiveTime::from_hms_opt(0, 5, 0).unwrap();
        assert_eq!(next_run(dt(14, 0, 5), at), dt(15, 0, 5));
        assert_eq!(next_run(dt(31, 23, 0), at), NaiveDate::from_ymd_opt(2026, 11, 1).unwrap().and_time(at));
    }
}
