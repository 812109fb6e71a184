use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// A calendar month over which payroll is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    first_day: NaiveDate,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first_day: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(self.first_day)
    }

    pub fn days(&self) -> u32 {
        self.last_day().day()
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_day.format("%Y-%m"))
    }
}

impl FromStr for BillingPeriod {
    type Err = String;

    /// Accepts `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("Invalid billing period '{}', expected YYYY-MM", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid year in billing period '{}'", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month in billing period '{}'", s))?;
        BillingPeriod::new(year, month).ok_or_else(|| format!("Invalid billing period '{}'", s))
    }
}

/// Derived payroll figures for one employee over one billing period.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayrollSnapshot {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = "2026-04", value_type = String)]
    #[serde(serialize_with = "serialize_period")]
    pub period: BillingPeriod,
    #[schema(example = "30000", value_type = String)]
    pub monthly_salary: Decimal,
    #[schema(example = 30)]
    pub days_in_period: u32,
    #[schema(example = "1000.00", value_type = String)]
    pub daily_wage: Decimal,
    #[schema(example = "2", value_type = String)]
    pub approved_leave_days: Decimal,
    #[schema(example = "1", value_type = String)]
    pub rejected_leave_days: Decimal,
    #[schema(example = "4", value_type = String)]
    pub deduction_days: Decimal,
    #[schema(example = "26", value_type = String)]
    pub working_days: Decimal,
    #[schema(example = "26000.00", value_type = String)]
    pub net_salary: Decimal,
}

fn serialize_period<S: serde::Serializer>(period: &BillingPeriod, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_follow_the_calendar() {
        assert_eq!(BillingPeriod::new(2026, 2).unwrap().days(), 28);
        assert_eq!(BillingPeriod::new(2028, 2).unwrap().days(), 29);
        assert_eq!(BillingPeriod::new(2026, 4).unwrap().days(), 30);
        assert_eq!(BillingPeriod::new(2026, 12).unwrap().days(), 31);
    }

    #[test]
    fn parses_year_month() {
        let period: BillingPeriod = "2026-09".parse().unwrap();
        assert_eq!(period.first_day(), NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        assert_eq!(period.last_day(), NaiveDate::from_ymd_opt(2026, 9, 30).unwrap());
        assert_eq!(period.to_string(), "2026-09");

        assert!("2026-13".parse::<BillingPeriod>().is_err());
        assert!("september".parse::<BillingPeriod>().is_err());
    }
}
