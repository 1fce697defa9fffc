use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use super::ApprovalStatus;

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Timesheet {
    pub id: i32,
    pub user_id: i32,
    /// Always a Monday
    pub week_start: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: ApprovalStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

/// Timesheet joined with its owner and hour total, used by list screens
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct TimesheetOverview {
    pub id: i32,
    pub user_id: i32,
    pub week_start: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: ApprovalStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub employee_name: String,
    pub employee_email: String,
    pub client_id: Option<i32>,
    pub total_hours: f64,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct TimeEntry {
    pub id: i32,
    pub timesheet_id: i32,
    pub user_id: i32,
    pub project_id: i32,
    pub entry_date: NaiveDate,
    pub hours: f64,
    pub description: String,
}

/// Entry joined with the names needed for billing and exports
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct TimeEntryDetail {
    pub id: i32,
    pub timesheet_id: i32,
    pub user_id: i32,
    pub project_id: i32,
    pub entry_date: NaiveDate,
    pub hours: f64,
    pub description: String,
    pub employee_name: String,
    pub project_name: String,
    pub client_id: i32,
    pub client_name: String,
    #[sqlx(try_from = "String")]
    pub status: ApprovalStatus,
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn week_end(week_start: NaiveDate) -> NaiveDate {
    week_start + Duration::days(6)
}

pub fn in_week(week_start: NaiveDate, date: NaiveDate) -> bool {
    date >= week_start && date <= week_end(week_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_start_is_monday() {
        // 2024-05-15 is a Wednesday
        let wednesday = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 5, 13).unwrap();
        assert_eq!(week_start(wednesday), monday);
        assert_eq!(week_start(monday), monday);

        let sunday = NaiveDate::from_ymd_opt(2024, 5, 19).unwrap();
        assert_eq!(week_start(sunday), monday);
        assert_eq!(week_end(monday), sunday);
    }

    #[test]
    fn in_week_bounds() {
        let monday = NaiveDate::from_ymd_opt(2024, 5, 13).unwrap();
        assert!(in_week(monday, monday));
        assert!(in_week(monday, NaiveDate::from_ymd_opt(2024, 5, 19).unwrap()));
        assert!(!in_week(monday, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()));
        assert!(!in_week(monday, NaiveDate::from_ymd_opt(2024, 5, 12).unwrap()));
    }
}
