use chrono::{DateTime, NaiveDate, Utc};

use super::ApprovalStatus;

pub const EXPENSE_CATEGORIES: [&str; 6] = [
    "travel",
    "meals",
    "lodging",
    "equipment",
    "software",
    "other",
];

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ExpenseReport {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub status: ApprovalStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ExpenseReportOverview {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub status: ApprovalStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub employee_name: String,
    pub employee_email: String,
    pub client_id: Option<i32>,
    pub total_amount: f64,
    pub item_count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ExpenseItem {
    pub id: i32,
    pub report_id: i32,
    pub expense_date: NaiveDate,
    pub category: String,
    pub description: String,
    pub amount: f64,
    pub project_id: Option<i32>,
}

/// Item joined with its report and owner, used by exports
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ExpenseItemDetail {
    pub id: i32,
    pub report_id: i32,
    pub expense_date: NaiveDate,
    pub category: String,
    pub description: String,
    pub amount: f64,
    pub report_title: String,
    #[sqlx(try_from = "String")]
    pub status: ApprovalStatus,
    pub employee_name: String,
}
