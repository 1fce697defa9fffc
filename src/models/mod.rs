mod status;
mod user;
mod client;
mod project;
mod assignment;
mod timesheet;
mod expense;

pub use status::ApprovalStatus;
pub use user::{Role, User};
pub use client::Client;
pub use project::Project;
pub use assignment::{find_overlap, AssignmentOverview, ProjectAssignment};
pub use timesheet::{week_end, week_start, in_week, TimeEntry, TimeEntryDetail, Timesheet, TimesheetOverview};
pub use expense::{ExpenseItem, ExpenseItemDetail, ExpenseReport, ExpenseReportOverview, EXPENSE_CATEGORIES};
