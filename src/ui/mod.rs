pub mod components;

pub mod sign_in;
pub mod dashboard;
pub mod clients;
pub mod client_wizard;
pub mod projects;
pub mod project_wizard;
pub mod employees;
pub mod employee_wizard;
pub mod assignments;
pub mod assignment_wizard;
pub mod timesheets;
pub mod timesheet_editor;
pub mod expenses;
pub mod expense_editor;
pub mod approvals;
pub mod admin_timesheets;
pub mod reports;
