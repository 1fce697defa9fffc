use chrono::NaiveDate;

use crate::models::{
    ApprovalStatus, AssignmentOverview, Client, ExpenseReportOverview, Project, TimeEntryDetail,
    TimesheetOverview, User,
};

/// A row that list screens can narrow down.
pub trait Filterable {
    /// Text matched against the search box
    fn search_text(&self) -> String;

    fn status(&self) -> Option<ApprovalStatus> {
        None
    }

    fn date(&self) -> Option<NaiveDate> {
        None
    }
}

/// Search box, status filter and date range of a list screen.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub query: String,
    pub status: Option<ApprovalStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ListFilter {
    pub fn matches<T: Filterable>(&self, row: &T) -> bool {
        let query = self.query.trim().to_lowercase();
        if !query.is_empty() && !row.search_text().to_lowercase().contains(&query) {
            return false;
        }

        if let Some(status) = self.status {
            if row.status() != Some(status) {
                return false;
            }
        }

        if self.from.is_some() || self.to.is_some() {
            let Some(date) = row.date() else {
                return false;
            };
            if self.from.map_or(false, |from| date < from) || self.to.map_or(false, |to| date > to) {
                return false;
            }
        }

        true
    }

    /// Indices of matching rows, in their original order
    pub fn apply<T: Filterable>(&self, rows: &[T]) -> Vec<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| self.matches(*row))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.query.is_empty() {
            parts.push(format!("search \"{}\"", self.query));
        }
        if let Some(status) = self.status {
            parts.push(format!("status {}", status.label()));
        }
        match (self.from, self.to) {
            (Some(from), Some(to)) => parts.push(format!("{from} to {to}")),
            (Some(from), None) => parts.push(format!("from {from}")),
            (None, Some(to)) => parts.push(format!("until {to}")),
            (None, None) => {}
        }
        if parts.is_empty() {
            "all".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl Filterable for User {
    fn search_text(&self) -> String {
        format!("{} {} {}", self.full_name, self.email, self.role)
    }
}

impl Filterable for Client {
    fn search_text(&self) -> String {
        format!("{} {}", self.name, self.contact_email)
    }
}

impl Filterable for Project {
    fn search_text(&self) -> String {
        format!("{} {}", self.name, self.description.as_deref().unwrap_or(""))
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.start_date)
    }
}

impl Filterable for AssignmentOverview {
    fn search_text(&self) -> String {
        format!("{} {} {}", self.employee_name, self.project_name, self.client_name)
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.start_date)
    }
}

impl Filterable for TimesheetOverview {
    fn search_text(&self) -> String {
        format!("{} {} {}", self.employee_name, self.employee_email, self.week_start)
    }

    fn status(&self) -> Option<ApprovalStatus> {
        Some(self.status)
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.week_start)
    }
}

impl Filterable for ExpenseReportOverview {
    fn search_text(&self) -> String {
        format!("{} {} {}", self.title, self.employee_name, self.employee_email)
    }

    fn status(&self) -> Option<ApprovalStatus> {
        Some(self.status)
    }

    fn date(&self) -> Option<NaiveDate> {
        self.submitted_at.map(|at| at.date_naive())
    }
}

impl Filterable for TimeEntryDetail {
    fn search_text(&self) -> String {
        format!("{} {} {} {}", self.employee_name, self.project_name, self.client_name, self.description)
    }

    fn status(&self) -> Option<ApprovalStatus> {
        Some(self.status)
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.entry_date)
    }
}
