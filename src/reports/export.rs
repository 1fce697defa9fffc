//! CSV export for the "Export" actions and the `export`/`report` commands.
//!
//! Fields go through the `csv` writer, so commas, quotes and newlines inside
//! names and descriptions are quoted rather than splitting a record.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Result;

use super::stats::{BillingLine, ComplianceLine};
use crate::models::{ExpenseItemDetail, TimeEntryDetail, TimesheetOverview};

pub trait CsvRecord {
    fn header() -> &'static [&'static str];
    fn record(&self) -> Vec<String>;
}

/// Writes a header and one record per row. Returns the number of data rows.
pub fn write_csv<'a, W, T, I>(writer: W, rows: I) -> Result<usize>
where
    W: Write,
    T: CsvRecord + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(T::header())?;

    let mut written = 0;
    for row in rows {
        csv_writer.write_record(row.record())?;
        written += 1;
    }
    csv_writer.flush()?;

    Ok(written)
}

pub fn export_to_file<'a, T, I>(path: &Path, rows: I) -> Result<usize>
where
    T: CsvRecord + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let file = File::create(path)?;
    let written = write_csv(file, rows)?;
    tracing::info!(path = %path.display(), rows = written, "csv export written");
    Ok(written)
}

/// Default file name for an export started from a screen
pub fn default_file_name(kind: &str) -> String {
    format!("{}_{}.csv", kind, chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

fn hours(value: f64) -> String {
    format!("{:.2}", value)
}

impl CsvRecord for TimesheetOverview {
    fn header() -> &'static [&'static str] {
        &["employee", "email", "week_start", "status", "total_hours", "submitted_at"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.employee_name.clone(),
            self.employee_email.clone(),
            self.week_start.to_string(),
            self.status.as_str().to_string(),
            hours(self.total_hours),
            self.submitted_at.map(|at| at.to_rfc3339()).unwrap_or_default(),
        ]
    }
}

impl CsvRecord for TimeEntryDetail {
    fn header() -> &'static [&'static str] {
        &["employee", "project", "date", "hours", "description"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.employee_name.clone(),
            self.project_name.clone(),
            self.entry_date.to_string(),
            hours(self.hours),
            self.description.clone(),
        ]
    }
}

impl CsvRecord for ExpenseItemDetail {
    fn header() -> &'static [&'static str] {
        &["employee", "report", "status", "date", "category", "description", "amount"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.employee_name.clone(),
            self.report_title.clone(),
            self.status.as_str().to_string(),
            self.expense_date.to_string(),
            self.category.clone(),
            self.description.clone(),
            format!("{:.2}", self.amount),
        ]
    }
}

impl CsvRecord for BillingLine {
    fn header() -> &'static [&'static str] {
        &["client", "project", "hours", "billable_amount"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.client_name.clone(),
            self.project_name.clone(),
            hours(self.hours),
            format!("{:.2}", self.billable_amount),
        ]
    }
}

impl CsvRecord for ComplianceLine {
    fn header() -> &'static [&'static str] {
        &["employee", "email", "week_start", "status"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.employee_name.clone(),
            self.employee_email.clone(),
            self.week_start.to_string(),
            self.status.map_or("missing", |s| s.as_str()).to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApprovalStatus;
    use chrono::NaiveDate;

    fn entry(description: &str) -> TimeEntryDetail {
        TimeEntryDetail {
            id: 1,
            timesheet_id: 1,
            user_id: 1,
            project_id: 1,
            entry_date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            hours: 7.5,
            description: description.to_string(),
            employee_name: "Lovelace, Ada".to_string(),
            project_name: "Engine".to_string(),
            client_id: 1,
            client_name: "Acme".to_string(),
            status: ApprovalStatus::Submitted,
        }
    }

    fn read_back(bytes: &[u8]) -> Vec<csv::StringRecord> {
        csv::Reader::from_reader(bytes)
            .records()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn row_count_matches_selection() {
        let rows = vec![entry("a"), entry("b"), entry("c")];
        let selected: Vec<&TimeEntryDetail> = rows.iter().skip(1).collect();

        let mut out = Vec::new();
        let written = write_csv(&mut out, selected.iter().copied()).unwrap();

        assert_eq!(written, 2);
        assert_eq!(read_back(&out).len(), 2);
    }

    #[test]
    fn embedded_commas_quotes_and_newlines_survive() {
        let tricky = "fixed \"the\" bug, then\nwrote tests";
        let rows = vec![entry(tricky)];

        let mut out = Vec::new();
        write_csv(&mut out, &rows).unwrap();

        let records = read_back(&out);
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][0], "Lovelace, Ada");
        assert_eq!(&records[0][4], tricky);
        assert_eq!(records[0].len(), TimeEntryDetail::header().len());
    }

    #[test]
    fn empty_export_still_has_header() {
        let mut out = Vec::new();
        let written = write_csv::<_, BillingLine, _>(&mut out, &Vec::new()).unwrap();
        assert_eq!(written, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "client,project,hours,billable_amount\n");
    }

    #[test]
    fn compliance_marks_missing_sheets() {
        let line = ComplianceLine {
            employee_name: "Grace".into(),
            employee_email: "grace@example.com".into(),
            week_start: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            status: None,
        };
        assert_eq!(line.record()[3], "missing");
    }
}
