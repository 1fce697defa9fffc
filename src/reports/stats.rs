use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};

use crate::models::{
    week_start, ApprovalStatus, ExpenseItem, ExpenseReportOverview, ProjectAssignment, TimeEntryDetail,
    TimesheetOverview, User,
};

/// `part / whole` as a percentage, 0 when there is nothing to divide by.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Summary cards above timesheet lists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimesheetStats {
    pub count: usize,
    pub total_hours: f64,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Approved share of everything that has left draft
    pub approval_rate: f64,
}

impl TimesheetStats {
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a TimesheetOverview>,
    {
        let mut stats = TimesheetStats::default();
        let mut drafts = 0;
        for row in rows {
            stats.count += 1;
            stats.total_hours += row.total_hours;
            match row.status {
                ApprovalStatus::Draft => drafts += 1,
                ApprovalStatus::Submitted | ApprovalStatus::ClientApproved => stats.pending += 1,
                ApprovalStatus::PayrollApproved => stats.approved += 1,
                ApprovalStatus::Rejected => stats.rejected += 1,
            }
        }
        stats.approval_rate = percentage(stats.approved as f64, (stats.count - drafts) as f64);
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseStats {
    pub count: usize,
    pub total_amount: f64,
    pub pending_amount: f64,
    pub approved_amount: f64,
    pub rejected_amount: f64,
}

impl ExpenseStats {
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a ExpenseReportOverview>,
    {
        let mut stats = ExpenseStats::default();
        for row in rows {
            stats.count += 1;
            stats.total_amount += row.total_amount;
            match row.status {
                ApprovalStatus::Submitted | ApprovalStatus::ClientApproved => stats.pending_amount += row.total_amount,
                ApprovalStatus::PayrollApproved => stats.approved_amount += row.total_amount,
                ApprovalStatus::Rejected => stats.rejected_amount += row.total_amount,
                ApprovalStatus::Draft => {}
            }
        }
        stats
    }
}

/// Per-category totals, sorted by category name
pub fn category_totals(items: &[ExpenseItem]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for item in items {
        *totals.entry(item.category.clone()).or_insert(0.0) += item.amount;
    }
    totals.into_iter().collect()
}

/// Hours per employee, highest first. Employees sharing a name stay separate rows.
pub fn hours_by_employee(entries: &[TimeEntryDetail]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<i32, (&str, f64)> = BTreeMap::new();
    for entry in entries {
        totals.entry(entry.user_id).or_insert((entry.employee_name.as_str(), 0.0)).1 += entry.hours;
    }
    let mut rows: Vec<(String, f64)> = totals.into_values().map(|(name, hours)| (name.to_string(), hours)).collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

/// Entries a report covers; with `approved_only` just those past client approval
pub fn report_entries(entries: &[TimeEntryDetail], approved_only: bool) -> Vec<TimeEntryDetail> {
    entries
        .iter()
        .filter(|e| !approved_only || e.status.is_approved())
        .cloned()
        .collect()
}

/// Bill rate of the assignment covering the entry's date
pub fn rate_for(user_id: i32, project_id: i32, date: NaiveDate, assignments: &[ProjectAssignment]) -> Option<f64> {
    assignments
        .iter()
        .find(|a| a.user_id == user_id && a.project_id == project_id && a.covers(date))
        .map(|a| a.bill_rate)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillingLine {
    pub client_id: i32,
    pub project_id: i32,
    pub client_name: String,
    pub project_name: String,
    pub hours: f64,
    pub billable_amount: f64,
    /// Hours logged with no assignment covering the date
    pub unrated_hours: f64,
}

/// Hours and billable amount per client and project, ordered by client then project.
/// Rejected hours are never billed.
pub fn billing_report(entries: &[TimeEntryDetail], assignments: &[ProjectAssignment]) -> Vec<BillingLine> {
    let mut lines: BTreeMap<(String, i32, String, i32), BillingLine> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.status != ApprovalStatus::Rejected) {
        let key = (entry.client_name.clone(), entry.client_id, entry.project_name.clone(), entry.project_id);
        let line = lines
            .entry(key)
            .or_insert_with(|| BillingLine {
                client_id: entry.client_id,
                project_id: entry.project_id,
                client_name: entry.client_name.clone(),
                project_name: entry.project_name.clone(),
                hours: 0.0,
                billable_amount: 0.0,
                unrated_hours: 0.0,
            });
        line.hours += entry.hours;
        match rate_for(entry.user_id, entry.project_id, entry.entry_date, assignments) {
            Some(rate) => line.billable_amount += entry.hours * rate,
            None => line.unrated_hours += entry.hours,
        }
    }
    lines.into_values().collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceLine {
    pub employee_name: String,
    pub employee_email: String,
    pub week_start: NaiveDate,
    /// `None` when no timesheet exists for the week
    pub status: Option<ApprovalStatus>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplianceReport {
    pub expected: usize,
    pub missing: Vec<ComplianceLine>,
}

impl ComplianceReport {
    pub fn compliance_rate(&self) -> f64 {
        percentage((self.expected - self.missing.len()) as f64, self.expected as f64)
    }
}

/// Mondays of every week touching `[from, to]`
pub fn weeks_between(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut weeks = Vec::new();
    let mut current = week_start(from);
    while current <= to {
        weeks.push(current);
        current += Duration::days(7);
    }
    weeks
}

/// Active employees lacking a submitted timesheet for each week. Drafts and
/// rejected sheets count as missing.
pub fn compliance_report(employees: &[User], timesheets: &[TimesheetOverview], weeks: &[NaiveDate]) -> ComplianceReport {
    let by_user_week: HashMap<(i32, NaiveDate), ApprovalStatus> = timesheets
        .iter()
        .map(|sheet| ((sheet.user_id, sheet.week_start), sheet.status))
        .collect();

    let mut report = ComplianceReport::default();
    for week in weeks {
        for employee in employees.iter().filter(|u| u.is_active) {
            report.expected += 1;
            let status = by_user_week.get(&(employee.id, *week)).copied();
            let submitted = status.map_or(false, |s| !matches!(s, ApprovalStatus::Draft | ApprovalStatus::Rejected));
            if !submitted {
                report.missing.push(ComplianceLine {
                    employee_name: employee.full_name.clone(),
                    employee_email: employee.email.clone(),
                    week_start: *week,
                    status,
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sheet(user_id: i32, week: NaiveDate, status: ApprovalStatus, hours: f64) -> TimesheetOverview {
        TimesheetOverview {
            id: user_id,
            user_id,
            week_start: week,
            status,
            submitted_at: None,
            rejection_reason: None,
            employee_name: format!("Employee {user_id}"),
            employee_email: format!("e{user_id}@example.com"),
            client_id: Some(1),
            total_hours: hours,
        }
    }

    fn entry(user_id: i32, project_id: i32, day: NaiveDate, hours: f64) -> TimeEntryDetail {
        TimeEntryDetail {
            id: 0,
            timesheet_id: 0,
            user_id,
            project_id,
            entry_date: day,
            hours,
            description: String::new(),
            employee_name: format!("Employee {user_id}"),
            project_name: format!("Project {project_id}"),
            client_id: 1,
            client_name: "Acme".into(),
            status: ApprovalStatus::Submitted,
        }
    }

    fn assignment(user_id: i32, project_id: i32, start: NaiveDate, end: Option<NaiveDate>, rate: f64) -> ProjectAssignment {
        ProjectAssignment { id: 0, user_id, project_id, start_date: start, end_date: end, bill_rate: rate }
    }

    #[test]
    fn percentage_of_nothing_is_zero() {
        assert_eq!(percentage(3.0, 0.0), 0.0);
        assert_eq!(percentage(1.0, 4.0), 25.0);
    }

    #[test]
    fn timesheet_cards_match_row_arithmetic() {
        let week = date(2024, 5, 6);
        let rows = vec![
            sheet(1, week, ApprovalStatus::Draft, 10.0),
            sheet(2, week, ApprovalStatus::Submitted, 40.0),
            sheet(3, week, ApprovalStatus::PayrollApproved, 38.5),
            sheet(4, week, ApprovalStatus::Rejected, 12.0),
        ];
        let stats = TimesheetStats::from_rows(&rows);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.total_hours, rows.iter().map(|r| r.total_hours).sum::<f64>());
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.rejected, 1);
        assert!((stats.approval_rate - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_rows_give_zeroed_cards() {
        let stats = TimesheetStats::from_rows(&[]);
        assert_eq!(stats, TimesheetStats::default());
        assert_eq!(ExpenseStats::from_rows(&[]), ExpenseStats::default());
    }

    #[test]
    fn billing_uses_assignment_rate_for_the_entry_date() {
        let assignments = vec![
            assignment(1, 1, date(2024, 1, 1), Some(date(2024, 1, 31)), 100.0),
            assignment(1, 1, date(2024, 2, 1), None, 120.0),
        ];
        let entries = vec![
            entry(1, 1, date(2024, 1, 31), 8.0),
            entry(1, 1, date(2024, 2, 1), 5.0),
            entry(2, 1, date(2024, 2, 1), 3.0),
        ];
        let report = billing_report(&entries, &assignments);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].hours, 16.0);
        assert_eq!(report[0].billable_amount, 8.0 * 100.0 + 5.0 * 120.0);
        assert_eq!(report[0].unrated_hours, 3.0);
    }

    #[test]
    fn billing_keeps_same_named_projects_apart() {
        let day = date(2024, 5, 6);
        let assignments = vec![
            assignment(1, 10, date(2024, 1, 1), None, 100.0),
            assignment(1, 11, date(2024, 1, 1), None, 50.0),
        ];
        let mut first = entry(1, 10, day, 2.0);
        let mut second = entry(1, 11, day, 3.0);
        first.project_name = "Support".into();
        second.project_name = "Support".into();

        let report = billing_report(&[first, second], &assignments);
        assert_eq!(report.len(), 2);
        assert_eq!((report[0].project_id, report[0].billable_amount), (10, 200.0));
        assert_eq!((report[1].project_id, report[1].billable_amount), (11, 150.0));
    }

    #[test]
    fn rejected_hours_are_not_billed() {
        let day = date(2024, 5, 6);
        let assignments = vec![assignment(1, 1, date(2024, 1, 1), None, 100.0)];
        let mut rejected = entry(1, 1, day, 6.0);
        rejected.status = ApprovalStatus::Rejected;
        let entries = vec![entry(1, 1, day, 2.0), rejected];

        let report = billing_report(&entries, &assignments);
        assert_eq!(report[0].hours, 2.0);
        assert_eq!(report[0].billable_amount, 200.0);
        assert!(billing_report(&entries[1..], &assignments).is_empty());
    }

    #[test]
    fn approved_only_keeps_client_approved_and_later() {
        let day = date(2024, 5, 6);
        let mut approved = entry(1, 1, day, 3.0);
        approved.status = ApprovalStatus::ClientApproved;
        let mut paid = entry(2, 1, day, 2.0);
        paid.status = ApprovalStatus::PayrollApproved;
        let entries = vec![entry(3, 1, day, 1.0), approved, paid];

        assert_eq!(report_entries(&entries, false).len(), 3);
        let kept: Vec<i32> = report_entries(&entries, true).iter().map(|e| e.user_id).collect();
        assert_eq!(kept, vec![1, 2]);
    }

    #[test]
    fn employees_sharing_a_name_are_counted_separately() {
        let day = date(2024, 5, 6);
        let mut sam = entry(1, 1, day, 4.0);
        let mut other_sam = entry(2, 1, day, 1.0);
        sam.employee_name = "Sam Lee".into();
        other_sam.employee_name = "Sam Lee".into();
        assert_eq!(
            hours_by_employee(&[sam, other_sam]),
            vec![("Sam Lee".to_string(), 4.0), ("Sam Lee".to_string(), 1.0)]
        );
    }

    #[test]
    fn hours_by_employee_sorted_descending() {
        let day = date(2024, 5, 6);
        let entries = vec![entry(1, 1, day, 2.0), entry(2, 1, day, 5.0), entry(1, 2, day, 1.0)];
        assert_eq!(
            hours_by_employee(&entries),
            vec![("Employee 2".to_string(), 5.0), ("Employee 1".to_string(), 3.0)]
        );
    }

    #[test]
    fn category_totals_group_and_sort() {
        let item = |category: &str, amount: f64| ExpenseItem {
            id: 0,
            report_id: 1,
            expense_date: date(2024, 5, 6),
            category: category.into(),
            description: String::new(),
            amount,
            project_id: None,
        };
        let items = vec![item("travel", 10.0), item("meals", 4.5), item("travel", 2.0)];
        assert_eq!(
            category_totals(&items),
            vec![("meals".to_string(), 4.5), ("travel".to_string(), 12.0)]
        );
    }

    #[test]
    fn weeks_between_starts_on_monday() {
        let weeks = weeks_between(date(2024, 5, 8), date(2024, 5, 20));
        assert_eq!(weeks, vec![date(2024, 5, 6), date(2024, 5, 13), date(2024, 5, 20)]);
    }

    #[test]
    fn compliance_flags_missing_and_draft_sheets() {
        let user = |id: i32, active: bool| User {
            id,
            email: format!("e{id}@example.com"),
            full_name: format!("Employee {id}"),
            role: Role::Employee,
            client_id: Some(1),
            is_active: active,
        };
        let employees = vec![user(1, true), user(2, true), user(3, true), user(4, false)];
        let week = date(2024, 5, 6);
        let sheets = vec![
            sheet(1, week, ApprovalStatus::Submitted, 40.0),
            sheet(2, week, ApprovalStatus::Draft, 20.0),
        ];
        let report = compliance_report(&employees, &sheets, &[week]);
        assert_eq!(report.expected, 3);
        assert_eq!(report.missing.len(), 2);
        assert_eq!(report.missing[0].status, Some(ApprovalStatus::Draft));
        assert_eq!(report.missing[1].status, None);
        assert!((report.compliance_rate() - 100.0 / 3.0).abs() < 1e-9);
    }
}
