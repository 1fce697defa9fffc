use chrono::{Duration, NaiveDate};
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Spans,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs},
    Frame,
};

use crate::models::{ProjectAssignment, TimeEntryDetail, TimesheetOverview, User};
use crate::reports::stats::{
    billing_report, compliance_report, hours_by_employee, report_entries, weeks_between, BillingLine, ComplianceReport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Billing,
    Compliance,
    EmployeeHours,
}

impl ReportKind {
    fn next(self) -> Self {
        match self {
            ReportKind::Billing => ReportKind::Compliance,
            ReportKind::Compliance => ReportKind::EmployeeHours,
            ReportKind::EmployeeHours => ReportKind::Billing,
        }
    }

    fn index(self) -> usize {
        match self {
            ReportKind::Billing => 0,
            ReportKind::Compliance => 1,
            ReportKind::EmployeeHours => 2,
        }
    }
}

/// Rows every report on this screen is computed from. For managers the
/// loader limits them to the manager's client.
#[derive(Default)]
pub struct ReportData {
    pub entries: Vec<TimeEntryDetail>,
    pub assignments: Vec<ProjectAssignment>,
    pub employees: Vec<User>,
    pub timesheets: Vec<TimesheetOverview>,
}

pub struct ReportsState {
    pub title: String,
    pub kind: ReportKind,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub approved_only: bool,
    data: ReportData,
    table_state: TableState,
}

pub enum ReportExport {
    Billing(Vec<BillingLine>),
    Compliance(ComplianceReport),
    Entries(Vec<TimeEntryDetail>),
}

pub enum ReportAction {
    Back,
    Reload { from: NaiveDate, to: NaiveDate },
    Export(ReportExport),
}

impl ReportsState {
    pub fn new(title: impl Into<String>, data: ReportData, from: NaiveDate, to: NaiveDate) -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));
        Self {
            title: title.into(),
            kind: ReportKind::Billing,
            from,
            to,
            approved_only: false,
            data,
            table_state,
        }
    }

    pub fn replace_data(&mut self, data: ReportData, from: NaiveDate, to: NaiveDate) {
        self.data = data;
        self.from = from;
        self.to = to;
        self.table_state.select(Some(0));
    }

    pub fn entries(&self) -> Vec<TimeEntryDetail> {
        report_entries(&self.data.entries, self.approved_only)
    }

    pub fn billing(&self) -> Vec<BillingLine> {
        billing_report(&self.entries(), &self.data.assignments)
    }

    pub fn compliance(&self) -> ComplianceReport {
        let weeks = weeks_between(self.from, self.to);
        compliance_report(&self.data.employees, &self.data.timesheets, &weeks)
    }

    pub fn employee_hours(&self) -> Vec<(String, f64)> {
        hours_by_employee(&self.entries())
    }

    fn row_count(&self) -> usize {
        match self.kind {
            ReportKind::Billing => self.billing().len(),
            ReportKind::Compliance => self.compliance().missing.len(),
            ReportKind::EmployeeHours => self.employee_hours().len(),
        }
    }

    fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = self.table_state.selected().map_or(0, |i| (i + 1) % len);
        self.table_state.select(Some(i));
    }

    fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = self.table_state.selected().map_or(0, |i| (i + len - 1) % len);
        self.table_state.select(Some(i));
    }

    fn shifted(&self, forward: bool) -> (NaiveDate, NaiveDate) {
        let span = (self.to - self.from) + Duration::days(1);
        if forward {
            (self.from + span, self.to + span)
        } else {
            (self.from - span, self.to - span)
        }
    }
}

fn header(cells: &[&'static str]) -> Row<'static> {
    Row::new(
        cells
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)))
            .collect::<Vec<_>>(),
    )
    .bottom_margin(1)
}

pub fn render_reports<B: Backend>(frame: &mut Frame<B>, state: &mut ReportsState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(frame.size());

    let tabs = Tabs::new(vec![
        Spans::from("Billing"),
        Spans::from("Compliance"),
        Spans::from("Employee Hours"),
    ])
    .block(Block::default().title(state.title.as_str()).borders(Borders::ALL))
    .select(state.kind.index())
    .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[0]);

    let highlight = Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let range = format!(
        "{} to {}{}",
        state.from,
        state.to,
        if state.approved_only { " (approved hours only)" } else { "" }
    );

    match state.kind {
        ReportKind::Billing => {
            let lines = state.billing();
            let hours: f64 = lines.iter().map(|l| l.hours).sum();
            let amount: f64 = lines.iter().map(|l| l.billable_amount).sum();
            let unrated: f64 = lines.iter().map(|l| l.unrated_hours).sum();
            let summary = Paragraph::new(format!(
                "{}   Hours: {:.2}   Billable: ${:.2}   Unrated hours: {:.2}",
                range, hours, amount, unrated
            ))
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(summary, chunks[1]);

            let rows = lines.iter().map(|l| {
                Row::new(vec![
                    Cell::from(l.client_name.clone()),
                    Cell::from(l.project_name.clone()),
                    Cell::from(format!("{:.2}", l.hours)),
                    Cell::from(format!("${:.2}", l.billable_amount)),
                    Cell::from(format!("{:.2}", l.unrated_hours)),
                ])
            });
            let table = Table::new(rows)
                .header(header(&["Client", "Project", "Hours", "Billable", "Unrated"]))
                .block(Block::default().borders(Borders::ALL))
                .highlight_style(highlight)
                .widths(&[
                    Constraint::Percentage(25),
                    Constraint::Percentage(30),
                    Constraint::Percentage(15),
                    Constraint::Percentage(15),
                    Constraint::Percentage(15),
                ]);
            frame.render_stateful_widget(table, chunks[2], &mut state.table_state);
        }
        ReportKind::Compliance => {
            let report = state.compliance();
            let summary = Paragraph::new(format!(
                "{}   Expected: {}   Missing: {}   Compliance: {:.1}%",
                range,
                report.expected,
                report.missing.len(),
                report.compliance_rate()
            ))
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(summary, chunks[1]);

            let rows = report.missing.iter().map(|line| {
                Row::new(vec![
                    Cell::from(line.employee_name.clone()),
                    Cell::from(line.employee_email.clone()),
                    Cell::from(line.week_start.format("%Y-%m-%d").to_string()),
                    Cell::from(line.status.map_or("missing", |s| s.label())),
                ])
            });
            let table = Table::new(rows)
                .header(header(&["Employee", "Email", "Week", "Status"]))
                .block(Block::default().borders(Borders::ALL))
                .highlight_style(highlight)
                .widths(&[
                    Constraint::Percentage(30),
                    Constraint::Percentage(35),
                    Constraint::Percentage(15),
                    Constraint::Percentage(20),
                ]);
            frame.render_stateful_widget(table, chunks[2], &mut state.table_state);
        }
        ReportKind::EmployeeHours => {
            let rows_data = state.employee_hours();
            let total: f64 = rows_data.iter().map(|(_, h)| h).sum();
            let summary = Paragraph::new(format!("{}   Employees: {}   Hours: {:.2}", range, rows_data.len(), total))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(summary, chunks[1]);

            let rows = rows_data.iter().map(|(name, hours)| {
                Row::new(vec![Cell::from(name.clone()), Cell::from(format!("{:.2}", hours))])
            });
            let table = Table::new(rows)
                .header(header(&["Employee", "Hours"]))
                .block(Block::default().borders(Borders::ALL))
                .highlight_style(highlight)
                .widths(&[Constraint::Percentage(70), Constraint::Percentage(30)]);
            frame.render_stateful_widget(table, chunks[2], &mut state.table_state);
        }
    }

    let footer = Paragraph::new("<Tab> Report | <[ ]> Range | <P> Approved only | <X> Export | <E> Export entries | <Esc> Back")
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);
}

pub fn handle_key(state: &mut ReportsState, key: KeyCode) -> Option<ReportAction> {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(ReportAction::Back),
        KeyCode::Tab => {
            state.kind = state.kind.next();
            state.table_state.select(Some(0));
        }
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        KeyCode::Char('p') => state.approved_only = !state.approved_only,
        KeyCode::Char('[') | KeyCode::Char(']') => {
            let (from, to) = state.shifted(key == KeyCode::Char(']'));
            return Some(ReportAction::Reload { from, to });
        }
        KeyCode::Char('x') => {
            let export = match state.kind {
                ReportKind::Billing => ReportExport::Billing(state.billing()),
                ReportKind::Compliance => ReportExport::Compliance(state.compliance()),
                ReportKind::EmployeeHours => ReportExport::Entries(state.entries()),
            };
            return Some(ReportAction::Export(export));
        }
        KeyCode::Char('e') => return Some(ReportAction::Export(ReportExport::Entries(state.entries()))),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApprovalStatus, Role};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(user_id: i32, hours: f64, status: ApprovalStatus) -> TimeEntryDetail {
        TimeEntryDetail {
            id: 0,
            timesheet_id: 0,
            user_id,
            project_id: 1,
            entry_date: date(2024, 3, 12),
            hours,
            description: String::new(),
            employee_name: format!("Employee {user_id}"),
            project_name: "Engine".into(),
            client_id: 1,
            client_name: "Acme".into(),
            status,
        }
    }

    fn data() -> ReportData {
        ReportData {
            entries: vec![
                entry(1, 8.0, ApprovalStatus::PayrollApproved),
                entry(2, 4.0, ApprovalStatus::Submitted),
            ],
            assignments: vec![ProjectAssignment {
                id: 1,
                user_id: 1,
                project_id: 1,
                start_date: date(2024, 1, 1),
                end_date: None,
                bill_rate: 100.0,
            }],
            employees: vec![User {
                id: 1,
                email: "e1@example.com".into(),
                full_name: "Employee 1".into(),
                role: Role::Employee,
                client_id: Some(1),
                is_active: true,
            }],
            timesheets: vec![],
        }
    }

    #[test]
    fn approved_only_drops_pending_hours() {
        let mut state = ReportsState::new("System Reports", data(), date(2024, 3, 11), date(2024, 3, 17));
        let all = state.billing();
        assert_eq!(all[0].hours, 12.0);
        assert_eq!(all[0].billable_amount, 800.0);
        assert_eq!(all[0].unrated_hours, 4.0);

        handle_key(&mut state, KeyCode::Char('p'));
        let approved = state.billing();
        assert_eq!(approved[0].hours, 8.0);
        assert_eq!(approved[0].unrated_hours, 0.0);
    }

    #[test]
    fn compliance_counts_each_week_in_range() {
        let state = ReportsState::new("System Reports", data(), date(2024, 3, 4), date(2024, 3, 17));
        let report = state.compliance();
        assert_eq!(report.expected, 2);
        assert_eq!(report.missing.len(), 2);
        assert_eq!(report.compliance_rate(), 0.0);
    }

    #[test]
    fn range_shift_keeps_length() {
        let mut state = ReportsState::new("System Reports", data(), date(2024, 3, 11), date(2024, 3, 17));
        match handle_key(&mut state, KeyCode::Char('[')) {
            Some(ReportAction::Reload { from, to }) => {
                assert_eq!(from, date(2024, 3, 4));
                assert_eq!(to, date(2024, 3, 10));
            }
            _ => panic!("expected Reload"),
        }
    }

    #[test]
    fn export_follows_the_active_report() {
        let mut state = ReportsState::new("System Reports", data(), date(2024, 3, 11), date(2024, 3, 17));
        handle_key(&mut state, KeyCode::Tab);
        assert!(matches!(
            handle_key(&mut state, KeyCode::Char('x')),
            Some(ReportAction::Export(ReportExport::Compliance(_)))
        ));
    }
}
