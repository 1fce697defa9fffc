use chrono::{Duration, NaiveDate};
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::models::{ApprovalStatus, TimesheetOverview};
use crate::reports::filter::ListFilter;
use crate::reports::stats::TimesheetStats;
use crate::ui::components::popup::{render_prompt, PromptOutcome, TextPrompt};
use crate::ui::components::selectable::Selectable;
use crate::workflow::ApprovalAction;

enum Prompt {
    Search(TextPrompt),
    Reason(TextPrompt),
}

pub struct AdminTimesheetsState {
    timesheets: Selectable<TimesheetOverview>,
    /// Week starts loaded from the database, inclusive
    pub from: NaiveDate,
    pub to: NaiveDate,
    prompt: Option<Prompt>,
}

/// Range and filter to come back to after viewing a sheet
#[derive(Debug, Clone)]
pub struct AdminView {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub filter: ListFilter,
}

pub enum AdminTimesheetAction {
    Back,
    /// Load the timesheets whose week starts inside the new range
    Reload { from: NaiveDate, to: NaiveDate },
    Open(i32),
    Export(Vec<TimesheetOverview>),
    Transition(Vec<i32>, ApprovalAction),
}

impl AdminTimesheetsState {
    pub fn new(timesheets: Vec<TimesheetOverview>, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            timesheets: Selectable::new(timesheets),
            from,
            to,
            prompt: None,
        }
    }

    pub fn restore(timesheets: Vec<TimesheetOverview>, view: AdminView) -> Self {
        Self {
            timesheets: Selectable::with_filter(timesheets, view.filter),
            from: view.from,
            to: view.to,
            prompt: None,
        }
    }

    pub fn view(&self) -> AdminView {
        AdminView { from: self.from, to: self.to, filter: self.timesheets.filter.clone() }
    }

    /// Keeps the search and status filter when the rows are reloaded
    pub fn replace_rows(&mut self, timesheets: Vec<TimesheetOverview>, from: NaiveDate, to: NaiveDate) {
        let filter = self.timesheets.filter.clone();
        self.timesheets = Selectable::with_filter(timesheets, filter);
        self.from = from;
        self.to = to;
    }

    pub fn stats(&self) -> TimesheetStats {
        TimesheetStats::from_rows(self.timesheets.visible_rows())
    }

    /// Ids of the marked (or highlighted) timesheets that are awaiting approval
    fn pending_targets(&self) -> Vec<i32> {
        self.timesheets
            .marked_or_selected()
            .into_iter()
            .filter(|t| t.status.is_pending())
            .map(|t| t.id)
            .collect()
    }

    fn shift_range(&self, forward: bool) -> (NaiveDate, NaiveDate) {
        let span = (self.to - self.from) + Duration::days(7);
        if forward {
            (self.from + span, self.to + span)
        } else {
            (self.from - span, self.to - span)
        }
    }
}

pub fn render_admin_timesheets<B: Backend>(frame: &mut Frame<B>, state: &mut AdminTimesheetsState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(frame.size());

    let stats = state.stats();
    let summary = Paragraph::new(format!(
        "Sheets: {}   Hours: {:.1}   Pending: {}   Approved: {}   Rejected: {}   Approval rate: {:.1}%   Marked: {}",
        stats.count,
        stats.total_hours,
        stats.pending,
        stats.approved,
        stats.rejected,
        stats.approval_rate,
        state.timesheets.marked_count()
    ))
    .block(Block::default().title("Summary").borders(Borders::ALL));
    frame.render_widget(summary, chunks[0]);

    let header_cells = ["", "Employee", "Email", "Week", "Status", "Hours"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let marks: Vec<bool> = (0..state.timesheets.visible_len()).map(|i| state.timesheets.is_marked(i)).collect();
    let rows = state.timesheets.visible_rows().zip(marks).map(|(t, marked)| {
        let status_style = match t.status {
            ApprovalStatus::Rejected => Style::default().fg(Color::Red),
            ApprovalStatus::PayrollApproved => Style::default().fg(Color::Green),
            _ => Style::default(),
        };
        Row::new(vec![
            Cell::from(if marked { "[x]" } else { "[ ]" }),
            Cell::from(t.employee_name.as_str()),
            Cell::from(t.employee_email.as_str()),
            Cell::from(t.week_start.format("%Y-%m-%d").to_string()),
            Cell::from(t.status.label()).style(status_style),
            Cell::from(format!("{:.2}", t.total_hours)),
        ])
    });

    let title = format!(
        "Timesheets {} to {} ({})",
        state.from,
        state.to,
        state.timesheets.filter.describe()
    );
    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&[
            Constraint::Length(4),
            Constraint::Percentage(25),
            Constraint::Percentage(30),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(10),
        ]);

    let mut table_state = state.timesheets.table_state();
    frame.render_stateful_widget(table, chunks[1], &mut table_state);

    let footer = Paragraph::new(
        "<Space> Mark | <*> Mark all | </> Search | <F> Status | <[ ]> Range | <X> Export | <A> Approve | <R> Reject | <Enter> View | <Esc> Back",
    )
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    match &state.prompt {
        Some(Prompt::Search(prompt)) | Some(Prompt::Reason(prompt)) => render_prompt(frame, prompt),
        None => {}
    }
}

pub fn handle_key(state: &mut AdminTimesheetsState, key: KeyCode) -> Option<AdminTimesheetAction> {
    if let Some(prompt) = state.prompt.take() {
        match prompt {
            Prompt::Search(mut search) => match search.handle_key(key) {
                PromptOutcome::Submitted(query) => state.timesheets.set_query(&query),
                PromptOutcome::Cancelled => {}
                PromptOutcome::Pending => state.prompt = Some(Prompt::Search(search)),
            },
            Prompt::Reason(mut reason) => match reason.handle_key(key) {
                PromptOutcome::Submitted(reason) => {
                    let targets = state.pending_targets();
                    if !targets.is_empty() {
                        return Some(AdminTimesheetAction::Transition(targets, ApprovalAction::Reject(reason)));
                    }
                }
                PromptOutcome::Cancelled => {}
                PromptOutcome::Pending => state.prompt = Some(Prompt::Reason(reason)),
            },
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(AdminTimesheetAction::Back),
        KeyCode::Down => state.timesheets.next(),
        KeyCode::Up => state.timesheets.previous(),
        KeyCode::Char(' ') => {
            state.timesheets.toggle_mark();
            state.timesheets.next();
        }
        KeyCode::Char('*') => state.timesheets.mark_all_visible(),
        KeyCode::Char('/') => {
            state.prompt = Some(Prompt::Search(TextPrompt::new(
                "Search timesheets",
                &state.timesheets.filter.query,
            )));
        }
        KeyCode::Char('f') => {
            let mut filter = state.timesheets.filter.clone();
            filter.status = ApprovalStatus::cycle_filter(filter.status);
            state.timesheets.set_filter(filter);
        }
        KeyCode::Char('[') | KeyCode::Char(']') => {
            let (from, to) = state.shift_range(key == KeyCode::Char(']'));
            return Some(AdminTimesheetAction::Reload { from, to });
        }
        KeyCode::Char('x') => {
            let rows: Vec<TimesheetOverview> = state.timesheets.marked_or_selected().into_iter().cloned().collect();
            if !rows.is_empty() {
                return Some(AdminTimesheetAction::Export(rows));
            }
        }
        KeyCode::Char('a') => {
            let targets = state.pending_targets();
            if !targets.is_empty() {
                return Some(AdminTimesheetAction::Transition(targets, ApprovalAction::Approve));
            }
        }
        KeyCode::Char('r') => {
            if !state.pending_targets().is_empty() {
                state.prompt = Some(Prompt::Reason(TextPrompt::new("Reason for rejection", "")));
            }
        }
        KeyCode::Enter => {
            if let Some(sheet) = state.timesheets.selected() {
                return Some(AdminTimesheetAction::Open(sheet.id));
            }
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sheet(id: i32, name: &str, status: ApprovalStatus) -> TimesheetOverview {
        TimesheetOverview {
            id,
            user_id: id,
            week_start: date(2024, 3, 11),
            status,
            submitted_at: None,
            rejection_reason: None,
            employee_name: name.into(),
            employee_email: format!("{}@example.com", name.to_lowercase()),
            client_id: Some(1),
            total_hours: 10.0 * id as f64,
        }
    }

    fn state() -> AdminTimesheetsState {
        AdminTimesheetsState::new(
            vec![
                sheet(1, "Ada", ApprovalStatus::Submitted),
                sheet(2, "Grace", ApprovalStatus::Draft),
                sheet(3, "Linus", ApprovalStatus::ClientApproved),
            ],
            date(2024, 3, 4),
            date(2024, 3, 11),
        )
    }

    #[test]
    fn export_takes_marked_rows() {
        let mut state = state();
        handle_key(&mut state, KeyCode::Char(' '));
        handle_key(&mut state, KeyCode::Char(' '));
        match handle_key(&mut state, KeyCode::Char('x')) {
            Some(AdminTimesheetAction::Export(rows)) => {
                assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
            }
            _ => panic!("expected Export"),
        }
    }

    #[test]
    fn export_without_marks_uses_highlighted_row() {
        let mut state = state();
        match handle_key(&mut state, KeyCode::Char('x')) {
            Some(AdminTimesheetAction::Export(rows)) => assert_eq!(rows.len(), 1),
            _ => panic!("expected Export"),
        }
    }

    #[test]
    fn approve_skips_rows_that_are_not_pending() {
        let mut state = state();
        handle_key(&mut state, KeyCode::Char('*'));
        match handle_key(&mut state, KeyCode::Char('a')) {
            Some(AdminTimesheetAction::Transition(ids, ApprovalAction::Approve)) => assert_eq!(ids, vec![1, 3]),
            _ => panic!("expected Transition"),
        }
    }

    #[test]
    fn status_filter_updates_stats() {
        let mut state = state();
        handle_key(&mut state, KeyCode::Char('f'));
        assert_eq!(state.timesheets.filter.status, Some(ApprovalStatus::Draft));
        let stats = state.stats();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.total_hours, 20.0);
    }

    #[test]
    fn restoring_a_view_keeps_range_and_filter() {
        let mut state = state();
        handle_key(&mut state, KeyCode::Char('f'));
        handle_key(&mut state, KeyCode::Char('f'));
        let view = state.view();

        let rows = vec![
            sheet(1, "Ada", ApprovalStatus::Submitted),
            sheet(2, "Grace", ApprovalStatus::Draft),
            sheet(4, "Ken", ApprovalStatus::Submitted),
        ];
        let restored = AdminTimesheetsState::restore(rows, view);
        assert_eq!((restored.from, restored.to), (date(2024, 3, 4), date(2024, 3, 11)));
        assert_eq!(restored.timesheets.filter.status, Some(ApprovalStatus::Submitted));
        assert_eq!(restored.stats().count, 2);
    }

    #[test]
    fn range_moves_by_its_own_length() {
        let mut state = state();
        match handle_key(&mut state, KeyCode::Char(']')) {
            Some(AdminTimesheetAction::Reload { from, to }) => {
                assert_eq!(from, date(2024, 3, 18));
                assert_eq!(to, date(2024, 3, 25));
            }
            _ => panic!("expected Reload"),
        }
    }

    #[test]
    fn search_narrows_rows() {
        let mut state = state();
        handle_key(&mut state, KeyCode::Char('/'));
        for c in "lin".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        handle_key(&mut state, KeyCode::Enter);
        assert_eq!(state.timesheets.visible_len(), 1);
        assert_eq!(state.timesheets.selected().map(|t| t.id), Some(3));
    }
}
