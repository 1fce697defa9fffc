use std::collections::HashMap;

use chrono::NaiveDate;
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::error::{require, ValidationError};
use crate::models::{in_week, week_end, ProjectAssignment, Project, TimeEntry, Timesheet};
use crate::reports::stats::rate_for;
use crate::ui::components::form::{parse_amount, parse_date, render_form, FormField, FormOutcome, TextForm};
use crate::ui::components::popup::render_confirmation;

/// Checks one time entry against its week and the employee's assignments,
/// returning the parsed hours.
pub fn validate_entry(
    week_start: NaiveDate,
    assignments: &[ProjectAssignment],
    user_id: i32,
    project_id: i32,
    date: NaiveDate,
    hours: f64,
) -> Result<f64, ValidationError> {
    if hours <= 0.0 || hours > 24.0 {
        return Err(ValidationError::HoursOutOfRange(hours));
    }
    if !in_week(week_start, date) {
        return Err(ValidationError::OutsideWeek { date, week_start });
    }
    if rate_for(user_id, project_id, date, assignments).is_none() {
        return Err(ValidationError::NotAssigned(date));
    }
    Ok(hours)
}

const PROJECT: usize = 0;
const DATE: usize = 1;
const HOURS: usize = 2;
const DESCRIPTION: usize = 3;

struct EntryForm {
    entry_id: i32,
    form: TextForm,
}

pub struct TimesheetEditorState {
    pub timesheet: Timesheet,
    entries: Vec<TimeEntry>,
    table_state: TableState,
    assignments: Vec<ProjectAssignment>,
    project_names: HashMap<i32, String>,
    read_only: bool,
    entry_form: Option<EntryForm>,
    show_delete_confirmation: bool,
    pub error: Option<String>,
}

pub enum TimesheetEditorAction {
    Back,
    SaveEntry(TimeEntry),
    DeleteEntry(i32),
    Submit,
}

impl TimesheetEditorState {
    /// `viewer_id` is the signed in user; anyone but the owner sees the sheet read-only.
    pub fn new(
        timesheet: Timesheet,
        entries: Vec<TimeEntry>,
        assignments: Vec<ProjectAssignment>,
        projects: &[Project],
        viewer_id: i32,
    ) -> Self {
        let read_only = viewer_id != timesheet.user_id || !timesheet.status.is_editable();
        let mut table_state = TableState::default();
        if !entries.is_empty() {
            table_state.select(Some(0));
        }
        Self {
            timesheet,
            entries,
            table_state,
            assignments,
            project_names: projects.iter().map(|p| (p.id, p.name.clone())).collect(),
            read_only,
            entry_form: None,
            show_delete_confirmation: false,
            error: None,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn total_hours(&self) -> f64 {
        self.entries.iter().map(|e| e.hours).sum()
    }

    pub fn selected_entry(&self) -> Option<&TimeEntry> {
        self.table_state.selected().and_then(|i| self.entries.get(i))
    }

    /// Projects with an assignment covering at least one day of this week
    fn project_choices(&self) -> Vec<(String, String)> {
        let start = self.timesheet.week_start;
        let end = week_end(start);
        let mut choices: Vec<(String, String)> = Vec::new();
        for assignment in &self.assignments {
            let covers_week = assignment.user_id == self.timesheet.user_id
                && assignment.start_date <= end
                && assignment.end_date.map_or(true, |e| e >= start);
            let value = assignment.project_id.to_string();
            if covers_week && !choices.iter().any(|(v, _)| *v == value) {
                let name = self
                    .project_names
                    .get(&assignment.project_id)
                    .cloned()
                    .unwrap_or_else(|| format!("Project #{}", assignment.project_id));
                choices.push((value, name));
            }
        }
        choices
    }

    fn open_form(&mut self, entry: Option<TimeEntry>) {
        let choices = self.project_choices();
        if choices.is_empty() {
            self.error = Some("No project assignments cover this week".to_string());
            return;
        }
        let (entry_id, title, fields) = match entry {
            Some(entry) => (
                entry.id,
                "Edit Time Entry",
                vec![
                    FormField::choice("Project", &entry.project_id.to_string(), choices),
                    FormField::date("Date", Some(entry.entry_date)),
                    FormField::number("Hours", format!("{}", entry.hours)),
                    FormField::text("Description", entry.description),
                ],
            ),
            None => (
                0,
                "New Time Entry",
                vec![
                    FormField::choice("Project", "", choices),
                    FormField::date("Date", Some(self.timesheet.week_start)),
                    FormField::number("Hours", ""),
                    FormField::text("Description", ""),
                ],
            ),
        };
        self.entry_form = Some(EntryForm { entry_id, form: TextForm::new(title, fields) });
    }

    fn entry_from_form(&self, entry_form: &EntryForm) -> Result<TimeEntry, ValidationError> {
        let form = &entry_form.form;
        let project_id = form.value(PROJECT).parse::<i32>().map_err(|_| ValidationError::Required("Project"))?;
        let entry_date = parse_date("Date", form.value(DATE))?;
        let hours = parse_amount("Hours", form.value(HOURS))?;
        require("Description", form.value(DESCRIPTION))?;
        let hours = validate_entry(
            self.timesheet.week_start,
            &self.assignments,
            self.timesheet.user_id,
            project_id,
            entry_date,
            hours,
        )?;

        Ok(TimeEntry {
            id: entry_form.entry_id,
            timesheet_id: self.timesheet.id,
            user_id: self.timesheet.user_id,
            project_id,
            entry_date,
            hours,
            description: form.value(DESCRIPTION).trim().to_string(),
        })
    }

    /// Shows a save error coming back from the database on the open form
    pub fn show_form_error(&mut self, message: String) {
        match &mut self.entry_form {
            Some(entry_form) => entry_form.form.error = Some(message),
            None => self.error = Some(message),
        }
    }

    fn next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let i = self.table_state.selected().map_or(0, |i| (i + 1) % self.entries.len());
        self.table_state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let len = self.entries.len();
        let i = self.table_state.selected().map_or(0, |i| (i + len - 1) % len);
        self.table_state.select(Some(i));
    }
}

pub fn render_timesheet_editor<B: Backend>(frame: &mut Frame<B>, state: &mut TimesheetEditorState) {
    if let Some(entry_form) = &state.entry_form {
        render_form(frame, &entry_form.form);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(frame.size());

    let sheet = &state.timesheet;
    let mut summary = vec![Spans::from(vec![
        Span::styled("Week: ", Style::default().fg(Color::Yellow)),
        Span::raw(format!(
            "{} to {}",
            sheet.week_start.format("%Y-%m-%d"),
            week_end(sheet.week_start).format("%Y-%m-%d")
        )),
        Span::styled("   Status: ", Style::default().fg(Color::Yellow)),
        Span::raw(sheet.status.label()),
        Span::styled("   Total: ", Style::default().fg(Color::Yellow)),
        Span::raw(format!("{:.2}h", state.total_hours())),
    ])];
    if let Some(reason) = &sheet.rejection_reason {
        summary.push(Spans::from(Span::styled(
            format!("Rejected: {}", reason),
            Style::default().fg(Color::Red),
        )));
    }
    let summary = Paragraph::new(summary).block(Block::default().title("Timesheet").borders(Borders::ALL));
    frame.render_widget(summary, chunks[0]);

    let header_cells = ["Date", "Project", "Hours", "Description"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = state.entries.iter().map(|e| {
        let project = state
            .project_names
            .get(&e.project_id)
            .cloned()
            .unwrap_or_else(|| format!("#{}", e.project_id));
        Row::new(vec![
            Cell::from(e.entry_date.format("%a %Y-%m-%d").to_string()),
            Cell::from(project),
            Cell::from(format!("{:.2}", e.hours)),
            Cell::from(e.description.as_str()),
        ])
    });

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title("Entries").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&[
            Constraint::Percentage(20),
            Constraint::Percentage(25),
            Constraint::Percentage(10),
            Constraint::Percentage(45),
        ]);
    frame.render_stateful_widget(table, chunks[1], &mut state.table_state);

    let footer = match (&state.error, state.read_only) {
        (Some(error), _) => Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
        (None, true) => Paragraph::new("Read only | <Esc> Back"),
        (None, false) => Paragraph::new("<A> Add | <E> Edit | <D> Delete | <S> Submit | <Esc> Back"),
    };
    frame.render_widget(footer.block(Block::default().borders(Borders::TOP)), chunks[2]);

    if state.show_delete_confirmation {
        render_confirmation(frame, "Confirm Delete", &["Delete this time entry?"]);
    }
}

pub fn handle_key(state: &mut TimesheetEditorState, key: KeyCode) -> Option<TimesheetEditorAction> {
    if let Some(mut entry_form) = state.entry_form.take() {
        match entry_form.form.handle_key(key) {
            FormOutcome::Cancel => {}
            FormOutcome::Save => match state.entry_from_form(&entry_form) {
                Ok(entry) => {
                    // stays open until the app confirms the write
                    state.entry_form = Some(entry_form);
                    return Some(TimesheetEditorAction::SaveEntry(entry));
                }
                Err(err) => {
                    entry_form.form.error = Some(err.to_string());
                    state.entry_form = Some(entry_form);
                }
            },
            FormOutcome::Pending => state.entry_form = Some(entry_form),
        }
        return None;
    }

    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') => {
                state.show_delete_confirmation = false;
                if let Some(entry) = state.selected_entry() {
                    return Some(TimesheetEditorAction::DeleteEntry(entry.id));
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => state.show_delete_confirmation = false,
            _ => {}
        }
        return None;
    }

    state.error = None;
    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(TimesheetEditorAction::Back),
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        KeyCode::Char('a') | KeyCode::Char('e') | KeyCode::Char('d') | KeyCode::Char('s') if state.read_only => {
            state.error = Some(format!("Timesheet is {} and cannot be changed", state.timesheet.status.label()));
        }
        KeyCode::Char('a') => state.open_form(None),
        KeyCode::Char('e') => {
            if let Some(entry) = state.selected_entry().cloned() {
                state.open_form(Some(entry));
            }
        }
        KeyCode::Char('d') => {
            if state.selected_entry().is_some() {
                state.show_delete_confirmation = true;
            }
        }
        KeyCode::Char('s') => {
            if state.entries.is_empty() {
                state.error = Some("Add at least one entry before submitting".to_string());
            } else {
                return Some(TimesheetEditorAction::Submit);
            }
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApprovalStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assignment(project_id: i32, start: NaiveDate, end: Option<NaiveDate>) -> ProjectAssignment {
        ProjectAssignment { id: project_id, user_id: 1, project_id, start_date: start, end_date: end, bill_rate: 100.0 }
    }

    fn timesheet(status: ApprovalStatus) -> Timesheet {
        Timesheet {
            id: 10,
            user_id: 1,
            week_start: date(2024, 3, 11),
            status,
            submitted_at: None,
            rejection_reason: None,
        }
    }

    fn project(id: i32, name: &str) -> Project {
        Project {
            id,
            client_id: 1,
            name: name.into(),
            description: None,
            start_date: date(2024, 1, 1),
            end_date: None,
            is_active: true,
        }
    }

    #[test]
    fn validate_entry_checks_hours_week_and_assignment() {
        let week = date(2024, 3, 11);
        let assignments = vec![assignment(5, date(2024, 3, 13), None)];

        assert_eq!(validate_entry(week, &assignments, 1, 5, date(2024, 3, 13), 8.0), Ok(8.0));
        assert_eq!(
            validate_entry(week, &assignments, 1, 5, date(2024, 3, 13), 0.0),
            Err(ValidationError::HoursOutOfRange(0.0))
        );
        assert_eq!(
            validate_entry(week, &assignments, 1, 5, date(2024, 3, 13), 24.5),
            Err(ValidationError::HoursOutOfRange(24.5))
        );
        assert_eq!(
            validate_entry(week, &assignments, 1, 5, date(2024, 3, 18), 8.0),
            Err(ValidationError::OutsideWeek { date: date(2024, 3, 18), week_start: week })
        );
        assert_eq!(
            validate_entry(week, &assignments, 1, 5, date(2024, 3, 12), 8.0),
            Err(ValidationError::NotAssigned(date(2024, 3, 12)))
        );
        assert_eq!(
            validate_entry(week, &assignments, 1, 6, date(2024, 3, 13), 8.0),
            Err(ValidationError::NotAssigned(date(2024, 3, 13)))
        );
    }

    #[test]
    fn only_assignments_touching_the_week_are_offered() {
        let state = TimesheetEditorState::new(
            timesheet(ApprovalStatus::Draft),
            vec![],
            vec![
                assignment(5, date(2024, 1, 1), Some(date(2024, 3, 11))),
                assignment(6, date(2024, 1, 1), Some(date(2024, 3, 1))),
                assignment(7, date(2024, 3, 17), None),
            ],
            &[project(5, "Alpha"), project(6, "Beta"), project(7, "Gamma")],
            1,
        );
        let names: Vec<String> = state.project_choices().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["Alpha".to_string(), "Gamma".to_string()]);
    }

    #[test]
    fn submitted_sheet_is_read_only() {
        let mut state = TimesheetEditorState::new(timesheet(ApprovalStatus::Submitted), vec![], vec![], &[], 1);
        assert!(state.is_read_only());
        assert!(handle_key(&mut state, KeyCode::Char('a')).is_none());
        assert!(state.error.is_some());
        assert!(state.entry_form.is_none());
    }

    #[test]
    fn other_users_see_draft_read_only() {
        let state = TimesheetEditorState::new(timesheet(ApprovalStatus::Draft), vec![], vec![], &[], 2);
        assert!(state.is_read_only());
    }

    #[test]
    fn add_entry_produces_save_action() {
        let mut state = TimesheetEditorState::new(
            timesheet(ApprovalStatus::Draft),
            vec![],
            vec![assignment(5, date(2024, 1, 1), None)],
            &[project(5, "Alpha")],
            1,
        );
        handle_key(&mut state, KeyCode::Char('a'));
        {
            let form = &mut state.entry_form.as_mut().unwrap().form;
            form.fields[HOURS].value = "7.5".into();
            form.fields[DESCRIPTION].value = "Design review".into();
        }
        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(TimesheetEditorAction::SaveEntry(entry)) => {
                assert_eq!(entry.id, 0);
                assert_eq!(entry.timesheet_id, 10);
                assert_eq!(entry.project_id, 5);
                assert_eq!(entry.entry_date, date(2024, 3, 11));
                assert_eq!(entry.hours, 7.5);
            }
            _ => panic!("expected SaveEntry"),
        }
    }

    #[test]
    fn empty_sheet_cannot_be_submitted() {
        let mut state = TimesheetEditorState::new(timesheet(ApprovalStatus::Draft), vec![], vec![], &[], 1);
        assert!(handle_key(&mut state, KeyCode::Char('s')).is_none());
        assert!(state.error.is_some());
    }
}
