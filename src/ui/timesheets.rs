use chrono::NaiveDate;
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::models::{week_end, week_start, TimesheetOverview};
use crate::ui::components::form::parse_date;
use crate::ui::components::popup::{render_confirmation, render_prompt, PromptOutcome, TextPrompt};
use crate::ui::components::selectable::Selectable;

pub struct TimesheetsState {
    timesheets: Selectable<TimesheetOverview>,
    today: NaiveDate,
    week_prompt: Option<TextPrompt>,
    show_delete_confirmation: bool,
    pub error: Option<String>,
}

impl TimesheetsState {
    pub fn new(mut timesheets: Vec<TimesheetOverview>, today: NaiveDate) -> Self {
        timesheets.sort_by(|a, b| b.week_start.cmp(&a.week_start));
        Self {
            timesheets: Selectable::new(timesheets),
            today,
            week_prompt: None,
            show_delete_confirmation: false,
            error: None,
        }
    }

    pub fn selected_timesheet(&self) -> Option<&TimesheetOverview> {
        self.timesheets.selected()
    }
}

pub enum TimesheetAction {
    Back,
    /// Open (creating if needed) the timesheet for the week starting on this Monday
    OpenWeek(NaiveDate),
    Open(i32),
    Submit(i32),
    Delete(i32),
}

pub fn render_timesheets<B: Backend>(frame: &mut Frame<B>, state: &mut TimesheetsState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(frame.size());

    let header_cells = ["Week", "Status", "Hours", "Submitted", "Note"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = state.timesheets.visible_rows().map(|t| {
        Row::new(vec![
            Cell::from(format!(
                "{} - {}",
                t.week_start.format("%b %d"),
                week_end(t.week_start).format("%b %d, %Y")
            )),
            Cell::from(t.status.label()),
            Cell::from(format!("{:.2}", t.total_hours)),
            Cell::from(t.submitted_at.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()),
            Cell::from(t.rejection_reason.clone().unwrap_or_default()),
        ])
    });

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title("My Timesheets").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&[
            Constraint::Percentage(25),
            Constraint::Percentage(15),
            Constraint::Percentage(10),
            Constraint::Percentage(15),
            Constraint::Percentage(35),
        ]);

    let mut table_state = state.timesheets.table_state();
    frame.render_stateful_widget(table, chunks[0], &mut table_state);

    let footer = match &state.error {
        Some(error) => Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new(
            "<N> This week | <W> Other week | <Enter> Open | <S> Submit | <D> Delete | <Esc> Back",
        )
        .style(Style::default().fg(Color::White)),
    };
    frame.render_widget(footer.block(Block::default().borders(Borders::TOP)), chunks[1]);

    if let Some(prompt) = &state.week_prompt {
        render_prompt(frame, prompt);
    }

    if state.show_delete_confirmation {
        render_confirmation(
            frame,
            "Confirm Delete",
            &["Delete this timesheet and all of its entries?"],
        );
    }
}

pub fn handle_key(state: &mut TimesheetsState, key: KeyCode) -> Option<TimesheetAction> {
    if let Some(prompt) = &mut state.week_prompt {
        match prompt.handle_key(key) {
            PromptOutcome::Submitted(value) => {
                state.week_prompt = None;
                match parse_date("Week", &value) {
                    Ok(date) => return Some(TimesheetAction::OpenWeek(week_start(date))),
                    Err(err) => state.error = Some(err.to_string()),
                }
            }
            PromptOutcome::Cancelled => state.week_prompt = None,
            PromptOutcome::Pending => {}
        }
        return None;
    }

    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') => {
                state.show_delete_confirmation = false;
                if let Some(sheet) = state.selected_timesheet() {
                    return Some(TimesheetAction::Delete(sheet.id));
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => state.show_delete_confirmation = false,
            _ => {}
        }
        return None;
    }

    state.error = None;
    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(TimesheetAction::Back),
        KeyCode::Char('n') => return Some(TimesheetAction::OpenWeek(week_start(state.today))),
        KeyCode::Char('w') => {
            state.week_prompt = Some(TextPrompt::new("Any date in the week (YYYY-MM-DD)", ""));
        }
        KeyCode::Enter => {
            if let Some(sheet) = state.selected_timesheet() {
                return Some(TimesheetAction::Open(sheet.id));
            }
        }
        KeyCode::Char('s') => match state.selected_timesheet() {
            Some(sheet) if sheet.status.is_editable() => return Some(TimesheetAction::Submit(sheet.id)),
            Some(sheet) => state.error = Some(format!("This timesheet is already {}", sheet.status.label())),
            None => {}
        },
        KeyCode::Char('d') => match state.selected_timesheet() {
            Some(sheet) if sheet.status.is_editable() => state.show_delete_confirmation = true,
            Some(_) => state.error = Some("Only draft or rejected timesheets can be deleted".to_string()),
            None => {}
        },
        KeyCode::Down => state.timesheets.next(),
        KeyCode::Up => state.timesheets.previous(),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApprovalStatus;

    fn sheet(id: i32, week: NaiveDate, status: ApprovalStatus) -> TimesheetOverview {
        TimesheetOverview {
            id,
            user_id: 1,
            week_start: week,
            status,
            submitted_at: None,
            rejection_reason: None,
            employee_name: "Ada".into(),
            employee_email: "ada@example.com".into(),
            client_id: None,
            total_hours: 8.0,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_week_opens_monday_of_today() {
        let mut state = TimesheetsState::new(vec![], date(2024, 3, 14));
        match handle_key(&mut state, KeyCode::Char('n')) {
            Some(TimesheetAction::OpenWeek(week)) => assert_eq!(week, date(2024, 3, 11)),
            _ => panic!("expected OpenWeek"),
        }
    }

    #[test]
    fn most_recent_week_is_listed_first() {
        let state = TimesheetsState::new(
            vec![
                sheet(1, date(2024, 3, 4), ApprovalStatus::Draft),
                sheet(2, date(2024, 3, 11), ApprovalStatus::Draft),
            ],
            date(2024, 3, 14),
        );
        assert_eq!(state.selected_timesheet().map(|t| t.id), Some(2));
    }

    #[test]
    fn submitted_sheet_cannot_be_submitted_or_deleted() {
        let mut state = TimesheetsState::new(
            vec![sheet(1, date(2024, 3, 4), ApprovalStatus::Submitted)],
            date(2024, 3, 14),
        );
        assert!(handle_key(&mut state, KeyCode::Char('s')).is_none());
        assert!(state.error.is_some());
        assert!(handle_key(&mut state, KeyCode::Char('d')).is_none());
        assert!(!state.show_delete_confirmation);
    }

    #[test]
    fn other_week_prompt_normalises_to_monday() {
        let mut state = TimesheetsState::new(vec![], date(2024, 3, 14));
        handle_key(&mut state, KeyCode::Char('w'));
        for c in "2024-02-29".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        match handle_key(&mut state, KeyCode::Enter) {
            Some(TimesheetAction::OpenWeek(week)) => assert_eq!(week, date(2024, 2, 26)),
            _ => panic!("expected OpenWeek"),
        }
    }
}
