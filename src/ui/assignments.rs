use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::models::AssignmentOverview;
use crate::ui::components::popup::{render_confirmation, render_prompt, PromptOutcome, TextPrompt};
use crate::ui::components::selectable::Selectable;

pub struct AssignmentsState {
    assignments: Selectable<AssignmentOverview>,
    search: Option<TextPrompt>,
    show_delete_confirmation: bool,
}

impl AssignmentsState {
    pub fn new(assignments: Vec<AssignmentOverview>) -> Self {
        Self {
            assignments: Selectable::new(assignments),
            search: None,
            show_delete_confirmation: false,
        }
    }

    pub fn selected_assignment(&self) -> Option<&AssignmentOverview> {
        self.assignments.selected()
    }
}

pub enum AssignmentAction {
    Back,
    NewAssignment,
    EditAssignment(AssignmentOverview),
    DeleteAssignment(i32),
}

pub fn render_assignments<B: Backend>(frame: &mut Frame<B>, state: &mut AssignmentsState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(frame.size());

    let header_cells = ["Employee", "Project", "Client", "From", "To", "Rate"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = state.assignments.visible_rows().map(|a| {
        Row::new(vec![
            Cell::from(a.employee_name.as_str()),
            Cell::from(a.project_name.as_str()),
            Cell::from(a.client_name.as_str()),
            Cell::from(a.start_date.format("%Y-%m-%d").to_string()),
            Cell::from(a.end_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "open".into())),
            Cell::from(format!("${:.2}/h", a.bill_rate)),
        ])
    });

    let title = format!("Project Assignments ({})", state.assignments.filter.describe());
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
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(18),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
        ]);

    let mut table_state = state.assignments.table_state();
    frame.render_stateful_widget(table, chunks[0], &mut table_state);

    let buttons = Paragraph::new("<N> New | <E> Edit | <D> Delete | </> Search | <Esc> Back")
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[1]);

    if let Some(prompt) = &state.search {
        render_prompt(frame, prompt);
    }

    if state.show_delete_confirmation {
        render_confirmation(
            frame,
            "Confirm Delete",
            &["Delete this assignment?", "Existing time entries keep their hours but lose their bill rate."],
        );
    }
}

pub fn handle_key(state: &mut AssignmentsState, key: KeyCode) -> Option<AssignmentAction> {
    if let Some(prompt) = &mut state.search {
        match prompt.handle_key(key) {
            PromptOutcome::Submitted(query) => {
                state.assignments.set_query(&query);
                state.search = None;
            }
            PromptOutcome::Cancelled => state.search = None,
            PromptOutcome::Pending => {}
        }
        return None;
    }

    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') => {
                state.show_delete_confirmation = false;
                if let Some(assignment) = state.selected_assignment() {
                    return Some(AssignmentAction::DeleteAssignment(assignment.id));
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => state.show_delete_confirmation = false,
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(AssignmentAction::Back),
        KeyCode::Char('n') => return Some(AssignmentAction::NewAssignment),
        KeyCode::Char('e') => {
            if let Some(assignment) = state.selected_assignment() {
                return Some(AssignmentAction::EditAssignment(assignment.clone()));
            }
        }
        KeyCode::Char('d') => {
            if state.selected_assignment().is_some() {
                state.show_delete_confirmation = true;
            }
        }
        KeyCode::Char('/') => {
            state.search = Some(TextPrompt::new("Search assignments", &state.assignments.filter.query));
        }
        KeyCode::Down => state.assignments.next(),
        KeyCode::Up => state.assignments.previous(),
        _ => {}
    }
    None
}
