use std::collections::HashMap;

use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::models::{Client, User};
use crate::ui::components::popup::{render_confirmation, render_prompt, PromptOutcome, TextPrompt};
use crate::ui::components::selectable::Selectable;

pub struct EmployeesState {
    users: Selectable<User>,
    client_names: HashMap<i32, String>,
    search: Option<TextPrompt>,
    show_toggle_confirmation: bool,
    /// Signed in admin; they cannot deactivate themselves
    current_user_id: i32,
}

impl EmployeesState {
    pub fn new(current_user_id: i32, users: Vec<User>, clients: &[Client]) -> Self {
        Self {
            users: Selectable::new(users),
            client_names: clients.iter().map(|c| (c.id, c.name.clone())).collect(),
            search: None,
            show_toggle_confirmation: false,
            current_user_id,
        }
    }

    pub fn selected_user(&self) -> Option<&User> {
        self.users.selected()
    }
}

pub enum EmployeeAction {
    Back,
    NewEmployee,
    EditEmployee(User),
    SetActive(i32, bool),
}

pub fn render_employees<B: Backend>(frame: &mut Frame<B>, state: &mut EmployeesState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(frame.size());

    let header_cells = ["Name", "Email", "Role", "Client", "Status"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = state.users.visible_rows().map(|user| {
        let client = user
            .client_id
            .and_then(|id| state.client_names.get(&id))
            .map_or("-", |name| name.as_str());
        let style = if user.is_active {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Row::new(vec![
            Cell::from(user.full_name.as_str()),
            Cell::from(user.email.as_str()),
            Cell::from(user.role.as_str()),
            Cell::from(client),
            Cell::from(if user.is_active { "Active" } else { "Inactive" }),
        ])
        .style(style)
    });

    let title = format!("Employees ({})", state.users.filter.describe());
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
            Constraint::Percentage(25),
            Constraint::Percentage(30),
            Constraint::Percentage(12),
            Constraint::Percentage(20),
            Constraint::Percentage(13),
        ]);

    let mut table_state = state.users.table_state();
    frame.render_stateful_widget(table, chunks[0], &mut table_state);

    let buttons = Paragraph::new("<N> New | <E> Edit | <D> Activate/Deactivate | </> Search | <Esc> Back")
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[1]);

    if let Some(prompt) = &state.search {
        render_prompt(frame, prompt);
    }

    if state.show_toggle_confirmation {
        if let Some(user) = state.selected_user() {
            let question = if user.is_active {
                "Deactivate this employee? They will no longer be able to sign in."
            } else {
                "Reactivate this employee?"
            };
            render_confirmation(frame, "Confirm", &[question]);
        }
    }
}

pub fn handle_key(state: &mut EmployeesState, key: KeyCode) -> Option<EmployeeAction> {
    if let Some(prompt) = &mut state.search {
        match prompt.handle_key(key) {
            PromptOutcome::Submitted(query) => {
                state.users.set_query(&query);
                state.search = None;
            }
            PromptOutcome::Cancelled => state.search = None,
            PromptOutcome::Pending => {}
        }
        return None;
    }

    if state.show_toggle_confirmation {
        match key {
            KeyCode::Char('y') => {
                state.show_toggle_confirmation = false;
                if let Some(user) = state.selected_user() {
                    return Some(EmployeeAction::SetActive(user.id, !user.is_active));
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => state.show_toggle_confirmation = false,
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(EmployeeAction::Back),
        KeyCode::Char('n') => return Some(EmployeeAction::NewEmployee),
        KeyCode::Char('e') => {
            if let Some(user) = state.selected_user() {
                return Some(EmployeeAction::EditEmployee(user.clone()));
            }
        }
        KeyCode::Char('d') => {
            if state.selected_user().map_or(false, |u| u.id != state.current_user_id) {
                state.show_toggle_confirmation = true;
            }
        }
        KeyCode::Char('/') => {
            state.search = Some(TextPrompt::new("Search employees", &state.users.filter.query));
        }
        KeyCode::Down => state.users.next(),
        KeyCode::Up => state.users.previous(),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user(id: i32, name: &str, role: Role) -> User {
        User {
            id,
            email: format!("{}@example.com", name.to_lowercase()),
            full_name: name.into(),
            role,
            client_id: None,
            is_active: true,
        }
    }

    #[test]
    fn admin_cannot_deactivate_self() {
        let mut state = EmployeesState::new(1, vec![user(1, "Admin", Role::Admin), user(2, "Ada", Role::Employee)], &[]);
        handle_key(&mut state, KeyCode::Char('d'));
        assert!(!state.show_toggle_confirmation);

        handle_key(&mut state, KeyCode::Down);
        handle_key(&mut state, KeyCode::Char('d'));
        assert!(matches!(handle_key(&mut state, KeyCode::Char('y')), Some(EmployeeAction::SetActive(2, false))));
    }

    #[test]
    fn search_matches_role() {
        let mut state = EmployeesState::new(1, vec![user(1, "Admin", Role::Admin), user(2, "Ada", Role::Manager)], &[]);
        state.users.set_query("manager");
        assert_eq!(state.users.visible_len(), 1);
        assert_eq!(state.selected_user().map(|u| u.id), Some(2));
    }
}
