use std::collections::HashMap;

use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::models::{Client, Project};
use crate::ui::components::popup::{render_confirmation, render_prompt, PromptOutcome, TextPrompt};
use crate::ui::components::selectable::Selectable;

// Represents the state of the project management screen
pub struct ProjectsState {
    /// Set when the screen was opened from a client
    scope: Option<Client>,
    client_names: HashMap<i32, String>,
    projects: Selectable<Project>,
    search: Option<TextPrompt>,
    show_toggle_confirmation: bool,
}

impl ProjectsState {
    pub fn new(scope: Option<Client>, clients: &[Client], projects: Vec<Project>) -> Self {
        let projects = match &scope {
            Some(client) => projects.into_iter().filter(|p| p.client_id == client.id).collect(),
            None => projects,
        };

        Self {
            scope,
            client_names: clients.iter().map(|c| (c.id, c.name.clone())).collect(),
            projects: Selectable::new(projects),
            search: None,
            show_toggle_confirmation: false,
        }
    }

    pub fn scope(&self) -> Option<&Client> {
        self.scope.as_ref()
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.projects.selected()
    }

    fn client_name(&self, client_id: i32) -> &str {
        self.client_names.get(&client_id).map_or("?", |name| name.as_str())
    }
}

pub enum ProjectAction {
    Back,
    NewProject(Option<i32>), // Preselected client_id
    EditProject(Project),
    SetActive(i32, bool),
}

pub fn render_projects<B: Backend>(frame: &mut Frame<B>, state: &mut ProjectsState) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(size);

    let header_cells = ["Name", "Client", "Start", "End", "Status"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = state.projects.visible_rows().map(|project| {
        let style = if project.is_active {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Row::new(vec![
            Cell::from(project.name.as_str()),
            Cell::from(state.client_name(project.client_id)),
            Cell::from(project.start_date.format("%Y-%m-%d").to_string()),
            Cell::from(project.end_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".into())),
            Cell::from(if project.is_active { "Active" } else { "Inactive" }),
        ])
        .style(style)
    });

    let title = match &state.scope {
        Some(client) => format!("Projects for {} ({})", client.name, state.projects.filter.describe()),
        None => format!("Projects ({})", state.projects.filter.describe()),
    };
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
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
        ]);

    let mut table_state = state.projects.table_state();
    frame.render_stateful_widget(table, chunks[0], &mut table_state);

    let buttons_text = if state.selected_project().is_some() {
        "<N> New | <E> Edit | <D> Activate/Deactivate | </> Search | <Esc> Back"
    } else {
        "<N> New Project | </> Search | <Esc> Back"
    };
    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[1]);

    if let Some(prompt) = &state.search {
        render_prompt(frame, prompt);
    }

    if state.show_toggle_confirmation {
        if let Some(project) = state.selected_project() {
            let question = if project.is_active { "Deactivate this project?" } else { "Reactivate this project?" };
            render_confirmation(frame, "Confirm", &[question]);
        }
    }
}

pub fn handle_key(state: &mut ProjectsState, key: KeyCode) -> Option<ProjectAction> {
    if let Some(prompt) = &mut state.search {
        match prompt.handle_key(key) {
            PromptOutcome::Submitted(query) => {
                state.projects.set_query(&query);
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
                if let Some(project) = state.selected_project() {
                    return Some(ProjectAction::SetActive(project.id, !project.is_active));
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => state.show_toggle_confirmation = false,
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(ProjectAction::Back),
        KeyCode::Char('n') => return Some(ProjectAction::NewProject(state.scope.as_ref().map(|c| c.id))),
        KeyCode::Char('e') => {
            if let Some(project) = state.selected_project() {
                return Some(ProjectAction::EditProject(project.clone()));
            }
        }
        KeyCode::Char('d') => {
            if state.selected_project().is_some() {
                state.show_toggle_confirmation = true;
            }
        }
        KeyCode::Char('/') => {
            state.search = Some(TextPrompt::new("Search projects", &state.projects.filter.query));
        }
        KeyCode::Down => state.projects.next(),
        KeyCode::Up => state.projects.previous(),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn client(id: i32) -> Client {
        Client { id, name: format!("Client {id}"), contact_email: "a@b.co".into(), is_active: true }
    }

    fn project(id: i32, client_id: i32) -> Project {
        Project {
            id,
            client_id,
            name: format!("Project {id}"),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            is_active: true,
        }
    }

    #[test]
    fn scoped_screen_shows_only_that_clients_projects() {
        let clients = vec![client(1), client(2)];
        let state = ProjectsState::new(Some(client(2)), &clients, vec![project(1, 1), project(2, 2), project(3, 2)]);
        assert_eq!(state.projects.visible_len(), 2);
        assert!(state.projects.visible_rows().all(|p| p.client_id == 2));
        assert_eq!(state.client_name(2), "Client 2");
    }

    #[test]
    fn new_project_preselects_scope() {
        let mut state = ProjectsState::new(Some(client(2)), &[client(2)], vec![]);
        assert!(matches!(handle_key(&mut state, KeyCode::Char('n')), Some(ProjectAction::NewProject(Some(2)))));

        let mut unscoped = ProjectsState::new(None, &[client(2)], vec![]);
        assert!(matches!(handle_key(&mut unscoped, KeyCode::Char('n')), Some(ProjectAction::NewProject(None))));
    }
}
