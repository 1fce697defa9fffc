use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::models::Client;
use crate::ui::components::popup::{render_confirmation, render_prompt, PromptOutcome, TextPrompt};
use crate::ui::components::selectable::Selectable;

// Represents the state of the client management screen
pub struct ClientsState {
    clients: Selectable<Client>,
    search: Option<TextPrompt>,
    show_toggle_confirmation: bool,
}

impl ClientsState {
    pub fn new(clients: Vec<Client>) -> Self {
        Self {
            clients: Selectable::new(clients),
            search: None,
            show_toggle_confirmation: false,
        }
    }

    pub fn selected_client(&self) -> Option<&Client> {
        self.clients.selected()
    }
}

pub enum ClientAction {
    Back,
    NewClient,
    EditClient(Client),
    SetActive(i32, bool), // (client_id, active)
    ViewProjects(i32),    // Contains client_id
}

pub fn render_clients<B: Backend>(frame: &mut Frame<B>, state: &mut ClientsState) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(size);

    let header_cells = ["Name", "Contact Email", "Status"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = state.clients.visible_rows().map(|client| {
        let status = if client.is_active { "Active" } else { "Inactive" };
        let style = if client.is_active {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Row::new(vec![
            Cell::from(client.name.as_str()),
            Cell::from(client.contact_email.as_str()),
            Cell::from(status),
        ])
        .style(style)
    });

    let title = format!("Clients ({})", state.clients.filter.describe());
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
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Percentage(20),
        ]);

    let mut table_state = state.clients.table_state();
    frame.render_stateful_widget(table, chunks[0], &mut table_state);

    let buttons_text = if state.selected_client().is_some() {
        "<N> New | <E> Edit | <D> Activate/Deactivate | <Enter> Projects | </> Search | <Esc> Back"
    } else {
        "<N> New Client | </> Search | <Esc> Back"
    };

    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[1]);

    if let Some(prompt) = &state.search {
        render_prompt(frame, prompt);
    }

    if state.show_toggle_confirmation {
        if let Some(client) = state.selected_client() {
            let question = if client.is_active {
                "Deactivate this client? Its projects are deactivated too."
            } else {
                "Reactivate this client?"
            };
            render_confirmation(frame, "Confirm", &[question]);
        }
    }
}

pub fn handle_key(state: &mut ClientsState, key: KeyCode) -> Option<ClientAction> {
    if let Some(prompt) = &mut state.search {
        match prompt.handle_key(key) {
            PromptOutcome::Submitted(query) => {
                state.clients.set_query(&query);
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
                if let Some(client) = state.selected_client() {
                    return Some(ClientAction::SetActive(client.id, !client.is_active));
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => state.show_toggle_confirmation = false,
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(ClientAction::Back),
        KeyCode::Char('n') => return Some(ClientAction::NewClient),
        KeyCode::Char('e') => {
            if let Some(client) = state.selected_client() {
                return Some(ClientAction::EditClient(client.clone()));
            }
        }
        KeyCode::Char('d') => {
            if state.selected_client().is_some() {
                state.show_toggle_confirmation = true;
            }
        }
        KeyCode::Char('/') => {
            state.search = Some(TextPrompt::new("Search clients", &state.clients.filter.query));
        }
        KeyCode::Down => state.clients.next(),
        KeyCode::Up => state.clients.previous(),
        KeyCode::Enter => {
            if let Some(client) = state.selected_client() {
                return Some(ClientAction::ViewProjects(client.id));
            }
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: i32, name: &str, active: bool) -> Client {
        Client {
            id,
            name: name.to_string(),
            contact_email: format!("billing@{}.com", name.to_lowercase()),
            is_active: active,
        }
    }

    #[test]
    fn deactivate_requires_confirmation() {
        let mut state = ClientsState::new(vec![client(1, "Acme", true)]);
        assert!(handle_key(&mut state, KeyCode::Char('d')).is_none());
        assert!(matches!(
            handle_key(&mut state, KeyCode::Char('y')),
            Some(ClientAction::SetActive(1, false))
        ));
    }

    #[test]
    fn declining_confirmation_does_nothing() {
        let mut state = ClientsState::new(vec![client(1, "Acme", false)]);
        handle_key(&mut state, KeyCode::Char('d'));
        assert!(handle_key(&mut state, KeyCode::Char('n')).is_none());
        assert!(matches!(handle_key(&mut state, KeyCode::Esc), Some(ClientAction::Back)));
    }

    #[test]
    fn enter_opens_projects_of_selected_client() {
        let mut state = ClientsState::new(vec![client(1, "Acme", true), client(2, "Globex", true)]);
        handle_key(&mut state, KeyCode::Down);
        assert!(matches!(handle_key(&mut state, KeyCode::Enter), Some(ClientAction::ViewProjects(2))));
    }
}
