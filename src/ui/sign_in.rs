use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::User;
use crate::ui::components::popup::{render_prompt, PromptOutcome, TextPrompt};
use crate::ui::components::selectable::Selectable;

// Stands in for an authentication context: pick who you are from the active users
pub struct SignInState {
    users: Selectable<User>,
    search: Option<TextPrompt>,
}

pub enum SignInAction {
    Exit,
    SignIn(User),
}

impl SignInState {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Selectable::new(users),
            search: None,
        }
    }
}

pub fn render_sign_in<B: Backend>(frame: &mut Frame<B>, state: &mut SignInState) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(size);

    let items: Vec<ListItem> = state
        .users
        .visible_rows()
        .map(|user| {
            ListItem::new(Spans::from(vec![
                Span::raw(format!("{:<30}", user.full_name)),
                Span::styled(format!("{:<35}", user.email), Style::default().fg(Color::Gray)),
                Span::styled(user.role.as_str(), Style::default().fg(Color::Cyan)),
            ]))
        })
        .collect();

    let title = format!("Sign in as ({})", state.users.filter.describe());
    let users_list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    let mut list_state = state.users.list_state();
    frame.render_stateful_widget(users_list, chunks[0], &mut list_state);

    let buttons = Paragraph::new("<Enter> Sign in | </> Search | <Q> Quit")
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[1]);

    if let Some(prompt) = &state.search {
        render_prompt(frame, prompt);
    }
}

pub fn handle_key(state: &mut SignInState, key: KeyCode) -> Option<SignInAction> {
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

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(SignInAction::Exit),
        KeyCode::Char('/') => {
            state.search = Some(TextPrompt::new("Search users", &state.users.filter.query));
        }
        KeyCode::Down => state.users.next(),
        KeyCode::Up => state.users.previous(),
        KeyCode::Enter => {
            if let Some(user) = state.users.selected() {
                return Some(SignInAction::SignIn(user.clone()));
            }
        }
        _ => {}
    }
    None
}
