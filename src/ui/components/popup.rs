use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Spans,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Single line text prompt used for search boxes, titles and rejection reasons.
pub struct TextPrompt {
    pub title: String,
    pub value: String,
}

pub enum PromptOutcome {
    Pending,
    Cancelled,
    Submitted(String),
}

impl TextPrompt {
    pub fn new(title: impl Into<String>, initial: &str) -> Self {
        Self {
            title: title.into(),
            value: initial.to_string(),
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) -> PromptOutcome {
        match key {
            KeyCode::Esc => PromptOutcome::Cancelled,
            KeyCode::Enter => PromptOutcome::Submitted(self.value.clone()),
            KeyCode::Char(c) => {
                self.value.push(c);
                PromptOutcome::Pending
            }
            KeyCode::Backspace => {
                self.value.pop();
                PromptOutcome::Pending
            }
            _ => PromptOutcome::Pending,
        }
    }
}

pub fn render_prompt<B: Backend>(frame: &mut Frame<B>, prompt: &TextPrompt) {
    let area = centered_rect(60, 20, frame.size());
    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(format!("{}|", prompt.value)),
        Spans::from(""),
        Spans::from("<Enter> Confirm  <Esc> Cancel"),
    ])
    .block(Block::default().title(prompt.title.as_str()).borders(Borders::ALL))
    .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

pub fn render_confirmation<B: Backend>(frame: &mut Frame<B>, title: &str, lines: &[&str]) {
    let area = centered_rect(50, 20, frame.size());

    let mut text = vec![Spans::from("")];
    text.extend(lines.iter().map(|line| Spans::from(*line)));
    text.push(Spans::from(""));
    text.push(Spans::from("<Y> Yes  <N> No"));

    let popup = Paragraph::new(text)
        .block(Block::default().title(title).borders(Borders::ALL))
        .style(Style::default().fg(Color::White).bg(Color::Black))
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

/// Last line of the screen, used for errors and confirmations
pub fn render_flash<B: Backend>(frame: &mut Frame<B>, message: &str) {
    let size = frame.size();
    if size.height == 0 {
        return;
    }
    let area = Rect::new(size.x, size.y + size.height - 1, size.width, 1);
    let flash = Paragraph::new(message).style(Style::default().fg(Color::Black).bg(Color::Yellow));
    frame.render_widget(Clear, area);
    frame.render_widget(flash, area);
}

// Helper function to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_collects_text_until_enter() {
        let mut prompt = TextPrompt::new("Reason", "");
        for c in "late".chars() {
            assert!(matches!(prompt.handle_key(KeyCode::Char(c)), PromptOutcome::Pending));
        }
        prompt.handle_key(KeyCode::Backspace);
        match prompt.handle_key(KeyCode::Enter) {
            PromptOutcome::Submitted(value) => assert_eq!(value, "lat"),
            _ => panic!("expected submission"),
        }
        assert!(matches!(prompt.handle_key(KeyCode::Esc), PromptOutcome::Cancelled));
    }

    #[test]
    fn centered_rect_is_inside_parent() {
        let parent = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(50, 20, parent);
        assert!(inner.x >= parent.x && inner.right() <= parent.right());
        assert!(inner.y >= parent.y && inner.bottom() <= parent.bottom());
        assert_eq!(inner.width, 50);
    }
}
