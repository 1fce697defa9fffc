use chrono::NaiveDate;
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::error::{parse_number, ValidationError};

/// How a field reacts to keys
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FieldKind {
    Text,
    Number,
    /// `YYYY-MM-DD`
    Date,
    /// Cycles through a fixed set of values with Left/Right instead of typing
    Choice,
}

pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub kind: FieldKind,
    pub choices: Vec<(String, String)>, // (value, display)
}

impl FormField {
    pub fn text(label: &'static str, value: impl Into<String>) -> Self {
        Self { label, value: value.into(), kind: FieldKind::Text, choices: Vec::new() }
    }

    pub fn number(label: &'static str, value: impl Into<String>) -> Self {
        Self { label, value: value.into(), kind: FieldKind::Number, choices: Vec::new() }
    }

    pub fn date(label: &'static str, value: Option<NaiveDate>) -> Self {
        Self {
            label,
            value: value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            kind: FieldKind::Date,
            choices: Vec::new(),
        }
    }

    /// `choices` must not be empty; the initial value falls back to the first choice
    pub fn choice(label: &'static str, current: &str, choices: Vec<(String, String)>) -> Self {
        let value = if choices.iter().any(|(v, _)| v == current) {
            current.to_string()
        } else {
            choices.first().map(|(v, _)| v.clone()).unwrap_or_default()
        };
        Self { label, value, kind: FieldKind::Choice, choices }
    }

    pub fn display(&self) -> String {
        match self.kind {
            FieldKind::Choice => self
                .choices
                .iter()
                .find(|(v, _)| *v == self.value)
                .map(|(_, d)| format!("< {} >", d))
                .unwrap_or_default(),
            _ => self.value.clone(),
        }
    }

    fn cycle(&mut self, forward: bool) {
        if self.choices.is_empty() {
            return;
        }
        let len = self.choices.len();
        let current = self.choices.iter().position(|(v, _)| *v == self.value).unwrap_or(0);
        let next = if forward { (current + 1) % len } else { (current + len - 1) % len };
        self.value = self.choices[next].0.clone();
    }

    fn accepts(&self, c: char) -> bool {
        match self.kind {
            FieldKind::Text => true,
            FieldKind::Number => c.is_ascii_digit() || c == '.',
            FieldKind::Date => c.is_ascii_digit() || c == '-',
            FieldKind::Choice => false,
        }
    }
}

/// Vertical list of labelled fields, edited one at a time.
pub struct TextForm {
    pub title: String,
    pub fields: Vec<FormField>,
    pub current: usize,
    pub editing: bool,
    pub error: Option<String>,
}

pub enum FormOutcome {
    Pending,
    Cancel,
    Save,
}

impl TextForm {
    pub fn new(title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self { title: title.into(), fields, current: 0, editing: false, error: None }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", |f| f.value.as_str())
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.current = (self.current + 1) % self.fields.len();
        }
    }

    pub fn previous_field(&mut self) {
        if !self.fields.is_empty() {
            self.current = (self.current + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Keys while the form is showing. `S` asks the owning wizard to validate and save.
    pub fn handle_key(&mut self, key: KeyCode) -> FormOutcome {
        if self.editing {
            let Some(field) = self.fields.get_mut(self.current) else {
                self.editing = false;
                return FormOutcome::Pending;
            };
            match key {
                KeyCode::Enter | KeyCode::Esc => self.editing = false,
                KeyCode::Char(c) if field.accepts(c) => field.value.push(c),
                KeyCode::Backspace => {
                    field.value.pop();
                }
                _ => {}
            }
            return FormOutcome::Pending;
        }

        match key {
            KeyCode::Esc => return FormOutcome::Cancel,
            KeyCode::Char('s') | KeyCode::Char('S') => return FormOutcome::Save,
            KeyCode::Up => self.previous_field(),
            KeyCode::Down | KeyCode::Tab => self.next_field(),
            KeyCode::Left | KeyCode::Right => {
                if let Some(field) = self.fields.get_mut(self.current) {
                    field.cycle(key == KeyCode::Right);
                }
            }
            KeyCode::Enter => {
                if self.fields.get(self.current).map_or(false, |f| f.kind != FieldKind::Choice) {
                    self.error = None;
                    self.editing = true;
                }
            }
            _ => {}
        }
        FormOutcome::Pending
    }
}

pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate { field, value: value.to_string() })
}

pub fn parse_optional_date(field: &'static str, value: &str) -> Result<Option<NaiveDate>, ValidationError> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_date(field, value).map(Some)
    }
}

pub fn parse_amount(field: &'static str, value: &str) -> Result<f64, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    parse_number(field, value)
}

pub fn render_form<B: Backend>(frame: &mut Frame<B>, form: &TextForm) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(frame.size());

    let title = Paragraph::new(form.title.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    render_fields(frame, form, chunks[1]);

    let help_text = match (&form.error, form.editing) {
        (Some(error), _) => error.clone(),
        (None, true) => "Enter - Save field | Esc - Done editing".to_string(),
        (None, false) => {
            "Enter - Edit field | Left/Right - Change choice | Up/Down - Navigate | S - Save | Esc - Cancel".to_string()
        }
    };
    let help_style = if form.error.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    };

    let help = Paragraph::new(help_text)
        .style(help_style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[2]);
}

fn render_fields<B: Backend>(frame: &mut Frame<B>, form: &TextForm, area: Rect) {
    let items: Vec<ListItem> = form
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let content = if i == form.current && form.editing {
                Spans::from(vec![
                    Span::styled(format!("{}: ", field.label), Style::default().fg(Color::Yellow)),
                    Span::styled(format!("{}|", field.value), Style::default().add_modifier(Modifier::BOLD)),
                ])
            } else {
                let style = if i == form.current {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };

                Spans::from(vec![
                    Span::styled(format!("{}: ", field.label), style),
                    Span::raw(field.display()),
                ])
            };

            ListItem::new(content)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Details"));
    frame.render_widget(list, area);
}
