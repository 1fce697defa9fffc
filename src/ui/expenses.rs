use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::models::ExpenseReportOverview;
use crate::reports::stats::ExpenseStats;
use crate::ui::components::popup::{render_confirmation, render_prompt, PromptOutcome, TextPrompt};
use crate::ui::components::selectable::Selectable;

pub struct ExpensesState {
    reports: Selectable<ExpenseReportOverview>,
    title_prompt: Option<TextPrompt>,
    show_delete_confirmation: bool,
    pub error: Option<String>,
}

impl ExpensesState {
    pub fn new(reports: Vec<ExpenseReportOverview>) -> Self {
        Self {
            reports: Selectable::new(reports),
            title_prompt: None,
            show_delete_confirmation: false,
            error: None,
        }
    }

    pub fn selected_report(&self) -> Option<&ExpenseReportOverview> {
        self.reports.selected()
    }
}

pub enum ExpenseAction {
    Back,
    Create(String),
    Open(i32),
    Submit(i32),
    Delete(i32),
}

pub fn render_expenses<B: Backend>(frame: &mut Frame<B>, state: &mut ExpensesState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(frame.size());

    let stats = ExpenseStats::from_rows(state.reports.all_rows());
    let summary = Paragraph::new(format!(
        "Reports: {}   Total: ${:.2}   Pending: ${:.2}   Approved: ${:.2}",
        stats.count, stats.total_amount, stats.pending_amount, stats.approved_amount
    ))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(summary, chunks[0]);

    let header_cells = ["Title", "Status", "Items", "Amount", "Note"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = state.reports.visible_rows().map(|r| {
        Row::new(vec![
            Cell::from(r.title.as_str()),
            Cell::from(r.status.label()),
            Cell::from(r.item_count.to_string()),
            Cell::from(format!("${:.2}", r.total_amount)),
            Cell::from(r.rejection_reason.clone().unwrap_or_default()),
        ])
    });

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title("My Expense Reports").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&[
            Constraint::Percentage(30),
            Constraint::Percentage(15),
            Constraint::Percentage(10),
            Constraint::Percentage(15),
            Constraint::Percentage(30),
        ]);

    let mut table_state = state.reports.table_state();
    frame.render_stateful_widget(table, chunks[1], &mut table_state);

    let footer = match &state.error {
        Some(error) => Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new("<N> New | <Enter> Open | <S> Submit | <D> Delete | <Esc> Back"),
    };
    frame.render_widget(footer.block(Block::default().borders(Borders::TOP)), chunks[2]);

    if let Some(prompt) = &state.title_prompt {
        render_prompt(frame, prompt);
    }

    if state.show_delete_confirmation {
        render_confirmation(frame, "Confirm Delete", &["Delete this expense report and all of its items?"]);
    }
}

pub fn handle_key(state: &mut ExpensesState, key: KeyCode) -> Option<ExpenseAction> {
    if let Some(prompt) = &mut state.title_prompt {
        match prompt.handle_key(key) {
            PromptOutcome::Submitted(title) => {
                state.title_prompt = None;
                let title = title.trim();
                if title.is_empty() {
                    state.error = Some("Title is required".to_string());
                } else {
                    return Some(ExpenseAction::Create(title.to_string()));
                }
            }
            PromptOutcome::Cancelled => state.title_prompt = None,
            PromptOutcome::Pending => {}
        }
        return None;
    }

    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') => {
                state.show_delete_confirmation = false;
                if let Some(report) = state.selected_report() {
                    return Some(ExpenseAction::Delete(report.id));
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => state.show_delete_confirmation = false,
            _ => {}
        }
        return None;
    }

    state.error = None;
    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(ExpenseAction::Back),
        KeyCode::Char('n') => state.title_prompt = Some(TextPrompt::new("Report title", "")),
        KeyCode::Enter => {
            if let Some(report) = state.selected_report() {
                return Some(ExpenseAction::Open(report.id));
            }
        }
        KeyCode::Char('s') => match state.selected_report() {
            Some(report) if !report.status.is_editable() => {
                state.error = Some(format!("This report is already {}", report.status.label()));
            }
            Some(report) if report.item_count == 0 => {
                state.error = Some("Add at least one item before submitting".to_string());
            }
            Some(report) => return Some(ExpenseAction::Submit(report.id)),
            None => {}
        },
        KeyCode::Char('d') => match state.selected_report() {
            Some(report) if report.status.is_editable() => state.show_delete_confirmation = true,
            Some(_) => state.error = Some("Only draft or rejected reports can be deleted".to_string()),
            None => {}
        },
        KeyCode::Down => state.reports.next(),
        KeyCode::Up => state.reports.previous(),
        _ => {}
    }
    None
}
