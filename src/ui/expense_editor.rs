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
use crate::models::{ExpenseItem, ExpenseReport, Project, EXPENSE_CATEGORIES};
use crate::reports::stats::category_totals;
use crate::ui::components::form::{parse_amount, parse_date, render_form, FormField, FormOutcome, TextForm};
use crate::ui::components::popup::render_confirmation;

const DATE: usize = 0;
const CATEGORY: usize = 1;
const DESCRIPTION: usize = 2;
const AMOUNT: usize = 3;
const PROJECT: usize = 4;

/// Amounts must be strictly positive and categories one of [`EXPENSE_CATEGORIES`].
pub fn validate_item(category: &str, amount: f64) -> Result<f64, ValidationError> {
    if !EXPENSE_CATEGORIES.contains(&category) {
        return Err(ValidationError::Required("Category"));
    }
    if amount <= 0.0 {
        return Err(ValidationError::AmountOutOfRange(amount));
    }
    Ok(amount)
}

struct ItemForm {
    item_id: i32,
    form: TextForm,
}

pub struct ExpenseEditorState {
    pub report: ExpenseReport,
    items: Vec<ExpenseItem>,
    table_state: TableState,
    projects: Vec<(i32, String)>,
    read_only: bool,
    item_form: Option<ItemForm>,
    show_delete_confirmation: bool,
    pub error: Option<String>,
}

pub enum ExpenseEditorAction {
    Back,
    SaveItem(ExpenseItem),
    DeleteItem(i32),
    Submit,
}

impl ExpenseEditorState {
    pub fn new(report: ExpenseReport, items: Vec<ExpenseItem>, projects: &[Project], viewer_id: i32) -> Self {
        let read_only = viewer_id != report.user_id || !report.status.is_editable();
        let mut table_state = TableState::default();
        if !items.is_empty() {
            table_state.select(Some(0));
        }
        Self {
            report,
            items,
            table_state,
            projects: projects.iter().map(|p| (p.id, p.name.clone())).collect(),
            read_only,
            item_form: None,
            show_delete_confirmation: false,
            error: None,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn total_amount(&self) -> f64 {
        self.items.iter().map(|i| i.amount).sum()
    }

    pub fn selected_item(&self) -> Option<&ExpenseItem> {
        self.table_state.selected().and_then(|i| self.items.get(i))
    }

    fn project_choices(&self) -> Vec<(String, String)> {
        let mut choices = vec![(String::new(), "None".to_string())];
        choices.extend(self.projects.iter().map(|(id, name)| (id.to_string(), name.clone())));
        choices
    }

    fn open_form(&mut self, item: Option<ExpenseItem>, today: NaiveDate) {
        let categories: Vec<(String, String)> = EXPENSE_CATEGORIES
            .iter()
            .map(|c| (c.to_string(), c.to_string()))
            .collect();
        let (item_id, title, fields) = match item {
            Some(item) => (
                item.id,
                "Edit Expense Item",
                vec![
                    FormField::date("Date", Some(item.expense_date)),
                    FormField::choice("Category", &item.category, categories),
                    FormField::text("Description", item.description),
                    FormField::number("Amount", format!("{:.2}", item.amount)),
                    FormField::choice(
                        "Project",
                        &item.project_id.map(|id| id.to_string()).unwrap_or_default(),
                        self.project_choices(),
                    ),
                ],
            ),
            None => (
                0,
                "New Expense Item",
                vec![
                    FormField::date("Date", Some(today)),
                    FormField::choice("Category", "", categories),
                    FormField::text("Description", ""),
                    FormField::number("Amount", ""),
                    FormField::choice("Project", "", self.project_choices()),
                ],
            ),
        };
        self.item_form = Some(ItemForm { item_id, form: TextForm::new(title, fields) });
    }

    fn item_from_form(&self, item_form: &ItemForm) -> Result<ExpenseItem, ValidationError> {
        let form = &item_form.form;
        let expense_date = parse_date("Date", form.value(DATE))?;
        require("Description", form.value(DESCRIPTION))?;
        let amount = parse_amount("Amount", form.value(AMOUNT))?;
        let amount = validate_item(form.value(CATEGORY), amount)?;
        let project_id = form.value(PROJECT).parse::<i32>().ok();

        Ok(ExpenseItem {
            id: item_form.item_id,
            report_id: self.report.id,
            expense_date,
            category: form.value(CATEGORY).to_string(),
            description: form.value(DESCRIPTION).trim().to_string(),
            amount,
            project_id,
        })
    }

    pub fn show_form_error(&mut self, message: String) {
        match &mut self.item_form {
            Some(item_form) => item_form.form.error = Some(message),
            None => self.error = Some(message),
        }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = self.table_state.selected().map_or(0, |i| (i + 1) % self.items.len());
        self.table_state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let len = self.items.len();
        let i = self.table_state.selected().map_or(0, |i| (i + len - 1) % len);
        self.table_state.select(Some(i));
    }
}

pub fn render_expense_editor<B: Backend>(frame: &mut Frame<B>, state: &mut ExpenseEditorState) {
    if let Some(item_form) = &state.item_form {
        render_form(frame, &item_form.form);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(frame.size());

    let report = &state.report;
    let by_category = category_totals(&state.items)
        .into_iter()
        .map(|(category, amount)| format!("{}: ${:.2}", category, amount))
        .collect::<Vec<_>>()
        .join("  ");
    let mut summary = vec![
        Spans::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::Yellow)),
            Span::raw(report.status.label()),
            Span::styled("   Total: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("${:.2}", state.total_amount())),
        ]),
        Spans::from(by_category),
    ];
    if let Some(reason) = &report.rejection_reason {
        summary.push(Spans::from(Span::styled(
            format!("Rejected: {}", reason),
            Style::default().fg(Color::Red),
        )));
    }
    let summary = Paragraph::new(summary).block(Block::default().title(report.title.as_str()).borders(Borders::ALL));
    frame.render_widget(summary, chunks[0]);

    let header_cells = ["Date", "Category", "Description", "Amount", "Project"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = state.items.iter().map(|item| {
        let project = item
            .project_id
            .and_then(|id| state.projects.iter().find(|(pid, _)| *pid == id))
            .map(|(_, name)| name.clone())
            .unwrap_or_default();
        Row::new(vec![
            Cell::from(item.expense_date.format("%Y-%m-%d").to_string()),
            Cell::from(item.category.as_str()),
            Cell::from(item.description.as_str()),
            Cell::from(format!("${:.2}", item.amount)),
            Cell::from(project),
        ])
    });

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title("Items").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&[
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(35),
            Constraint::Percentage(15),
            Constraint::Percentage(20),
        ]);
    frame.render_stateful_widget(table, chunks[1], &mut state.table_state);

    let footer = match (&state.error, state.read_only) {
        (Some(error), _) => Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
        (None, true) => Paragraph::new("Read only | <Esc> Back"),
        (None, false) => Paragraph::new("<A> Add | <E> Edit | <D> Delete | <S> Submit | <Esc> Back"),
    };
    frame.render_widget(footer.block(Block::default().borders(Borders::TOP)), chunks[2]);

    if state.show_delete_confirmation {
        render_confirmation(frame, "Confirm Delete", &["Delete this expense item?"]);
    }
}

pub fn handle_key(state: &mut ExpenseEditorState, key: KeyCode, today: NaiveDate) -> Option<ExpenseEditorAction> {
    if let Some(mut item_form) = state.item_form.take() {
        match item_form.form.handle_key(key) {
            FormOutcome::Cancel => {}
            FormOutcome::Save => match state.item_from_form(&item_form) {
                Ok(item) => {
                    state.item_form = Some(item_form);
                    return Some(ExpenseEditorAction::SaveItem(item));
                }
                Err(err) => {
                    item_form.form.error = Some(err.to_string());
                    state.item_form = Some(item_form);
                }
            },
            FormOutcome::Pending => state.item_form = Some(item_form),
        }
        return None;
    }

    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') => {
                state.show_delete_confirmation = false;
                if let Some(item) = state.selected_item() {
                    return Some(ExpenseEditorAction::DeleteItem(item.id));
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => state.show_delete_confirmation = false,
            _ => {}
        }
        return None;
    }

    state.error = None;
    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(ExpenseEditorAction::Back),
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        KeyCode::Char('a') | KeyCode::Char('e') | KeyCode::Char('d') | KeyCode::Char('s') if state.read_only => {
            state.error = Some(format!("Report is {} and cannot be changed", state.report.status.label()));
        }
        KeyCode::Char('a') => state.open_form(None, today),
        KeyCode::Char('e') => {
            if let Some(item) = state.selected_item().cloned() {
                state.open_form(Some(item), today);
            }
        }
        KeyCode::Char('d') => {
            if state.selected_item().is_some() {
                state.show_delete_confirmation = true;
            }
        }
        KeyCode::Char('s') => {
            if state.items.is_empty() {
                state.error = Some("Add at least one item before submitting".to_string());
            } else {
                return Some(ExpenseEditorAction::Submit);
            }
        }
        _ => {}
    }
    None
}
