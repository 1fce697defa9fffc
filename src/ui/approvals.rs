use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Spans,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Frame,
};

use crate::models::{ApprovalStatus, ExpenseReportOverview, TimesheetOverview, User};
use crate::ui::components::popup::{render_prompt, PromptOutcome, TextPrompt};
use crate::ui::components::selectable::Selectable;
use crate::workflow::{can_act, ApprovalAction, Ownership};

/// Whether `actor` is the next approver of an item in `status`
pub fn awaits(actor: &User, owner_id: i32, client_id: Option<i32>, status: ApprovalStatus) -> bool {
    status.is_pending() && can_act(actor, Ownership { owner_id, client_id }, status, &ApprovalAction::Approve)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalTab {
    Timesheets,
    Expenses,
}

pub struct ApprovalsState {
    pub tab: ApprovalTab,
    timesheets: Selectable<TimesheetOverview>,
    expenses: Selectable<ExpenseReportOverview>,
    reason_prompt: Option<TextPrompt>,
}

impl ApprovalsState {
    /// Keeps only the rows waiting on `actor`
    pub fn new(actor: &User, timesheets: Vec<TimesheetOverview>, expenses: Vec<ExpenseReportOverview>) -> Self {
        let timesheets = timesheets
            .into_iter()
            .filter(|t| awaits(actor, t.user_id, t.client_id, t.status))
            .collect();
        let expenses = expenses
            .into_iter()
            .filter(|e| awaits(actor, e.user_id, e.client_id, e.status))
            .collect();
        Self {
            tab: ApprovalTab::Timesheets,
            timesheets: Selectable::new(timesheets),
            expenses: Selectable::new(expenses),
            reason_prompt: None,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.timesheets.all_rows().len() + self.expenses.all_rows().len()
    }

    fn selected_id(&self) -> Option<i32> {
        match self.tab {
            ApprovalTab::Timesheets => self.timesheets.selected().map(|t| t.id),
            ApprovalTab::Expenses => self.expenses.selected().map(|e| e.id),
        }
    }
}

pub enum ApprovalsAction {
    Back,
    OpenTimesheet(i32),
    OpenExpense(i32),
    Timesheet(i32, ApprovalAction),
    Expense(i32, ApprovalAction),
}

fn action_for(state: &ApprovalsState, id: i32, action: ApprovalAction) -> ApprovalsAction {
    match state.tab {
        ApprovalTab::Timesheets => ApprovalsAction::Timesheet(id, action),
        ApprovalTab::Expenses => ApprovalsAction::Expense(id, action),
    }
}

pub fn render_approvals<B: Backend>(frame: &mut Frame<B>, state: &mut ApprovalsState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(frame.size());

    let titles = vec![
        Spans::from(format!("Timesheets ({})", state.timesheets.all_rows().len())),
        Spans::from(format!("Expense Reports ({})", state.expenses.all_rows().len())),
    ];
    let selected_tab = match state.tab {
        ApprovalTab::Timesheets => 0,
        ApprovalTab::Expenses => 1,
    };
    let tabs = Tabs::new(titles)
        .block(Block::default().title("Pending Approvals").borders(Borders::ALL))
        .select(selected_tab)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[0]);

    let highlight = Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    match state.tab {
        ApprovalTab::Timesheets => {
            let header = Row::new(
                ["Employee", "Week", "Hours", "Stage", "Submitted"]
                    .iter()
                    .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow))),
            )
            .bottom_margin(1);
            let rows = state.timesheets.visible_rows().map(|t| {
                Row::new(vec![
                    Cell::from(t.employee_name.as_str()),
                    Cell::from(t.week_start.format("%Y-%m-%d").to_string()),
                    Cell::from(format!("{:.2}", t.total_hours)),
                    Cell::from(t.status.label()),
                    Cell::from(t.submitted_at.map(|d| d.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default()),
                ])
            });
            let table = Table::new(rows)
                .header(header)
                .block(Block::default().borders(Borders::ALL))
                .highlight_style(highlight)
                .widths(&[
                    Constraint::Percentage(30),
                    Constraint::Percentage(15),
                    Constraint::Percentage(10),
                    Constraint::Percentage(20),
                    Constraint::Percentage(25),
                ]);
            let mut table_state = state.timesheets.table_state();
            frame.render_stateful_widget(table, chunks[1], &mut table_state);
        }
        ApprovalTab::Expenses => {
            let header = Row::new(
                ["Employee", "Title", "Items", "Amount", "Stage"]
                    .iter()
                    .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow))),
            )
            .bottom_margin(1);
            let rows = state.expenses.visible_rows().map(|e| {
                Row::new(vec![
                    Cell::from(e.employee_name.as_str()),
                    Cell::from(e.title.as_str()),
                    Cell::from(e.item_count.to_string()),
                    Cell::from(format!("${:.2}", e.total_amount)),
                    Cell::from(e.status.label()),
                ])
            });
            let table = Table::new(rows)
                .header(header)
                .block(Block::default().borders(Borders::ALL))
                .highlight_style(highlight)
                .widths(&[
                    Constraint::Percentage(25),
                    Constraint::Percentage(30),
                    Constraint::Percentage(10),
                    Constraint::Percentage(15),
                    Constraint::Percentage(20),
                ]);
            let mut table_state = state.expenses.table_state();
            frame.render_stateful_widget(table, chunks[1], &mut table_state);
        }
    }

    let footer = Paragraph::new("<Tab> Switch | <Enter> View | <A> Approve | <R> Reject | <Esc> Back")
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if let Some(prompt) = &state.reason_prompt {
        render_prompt(frame, prompt);
    }
}

pub fn handle_key(state: &mut ApprovalsState, key: KeyCode) -> Option<ApprovalsAction> {
    if let Some(prompt) = &mut state.reason_prompt {
        match prompt.handle_key(key) {
            PromptOutcome::Submitted(reason) => {
                state.reason_prompt = None;
                if let Some(id) = state.selected_id() {
                    return Some(action_for(state, id, ApprovalAction::Reject(reason)));
                }
            }
            PromptOutcome::Cancelled => state.reason_prompt = None,
            PromptOutcome::Pending => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(ApprovalsAction::Back),
        KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
            state.tab = match state.tab {
                ApprovalTab::Timesheets => ApprovalTab::Expenses,
                ApprovalTab::Expenses => ApprovalTab::Timesheets,
            };
        }
        KeyCode::Down => match state.tab {
            ApprovalTab::Timesheets => state.timesheets.next(),
            ApprovalTab::Expenses => state.expenses.next(),
        },
        KeyCode::Up => match state.tab {
            ApprovalTab::Timesheets => state.timesheets.previous(),
            ApprovalTab::Expenses => state.expenses.previous(),
        },
        KeyCode::Enter => {
            if let Some(id) = state.selected_id() {
                return Some(match state.tab {
                    ApprovalTab::Timesheets => ApprovalsAction::OpenTimesheet(id),
                    ApprovalTab::Expenses => ApprovalsAction::OpenExpense(id),
                });
            }
        }
        KeyCode::Char('a') => {
            if let Some(id) = state.selected_id() {
                return Some(action_for(state, id, ApprovalAction::Approve));
            }
        }
        KeyCode::Char('r') => {
            if state.selected_id().is_some() {
                state.reason_prompt = Some(TextPrompt::new("Reason for rejection", ""));
            }
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user(id: i32, role: Role, client_id: Option<i32>) -> User {
        User {
            id,
            email: format!("u{id}@example.com"),
            full_name: format!("User {id}"),
            role,
            client_id,
            is_active: true,
        }
    }

    fn sheet(id: i32, user_id: i32, client_id: Option<i32>, status: ApprovalStatus) -> TimesheetOverview {
        TimesheetOverview {
            id,
            user_id,
            week_start: chrono::NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            status,
            submitted_at: None,
            rejection_reason: None,
            employee_name: format!("User {user_id}"),
            employee_email: format!("u{user_id}@example.com"),
            client_id,
            total_hours: 40.0,
        }
    }

    #[test]
    fn manager_sees_only_submitted_items_of_their_client() {
        let manager = user(2, Role::Manager, Some(7));
        let state = ApprovalsState::new(
            &manager,
            vec![
                sheet(1, 10, Some(7), ApprovalStatus::Submitted),
                sheet(2, 11, Some(8), ApprovalStatus::Submitted),
                sheet(3, 12, Some(7), ApprovalStatus::ClientApproved),
                sheet(4, 13, Some(7), ApprovalStatus::Draft),
            ],
            vec![],
        );
        let ids: Vec<i32> = state.timesheets.all_rows().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn admin_sees_both_pending_stages() {
        let admin = user(1, Role::Admin, None);
        let state = ApprovalsState::new(
            &admin,
            vec![
                sheet(1, 10, Some(7), ApprovalStatus::Submitted),
                sheet(2, 11, Some(8), ApprovalStatus::ClientApproved),
                sheet(3, 12, Some(7), ApprovalStatus::PayrollApproved),
                sheet(4, 13, None, ApprovalStatus::Rejected),
            ],
            vec![],
        );
        assert_eq!(state.pending_count(), 2);
    }

    #[test]
    fn reject_asks_for_a_reason() {
        let admin = user(1, Role::Admin, None);
        let mut state = ApprovalsState::new(&admin, vec![sheet(5, 10, Some(7), ApprovalStatus::Submitted)], vec![]);
        assert!(handle_key(&mut state, KeyCode::Char('r')).is_none());
        for c in "missing hours".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        match handle_key(&mut state, KeyCode::Enter) {
            Some(ApprovalsAction::Timesheet(5, ApprovalAction::Reject(reason))) => assert_eq!(reason, "missing hours"),
            _ => panic!("expected a reject action"),
        }
    }

    #[test]
    fn approve_targets_the_active_tab() {
        let admin = user(1, Role::Admin, None);
        let mut state = ApprovalsState::new(&admin, vec![sheet(5, 10, Some(7), ApprovalStatus::Submitted)], vec![]);
        handle_key(&mut state, KeyCode::Tab);
        assert!(handle_key(&mut state, KeyCode::Char('a')).is_none());
        handle_key(&mut state, KeyCode::Tab);
        assert!(matches!(
            handle_key(&mut state, KeyCode::Char('a')),
            Some(ApprovalsAction::Timesheet(5, ApprovalAction::Approve))
        ));
    }
}
