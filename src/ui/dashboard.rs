use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::models::{ApprovalStatus, Client, ExpenseReportOverview, Project, Role, TimesheetOverview, User};
use crate::reports::stats::{percentage, ExpenseStats, TimesheetStats};

/// Screens reachable from a dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    MyTimesheets,
    MyExpenses,
    PendingApprovals,
    ManagerReports,
    Clients,
    Projects,
    Employees,
    Assignments,
    AllTimesheets,
    SystemReports,
    SignOut,
}

impl MenuItem {
    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::MyTimesheets => "My Timesheets",
            MenuItem::MyExpenses => "My Expense Reports",
            MenuItem::PendingApprovals => "Pending Approvals",
            MenuItem::ManagerReports => "Team Reports",
            MenuItem::Clients => "Client Management",
            MenuItem::Projects => "Project Management",
            MenuItem::Employees => "Employee Management",
            MenuItem::Assignments => "Project Assignments",
            MenuItem::AllTimesheets => "Timesheet Administration",
            MenuItem::SystemReports => "System Reports",
            MenuItem::SignOut => "Sign Out",
        }
    }
}

pub fn menu_for(role: Role) -> Vec<MenuItem> {
    let mut menu = vec![MenuItem::MyTimesheets, MenuItem::MyExpenses];
    match role {
        Role::Employee => {}
        Role::Manager => {
            menu.push(MenuItem::PendingApprovals);
            menu.push(MenuItem::ManagerReports);
        }
        Role::Admin => {
            menu.extend([
                MenuItem::PendingApprovals,
                MenuItem::AllTimesheets,
                MenuItem::Clients,
                MenuItem::Projects,
                MenuItem::Employees,
                MenuItem::Assignments,
                MenuItem::SystemReports,
            ]);
        }
    }
    menu.push(MenuItem::SignOut);
    menu
}

/// Rows a dashboard's summary cards are computed from
#[derive(Default)]
pub struct DashboardData {
    pub users: Vec<User>,
    pub clients: Vec<Client>,
    pub projects: Vec<Project>,
    /// Timesheets the cards describe: everyone's for admins, the team's for
    /// managers, the user's own for employees
    pub timesheets: Vec<TimesheetOverview>,
    /// Every sheet awaiting approval regardless of week; admin only
    pub pending_timesheets: Vec<TimesheetOverview>,
    pub expenses: Vec<ExpenseReportOverview>,
    pub current_week: Option<chrono::NaiveDate>,
}

pub type Card = (String, String);

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub fn admin_cards(data: &DashboardData) -> Vec<Card> {
    let employees = data.users.iter().filter(|u| u.is_active && u.role == Role::Employee).count();
    let clients = data.clients.iter().filter(|c| c.is_active).count();
    let projects = data.projects.iter().filter(|p| p.is_active).count();
    let sheets = TimesheetStats::from_rows(&data.timesheets);
    let expenses = ExpenseStats::from_rows(&data.expenses);
    let pending_expenses = data.expenses.iter().filter(|e| e.status.is_pending()).count();
    let this_week: f64 = data
        .timesheets
        .iter()
        .filter(|t| Some(t.week_start) == data.current_week)
        .map(|t| t.total_hours)
        .sum();

    vec![
        ("Active Employees".into(), employees.to_string()),
        ("Active Clients".into(), clients.to_string()),
        ("Active Projects".into(), projects.to_string()),
        ("Pending Timesheets".into(), data.pending_timesheets.len().to_string()),
        ("Pending Expenses".into(), pending_expenses.to_string()),
        ("Pending Expense Total".into(), money(expenses.pending_amount)),
        ("Hours This Week".into(), format!("{:.1}", this_week)),
        ("Approval Rate".into(), format!("{:.1}%", sheets.approval_rate)),
    ]
}

/// Cards for a manager; `timesheets` and `expenses` are already limited to the team
pub fn manager_cards(data: &DashboardData) -> Vec<Card> {
    let awaiting_me = data.timesheets.iter().filter(|t| t.status == ApprovalStatus::Submitted).count()
        + data.expenses.iter().filter(|e| e.status == ApprovalStatus::Submitted).count();
    let team: std::collections::BTreeSet<i32> = data.timesheets.iter().map(|t| t.user_id).collect();
    let this_week: Vec<&TimesheetOverview> = data
        .timesheets
        .iter()
        .filter(|t| Some(t.week_start) == data.current_week)
        .collect();
    let submitted_this_week = this_week.iter().filter(|t| t.status != ApprovalStatus::Draft).count();
    let hours: f64 = this_week.iter().map(|t| t.total_hours).sum();

    vec![
        ("Awaiting My Approval".into(), awaiting_me.to_string()),
        ("Team Members".into(), team.len().to_string()),
        ("Team Hours This Week".into(), format!("{:.1}", hours)),
        (
            "Submitted This Week".into(),
            format!("{:.0}%", percentage(submitted_this_week as f64, this_week.len() as f64)),
        ),
    ]
}

pub fn employee_cards(data: &DashboardData) -> Vec<Card> {
    let sheets = TimesheetStats::from_rows(&data.timesheets);
    let expenses = ExpenseStats::from_rows(&data.expenses);
    let this_week = data
        .timesheets
        .iter()
        .find(|t| Some(t.week_start) == data.current_week);

    vec![
        (
            "This Week".into(),
            this_week.map_or("no timesheet".to_string(), |t| format!("{:.1}h ({})", t.total_hours, t.status.label())),
        ),
        ("Pending Timesheets".into(), sheets.pending.to_string()),
        ("Rejected Timesheets".into(), sheets.rejected.to_string()),
        ("Expenses Pending".into(), money(expenses.pending_amount)),
        ("Expenses Reimbursed".into(), money(expenses.approved_amount)),
    ]
}

pub struct DashboardState {
    user: User,
    menu: Vec<MenuItem>,
    list_state: ListState,
    cards: Vec<Card>,
}

pub enum DashboardAction {
    Open(MenuItem),
}

impl DashboardState {
    pub fn new(user: User, data: &DashboardData) -> Self {
        let cards = match user.role {
            Role::Admin => admin_cards(data),
            Role::Manager => manager_cards(data),
            Role::Employee => employee_cards(data),
        };
        let menu = menu_for(user.role);
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self { user, menu, list_state, cards }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn next(&mut self) {
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.menu.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let i = match self.list_state.selected() {
            Some(0) | None => self.menu.len().saturating_sub(1),
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn selected_item(&self) -> Option<MenuItem> {
        self.list_state.selected().and_then(|i| self.menu.get(i).copied())
    }
}

pub fn render_dashboard<B: Backend>(frame: &mut Frame<B>, state: &mut DashboardState) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(size);

    let header = Paragraph::new(format!(
        "Signed in as {} <{}> - {}",
        state.user.full_name, state.user.email, state.user.role
    ))
    .style(Style::default().fg(Color::Cyan))
    .block(Block::default().borders(Borders::ALL).title("Workforce Manager"));
    frame.render_widget(header, chunks[0]);

    render_cards(frame, &state.cards, chunks[1]);

    let items: Vec<ListItem> = state
        .menu
        .iter()
        .map(|item| ListItem::new(Spans::from(vec![Span::raw(item.label())])))
        .collect();

    let menu = List::new(items)
        .block(Block::default().title("Menu").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(menu, chunks[2], &mut state.list_state);

    let buttons = Paragraph::new("<Enter> Open | <Up/Down> Navigate | <Q> Sign out")
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[3]);
}

fn render_cards<B: Backend>(frame: &mut Frame<B>, cards: &[Card], area: Rect) {
    if cards.is_empty() {
        return;
    }
    let width = (100 / cards.len()) as u16;
    let constraints: Vec<Constraint> = cards.iter().map(|_| Constraint::Percentage(width)).collect();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for ((label, value), column) in cards.iter().zip(columns.iter()) {
        let card = Paragraph::new(Spans::from(Span::styled(
            value.as_str(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().borders(Borders::ALL).title(label.as_str()));
        frame.render_widget(card, *column);
    }
}

pub fn handle_key(state: &mut DashboardState, key: KeyCode) -> Option<DashboardAction> {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(DashboardAction::Open(MenuItem::SignOut)),
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        KeyCode::Enter => {
            if let Some(item) = state.selected_item() {
                return Some(DashboardAction::Open(item));
            }
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn week() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 13).unwrap()
    }

    fn user(id: i32, role: Role, active: bool) -> User {
        User {
            id,
            email: format!("u{id}@example.com"),
            full_name: format!("User {id}"),
            role,
            client_id: Some(1),
            is_active: active,
        }
    }

    fn sheet(user_id: i32, status: ApprovalStatus, week_start: NaiveDate, hours: f64) -> TimesheetOverview {
        TimesheetOverview {
            id: user_id * 10,
            user_id,
            week_start,
            status,
            submitted_at: None,
            rejection_reason: None,
            employee_name: format!("User {user_id}"),
            employee_email: format!("u{user_id}@example.com"),
            client_id: Some(1),
            total_hours: hours,
        }
    }

    fn expense(user_id: i32, status: ApprovalStatus, amount: f64) -> ExpenseReportOverview {
        ExpenseReportOverview {
            id: user_id * 10,
            user_id,
            title: format!("Trip {user_id}"),
            status,
            submitted_at: None,
            rejection_reason: None,
            employee_name: format!("User {user_id}"),
            employee_email: format!("u{user_id}@example.com"),
            client_id: Some(1),
            total_amount: amount,
            item_count: 1,
        }
    }

    fn card<'a>(cards: &'a [Card], label: &str) -> &'a str {
        cards.iter().find(|(l, _)| l == label).map(|(_, v)| v.as_str()).unwrap()
    }

    #[test]
    fn menus_grow_with_role() {
        assert_eq!(menu_for(Role::Employee).len(), 3);
        assert!(menu_for(Role::Manager).contains(&MenuItem::PendingApprovals));
        assert!(!menu_for(Role::Manager).contains(&MenuItem::Clients));
        assert!(menu_for(Role::Admin).contains(&MenuItem::SystemReports));
        assert_eq!(menu_for(Role::Admin).last(), Some(&MenuItem::SignOut));
    }

    #[test]
    fn admin_cards_count_active_rows_and_sum_this_week() {
        let previous_week = week() - chrono::Duration::days(7);
        let long_ago = week() - chrono::Duration::weeks(20);
        let data = DashboardData {
            users: vec![user(1, Role::Employee, true), user(2, Role::Employee, false), user(3, Role::Admin, true)],
            timesheets: vec![
                sheet(1, ApprovalStatus::Submitted, week(), 30.0),
                sheet(1, ApprovalStatus::PayrollApproved, previous_week, 40.0),
                sheet(2, ApprovalStatus::Draft, week(), 8.5),
            ],
            pending_timesheets: vec![
                sheet(1, ApprovalStatus::Submitted, week(), 30.0),
                sheet(2, ApprovalStatus::ClientApproved, long_ago, 12.0),
            ],
            expenses: vec![
                expense(1, ApprovalStatus::Submitted, 120.0),
                expense(2, ApprovalStatus::ClientApproved, 30.5),
                expense(3, ApprovalStatus::Draft, 99.0),
            ],
            current_week: Some(week()),
            ..Default::default()
        };
        let cards = admin_cards(&data);
        assert_eq!(card(&cards, "Active Employees"), "1");
        assert_eq!(card(&cards, "Pending Timesheets"), "2");
        assert_eq!(card(&cards, "Pending Expenses"), "2");
        assert_eq!(card(&cards, "Pending Expense Total"), "$150.50");
        assert_eq!(card(&cards, "Hours This Week"), "38.5");
        assert_eq!(card(&cards, "Approval Rate"), "50.0%");
    }

    #[test]
    fn manager_cards_count_submitted_share() {
        let data = DashboardData {
            timesheets: vec![
                sheet(1, ApprovalStatus::Submitted, week(), 40.0),
                sheet(2, ApprovalStatus::Draft, week(), 10.0),
            ],
            current_week: Some(week()),
            ..Default::default()
        };
        let cards = manager_cards(&data);
        assert_eq!(card(&cards, "Awaiting My Approval"), "1");
        assert_eq!(card(&cards, "Team Members"), "2");
        assert_eq!(card(&cards, "Submitted This Week"), "50%");
    }

    #[test]
    fn employee_without_current_sheet() {
        let data = DashboardData { current_week: Some(week()), ..Default::default() };
        assert_eq!(card(&employee_cards(&data), "This Week"), "no timesheet");
    }

    #[test]
    fn menu_navigation_wraps() {
        let state_user = user(1, Role::Employee, true);
        let mut state = DashboardState::new(state_user, &DashboardData::default());
        handle_key(&mut state, KeyCode::Up);
        assert_eq!(state.selected_item(), Some(MenuItem::SignOut));
        handle_key(&mut state, KeyCode::Down);
        assert!(matches!(
            handle_key(&mut state, KeyCode::Enter),
            Some(DashboardAction::Open(MenuItem::MyTimesheets))
        ));
    }
}
