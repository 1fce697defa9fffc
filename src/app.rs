use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{Duration, Local, NaiveDate};
use crossterm::event::KeyCode;
use tui::{backend::Backend, Frame};

use crate::db::Database;
use crate::models::{week_end, week_start, Role, User};
use crate::reports::export::{default_file_name, export_to_file};
use crate::ui::{
    admin_timesheets::{self, render_admin_timesheets, AdminTimesheetAction, AdminTimesheetsState, AdminView},
    approvals::{self, render_approvals, ApprovalsAction, ApprovalsState},
    assignment_wizard::{self, render_assignment_wizard, AssignmentWizardAction, AssignmentWizardState},
    assignments::{self, render_assignments, AssignmentAction, AssignmentsState},
    client_wizard::{self, render_client_wizard, ClientWizardAction, ClientWizardState},
    clients::{self, render_clients, ClientAction, ClientsState},
    components::popup::render_flash,
    dashboard::{self, render_dashboard, DashboardAction, DashboardData, DashboardState, MenuItem},
    employee_wizard::{self, render_employee_wizard, EmployeeWizardAction, EmployeeWizardState},
    employees::{self, render_employees, EmployeeAction, EmployeesState},
    expense_editor::{self, render_expense_editor, ExpenseEditorAction, ExpenseEditorState},
    expenses::{self, render_expenses, ExpenseAction, ExpensesState},
    project_wizard::{self, render_project_wizard, ProjectWizardAction, ProjectWizardState},
    projects::{self, render_projects, ProjectAction, ProjectsState},
    reports::{self, render_reports, ReportAction, ReportData, ReportExport, ReportsState},
    sign_in::{self, render_sign_in, SignInAction, SignInState},
    timesheet_editor::{self, render_timesheet_editor, TimesheetEditorAction, TimesheetEditorState},
    timesheets::{self, render_timesheets, TimesheetAction, TimesheetsState},
};
use crate::workflow::ApprovalAction;

/// Screen an editor returns to
#[derive(Debug, Clone)]
pub enum Origin {
    Own,
    Approvals,
    AdminTimesheets(AdminView),
}

// Represents the current screen in the app
pub enum AppScreen {
    SignIn(SignInState),
    Dashboard(DashboardState),
    Clients(ClientsState),
    ClientWizard(ClientWizardState),
    Projects(ProjectsState),
    ProjectWizard(ProjectWizardState, Option<i32>), // client the project list was scoped to
    Employees(EmployeesState),
    EmployeeWizard(EmployeeWizardState),
    Assignments(AssignmentsState),
    AssignmentWizard(AssignmentWizardState),
    Timesheets(TimesheetsState),
    TimesheetEditor(TimesheetEditorState, Origin),
    Expenses(ExpensesState),
    ExpenseEditor(ExpenseEditorState, Origin),
    Approvals(ApprovalsState),
    AdminTimesheets(AdminTimesheetsState),
    Reports(ReportsState),
}

// Main application state
pub struct App {
    db: Database,
    user: Option<User>,
    screen: AppScreen,
    /// One line message shown until the next key press
    flash: Option<String>,
    should_quit: bool,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Default range for timesheet administration: the last eight weeks
fn recent_weeks() -> (NaiveDate, NaiveDate) {
    let current = week_start(today());
    (current - Duration::weeks(7), current)
}

/// Default range for reports: the last four full weeks including this one
fn report_range() -> (NaiveDate, NaiveDate) {
    let current = week_start(today());
    (current - Duration::weeks(3), week_end(current))
}

impl App {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            user: None,
            screen: AppScreen::SignIn(SignInState::new(Vec::new())),
            flash: None,
            should_quit: false,
        }
    }

    /// Shows the user picker, or goes straight to the dashboard when `email` names an active user.
    pub async fn start(&mut self, email: Option<&str>) -> Result<()> {
        if let Some(email) = email {
            match self.db.find_user_by_email(email).await {
                Ok(Some(user)) => {
                    tracing::info!(user_id = user.id, "signed in from configuration");
                    self.user = Some(user);
                    return self.open_dashboard().await;
                }
                Ok(None) => {
                    tracing::warn!(email, "configured user not found or inactive");
                    self.flash = Some(format!("No active user with email {email}"));
                }
                Err(err) => {
                    tracing::error!(error = %err, email, "configured user lookup failed");
                    self.flash = Some(format!("Could not look up {email}: {err:#}"));
                }
            }
        }
        self.open_sign_in().await
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn current_user(&self) -> Result<User> {
        self.user.clone().ok_or_else(|| anyhow!("not signed in"))
    }

    /// Load failures are reported and replaced by an empty result so the screen still opens
    fn or_empty<T: Default>(&mut self, result: Result<T>, what: &str) -> T {
        match result {
            Ok(rows) => rows,
            Err(err) => {
                tracing::error!(error = %err, what, "load failed");
                self.flash = Some(format!("Could not load {what}: {err:#}"));
                T::default()
            }
        }
    }

    pub fn render<B: Backend>(&mut self, frame: &mut Frame<B>) {
        match &mut self.screen {
            AppScreen::SignIn(state) => render_sign_in(frame, state),
            AppScreen::Dashboard(state) => render_dashboard(frame, state),
            AppScreen::Clients(state) => render_clients(frame, state),
            AppScreen::ClientWizard(state) => render_client_wizard(frame, state),
            AppScreen::Projects(state) => render_projects(frame, state),
            AppScreen::ProjectWizard(state, _) => render_project_wizard(frame, state),
            AppScreen::Employees(state) => render_employees(frame, state),
            AppScreen::EmployeeWizard(state) => render_employee_wizard(frame, state),
            AppScreen::Assignments(state) => render_assignments(frame, state),
            AppScreen::AssignmentWizard(state) => render_assignment_wizard(frame, state),
            AppScreen::Timesheets(state) => render_timesheets(frame, state),
            AppScreen::TimesheetEditor(state, _) => render_timesheet_editor(frame, state),
            AppScreen::Expenses(state) => render_expenses(frame, state),
            AppScreen::ExpenseEditor(state, _) => render_expense_editor(frame, state),
            AppScreen::Approvals(state) => render_approvals(frame, state),
            AppScreen::AdminTimesheets(state) => render_admin_timesheets(frame, state),
            AppScreen::Reports(state) => render_reports(frame, state),
        }

        if let Some(message) = &self.flash {
            render_flash(frame, message);
        }
    }

    /// Handles one key press. Errors from the action are logged and shown in the flash line.
    pub async fn handle_key(&mut self, key: KeyCode) {
        self.flash = None;
        if let Err(err) = self.dispatch(key).await {
            tracing::error!(error = %err, "action failed");
            self.flash = Some(format!("{err:#}"));
        }
    }

    async fn dispatch(&mut self, key: KeyCode) -> Result<()> {
        match &mut self.screen {
            AppScreen::SignIn(state) => {
                let action = sign_in::handle_key(state, key);
                self.on_sign_in(action).await
            }
            AppScreen::Dashboard(state) => {
                let action = dashboard::handle_key(state, key);
                self.on_dashboard(action).await
            }
            AppScreen::Clients(state) => {
                let action = clients::handle_key(state, key);
                self.on_clients(action).await
            }
            AppScreen::ClientWizard(state) => {
                let action = client_wizard::handle_key(state, key);
                self.on_client_wizard(action).await
            }
            AppScreen::Projects(state) => {
                let scope = state.scope().map(|c| c.id);
                let action = projects::handle_key(state, key);
                self.on_projects(action, scope).await
            }
            AppScreen::ProjectWizard(state, scope) => {
                let scope = *scope;
                let action = project_wizard::handle_key(state, key);
                self.on_project_wizard(action, scope).await
            }
            AppScreen::Employees(state) => {
                let action = employees::handle_key(state, key);
                self.on_employees(action).await
            }
            AppScreen::EmployeeWizard(state) => {
                let action = employee_wizard::handle_key(state, key);
                self.on_employee_wizard(action).await
            }
            AppScreen::Assignments(state) => {
                let action = assignments::handle_key(state, key);
                self.on_assignments(action).await
            }
            AppScreen::AssignmentWizard(state) => {
                let action = assignment_wizard::handle_key(state, key);
                self.on_assignment_wizard(action).await
            }
            AppScreen::Timesheets(state) => {
                let action = timesheets::handle_key(state, key);
                self.on_timesheets(action).await
            }
            AppScreen::TimesheetEditor(state, origin) => {
                let origin = origin.clone();
                let timesheet_id = state.timesheet.id;
                let action = timesheet_editor::handle_key(state, key);
                self.on_timesheet_editor(action, timesheet_id, origin).await
            }
            AppScreen::Expenses(state) => {
                let action = expenses::handle_key(state, key);
                self.on_expenses(action).await
            }
            AppScreen::ExpenseEditor(state, origin) => {
                let origin = origin.clone();
                let report_id = state.report.id;
                let action = expense_editor::handle_key(state, key, today());
                self.on_expense_editor(action, report_id, origin).await
            }
            AppScreen::Approvals(state) => {
                let action = approvals::handle_key(state, key);
                self.on_approvals(action).await
            }
            AppScreen::AdminTimesheets(state) => {
                let view = state.view();
                let action = admin_timesheets::handle_key(state, key);
                self.on_admin_timesheets(action, view).await
            }
            AppScreen::Reports(state) => {
                let action = reports::handle_key(state, key);
                self.on_reports(action).await
            }
        }
    }

    // Screen loaders

    async fn open_sign_in(&mut self) -> Result<()> {
        self.user = None;
        let users = self.db.load_users(false).await;
        let users = self.or_empty(users, "users");
        self.screen = AppScreen::SignIn(SignInState::new(users));
        Ok(())
    }

    async fn open_dashboard(&mut self) -> Result<()> {
        let user = self.current_user()?;
        let (from, to) = recent_weeks();
        let mut data = DashboardData { current_week: Some(week_start(today())), ..DashboardData::default() };
        match user.role {
            Role::Admin => {
                let users = self.db.load_users(true).await;
                data.users = self.or_empty(users, "employees");
                let clients = self.db.load_clients(true).await;
                data.clients = self.or_empty(clients, "clients");
                let projects = self.db.load_projects(true).await;
                data.projects = self.or_empty(projects, "projects");
                let timesheets = self.db.load_timesheets(from, to).await;
                data.timesheets = self.or_empty(timesheets, "timesheets");
                let pending = self.db.load_pending_timesheets().await;
                data.pending_timesheets = self.or_empty(pending, "pending timesheets");
                let expenses = self.db.load_expense_reports().await;
                data.expenses = self.or_empty(expenses, "expense reports");
            }
            Role::Manager => {
                let in_team = |client_id: Option<i32>, owner: i32| {
                    client_id.is_some() && client_id == user.client_id && owner != user.id
                };
                let timesheets = self.db.load_timesheets(from, to).await;
                data.timesheets = self.or_empty(timesheets, "timesheets");
                data.timesheets.retain(|t| in_team(t.client_id, t.user_id));
                let expenses = self.db.load_expense_reports().await;
                data.expenses = self.or_empty(expenses, "expense reports");
                data.expenses.retain(|e| in_team(e.client_id, e.user_id));
            }
            Role::Employee => {
                let timesheets = self.db.load_timesheets_for_user(user.id).await;
                data.timesheets = self.or_empty(timesheets, "timesheets");
                let expenses = self.db.load_expense_reports_for_user(user.id).await;
                data.expenses = self.or_empty(expenses, "expense reports");
            }
        }

        tracing::debug!(user_id = user.id, "dashboard loaded");
        self.screen = AppScreen::Dashboard(DashboardState::new(user, &data));
        Ok(())
    }

    async fn open_clients(&mut self) -> Result<()> {
        let clients = self.db.load_clients(true).await;
        let clients = self.or_empty(clients, "clients");
        self.screen = AppScreen::Clients(ClientsState::new(clients));
        Ok(())
    }

    async fn open_projects(&mut self, scope: Option<i32>) -> Result<()> {
        let clients = self.db.load_clients(true).await;
        let clients = self.or_empty(clients, "clients");
        let projects = self.db.load_projects(true).await;
        let projects = self.or_empty(projects, "projects");
        let scope = scope.and_then(|id| clients.iter().find(|c| c.id == id).cloned());
        self.screen = AppScreen::Projects(ProjectsState::new(scope, &clients, projects));
        Ok(())
    }

    async fn open_employees(&mut self) -> Result<()> {
        let user = self.current_user()?;
        let users = self.db.load_users(true).await;
        let users = self.or_empty(users, "employees");
        let clients = self.db.load_clients(true).await;
        let clients = self.or_empty(clients, "clients");
        self.screen = AppScreen::Employees(EmployeesState::new(user.id, users, &clients));
        Ok(())
    }

    async fn open_assignments(&mut self) -> Result<()> {
        let assignments = self.db.load_assignment_overviews().await;
        let assignments = self.or_empty(assignments, "assignments");
        self.screen = AppScreen::Assignments(AssignmentsState::new(assignments));
        Ok(())
    }

    async fn open_timesheets(&mut self) -> Result<()> {
        let user = self.current_user()?;
        let sheets = self.db.load_timesheets_for_user(user.id).await;
        let sheets = self.or_empty(sheets, "timesheets");
        self.screen = AppScreen::Timesheets(TimesheetsState::new(sheets, today()));
        Ok(())
    }

    async fn open_timesheet(&mut self, timesheet_id: i32, origin: Origin) -> Result<()> {
        let user = self.current_user()?;
        let sheet = self.db.get_timesheet(timesheet_id).await?;
        let entries = self.db.load_time_entries(timesheet_id).await;
        let entries = self.or_empty(entries, "time entries");
        let assignments = self.db.load_assignments_for_user(sheet.user_id).await;
        let assignments = self.or_empty(assignments, "assignments");
        let projects = self.db.load_projects(true).await;
        let projects = self.or_empty(projects, "projects");
        let state = TimesheetEditorState::new(sheet, entries, assignments, &projects, user.id);
        self.screen = AppScreen::TimesheetEditor(state, origin);
        Ok(())
    }

    async fn open_expenses(&mut self) -> Result<()> {
        let user = self.current_user()?;
        let reports = self.db.load_expense_reports_for_user(user.id).await;
        let reports = self.or_empty(reports, "expense reports");
        self.screen = AppScreen::Expenses(ExpensesState::new(reports));
        Ok(())
    }

    async fn open_expense_report(&mut self, report_id: i32, origin: Origin) -> Result<()> {
        let user = self.current_user()?;
        let report = self.db.get_expense_report(report_id).await?;
        let items = self.db.load_expense_items(report_id).await;
        let items = self.or_empty(items, "expense items");
        let projects = self.db.load_projects(false).await;
        let projects = self.or_empty(projects, "projects");
        let state = ExpenseEditorState::new(report, items, &projects, user.id);
        self.screen = AppScreen::ExpenseEditor(state, origin);
        Ok(())
    }

    async fn open_approvals(&mut self) -> Result<()> {
        let user = self.current_user()?;
        let sheets = self.db.load_pending_timesheets().await;
        let sheets = self.or_empty(sheets, "pending timesheets");
        let reports = self.db.load_pending_expense_reports().await;
        let reports = self.or_empty(reports, "pending expense reports");
        self.screen = AppScreen::Approvals(ApprovalsState::new(&user, sheets, reports));
        Ok(())
    }

    async fn load_admin_timesheets(&mut self, from: NaiveDate, to: NaiveDate) -> Result<()> {
        let sheets = self.db.load_timesheets(from, to).await;
        let sheets = self.or_empty(sheets, "timesheets");
        match &mut self.screen {
            AppScreen::AdminTimesheets(state) => state.replace_rows(sheets, from, to),
            _ => self.screen = AppScreen::AdminTimesheets(AdminTimesheetsState::new(sheets, from, to)),
        }
        Ok(())
    }

    /// Report rows over `[from, to]`; managers only see their own client
    async fn load_report_data(&mut self, from: NaiveDate, to: NaiveDate) -> Result<ReportData> {
        let user = self.current_user()?;
        let scope = match user.role {
            Role::Admin => None,
            _ => Some(user.client_id.ok_or_else(|| anyhow!("{} is not linked to a client", user.full_name))?),
        };

        let entries = self.db.load_entry_details(from, to, scope).await?;
        let assignments = self.db.load_assignments().await?;
        let mut employees = self.db.load_users(false).await?;
        let mut timesheets = self.db.load_timesheets(week_start(from), to).await?;
        employees.retain(|u| u.role == Role::Employee);
        if let Some(client_id) = scope {
            employees.retain(|u| u.client_id == Some(client_id));
            timesheets.retain(|t| t.client_id == Some(client_id));
        }

        Ok(ReportData { entries, assignments, employees, timesheets })
    }

    async fn open_reports(&mut self) -> Result<()> {
        let user = self.current_user()?;
        let (from, to) = report_range();
        let data = self.load_report_data(from, to).await;
        let data = self.or_empty(data, "report data");
        let title = match user.role {
            Role::Admin => "System Reports",
            _ => "Team Reports",
        };
        self.screen = AppScreen::Reports(ReportsState::new(title, data, from, to));
        Ok(())
    }

    async fn back_to(&mut self, origin: Origin) -> Result<()> {
        match origin {
            Origin::Own => match self.screen {
                AppScreen::ExpenseEditor(..) => self.open_expenses().await,
                _ => self.open_timesheets().await,
            },
            Origin::Approvals => self.open_approvals().await,
            Origin::AdminTimesheets(view) => {
                let sheets = self.db.load_timesheets(view.from, view.to).await;
                let sheets = self.or_empty(sheets, "timesheets");
                self.screen = AppScreen::AdminTimesheets(AdminTimesheetsState::restore(sheets, view));
                Ok(())
            }
        }
    }

    // Action handlers

    async fn on_sign_in(&mut self, action: Option<SignInAction>) -> Result<()> {
        match action {
            Some(SignInAction::Exit) => self.should_quit = true,
            Some(SignInAction::SignIn(user)) => {
                tracing::info!(user_id = user.id, role = %user.role, "signed in");
                self.user = Some(user);
                self.open_dashboard().await?;
            }
            None => {}
        }
        Ok(())
    }

    async fn on_dashboard(&mut self, action: Option<DashboardAction>) -> Result<()> {
        let Some(DashboardAction::Open(item)) = action else {
            return Ok(());
        };
        match item {
            MenuItem::MyTimesheets => self.open_timesheets().await,
            MenuItem::MyExpenses => self.open_expenses().await,
            MenuItem::PendingApprovals => self.open_approvals().await,
            MenuItem::ManagerReports | MenuItem::SystemReports => self.open_reports().await,
            MenuItem::Clients => self.open_clients().await,
            MenuItem::Projects => self.open_projects(None).await,
            MenuItem::Employees => self.open_employees().await,
            MenuItem::Assignments => self.open_assignments().await,
            MenuItem::AllTimesheets => {
                let (from, to) = recent_weeks();
                self.load_admin_timesheets(from, to).await
            }
            MenuItem::SignOut => {
                if let Some(user) = &self.user {
                    tracing::info!(user_id = user.id, "signed out");
                }
                self.open_sign_in().await
            }
        }
    }

    async fn on_clients(&mut self, action: Option<ClientAction>) -> Result<()> {
        match action {
            Some(ClientAction::Back) => self.open_dashboard().await?,
            Some(ClientAction::NewClient) => {
                self.screen = AppScreen::ClientWizard(ClientWizardState::new());
            }
            Some(ClientAction::EditClient(client)) => {
                self.screen = AppScreen::ClientWizard(ClientWizardState::from_existing(client));
            }
            Some(ClientAction::SetActive(client_id, active)) => {
                self.db.set_client_active(client_id, active).await?;
                self.open_clients().await?;
            }
            Some(ClientAction::ViewProjects(client_id)) => self.open_projects(Some(client_id)).await?,
            None => {}
        }
        Ok(())
    }

    async fn on_client_wizard(&mut self, action: Option<ClientWizardAction>) -> Result<()> {
        match action {
            Some(ClientWizardAction::Cancel) => self.open_clients().await?,
            Some(ClientWizardAction::Save(client)) => {
                if client.id == 0 {
                    self.db.create_client(&client).await?;
                } else {
                    self.db.update_client(&client).await?;
                }
                self.open_clients().await?;
            }
            None => {}
        }
        Ok(())
    }

    async fn on_projects(&mut self, action: Option<ProjectAction>, scope: Option<i32>) -> Result<()> {
        match action {
            Some(ProjectAction::Back) => match scope {
                Some(_) => self.open_clients().await?,
                None => self.open_dashboard().await?,
            },
            Some(ProjectAction::NewProject(client_id)) => {
                let clients = self.db.load_clients(false).await?;
                if clients.is_empty() {
                    self.flash = Some("Create a client before adding projects".to_string());
                    return Ok(());
                }
                self.screen = AppScreen::ProjectWizard(ProjectWizardState::new(&clients, client_id), scope);
            }
            Some(ProjectAction::EditProject(project)) => {
                let clients = self.db.load_clients(true).await?;
                self.screen = AppScreen::ProjectWizard(ProjectWizardState::from_existing(&clients, project), scope);
            }
            Some(ProjectAction::SetActive(project_id, active)) => {
                self.db.set_project_active(project_id, active).await?;
                self.open_projects(scope).await?;
            }
            None => {}
        }
        Ok(())
    }

    async fn on_project_wizard(&mut self, action: Option<ProjectWizardAction>, scope: Option<i32>) -> Result<()> {
        match action {
            Some(ProjectWizardAction::Cancel) => self.open_projects(scope).await?,
            Some(ProjectWizardAction::Save(project)) => {
                if project.id == 0 {
                    self.db.create_project(&project).await?;
                } else {
                    self.db.update_project(&project).await?;
                }
                self.open_projects(scope).await?;
            }
            None => {}
        }
        Ok(())
    }

    async fn on_employees(&mut self, action: Option<EmployeeAction>) -> Result<()> {
        match action {
            Some(EmployeeAction::Back) => self.open_dashboard().await?,
            Some(EmployeeAction::NewEmployee) => {
                let clients = self.db.load_clients(false).await?;
                self.screen = AppScreen::EmployeeWizard(EmployeeWizardState::new(&clients));
            }
            Some(EmployeeAction::EditEmployee(user)) => {
                let clients = self.db.load_clients(true).await?;
                self.screen = AppScreen::EmployeeWizard(EmployeeWizardState::from_existing(&clients, user));
            }
            Some(EmployeeAction::SetActive(user_id, active)) => {
                self.db.set_user_active(user_id, active).await?;
                self.open_employees().await?;
            }
            None => {}
        }
        Ok(())
    }

    async fn on_employee_wizard(&mut self, action: Option<EmployeeWizardAction>) -> Result<()> {
        match action {
            Some(EmployeeWizardAction::Cancel) => self.open_employees().await?,
            Some(EmployeeWizardAction::Save(user)) => {
                if user.id == 0 {
                    self.db.create_user(&user).await?;
                } else {
                    self.db.update_user(&user).await?;
                }
                if self.user.as_ref().map_or(false, |me| me.id == user.id) {
                    self.user = Some(user);
                }
                self.open_employees().await?;
            }
            None => {}
        }
        Ok(())
    }

    async fn on_assignments(&mut self, action: Option<AssignmentAction>) -> Result<()> {
        match action {
            Some(AssignmentAction::Back) => self.open_dashboard().await?,
            Some(AssignmentAction::NewAssignment) => {
                let users = self.db.load_users(false).await?;
                let projects = self.db.load_projects(false).await?;
                if users.is_empty() || projects.is_empty() {
                    self.flash = Some("Assignments need at least one active employee and project".to_string());
                    return Ok(());
                }
                self.screen = AppScreen::AssignmentWizard(AssignmentWizardState::new(&users, &projects));
            }
            Some(AssignmentAction::EditAssignment(assignment)) => {
                let users = self.db.load_users(true).await?;
                let projects = self.db.load_projects(true).await?;
                self.screen = AppScreen::AssignmentWizard(AssignmentWizardState::from_existing(&users, &projects, assignment));
            }
            Some(AssignmentAction::DeleteAssignment(id)) => {
                self.db.delete_assignment(id).await?;
                self.open_assignments().await?;
            }
            None => {}
        }
        Ok(())
    }

    async fn on_assignment_wizard(&mut self, action: Option<AssignmentWizardAction>) -> Result<()> {
        match action {
            Some(AssignmentWizardAction::Cancel) => self.open_assignments().await?,
            Some(AssignmentWizardAction::Save(assignment)) => {
                // an overlap leaves the wizard open with the error in the flash line
                self.db.save_assignment(&assignment).await?;
                self.open_assignments().await?;
            }
            None => {}
        }
        Ok(())
    }

    async fn on_timesheets(&mut self, action: Option<TimesheetAction>) -> Result<()> {
        let user = self.current_user()?;
        match action {
            Some(TimesheetAction::Back) => self.open_dashboard().await?,
            Some(TimesheetAction::OpenWeek(week)) => {
                let sheet = self.db.get_or_create_timesheet(user.id, week).await?;
                self.open_timesheet(sheet.id, Origin::Own).await?;
            }
            Some(TimesheetAction::Open(id)) => self.open_timesheet(id, Origin::Own).await?,
            Some(TimesheetAction::Submit(id)) => {
                let status = self.db.apply_timesheet_action(&user, id, &ApprovalAction::Submit).await?;
                self.open_timesheets().await?;
                self.flash = Some(format!("Timesheet {}", status.label().to_lowercase()));
            }
            Some(TimesheetAction::Delete(id)) => {
                self.db.delete_timesheet(id).await?;
                self.open_timesheets().await?;
            }
            None => {}
        }
        Ok(())
    }

    async fn on_timesheet_editor(
        &mut self,
        action: Option<TimesheetEditorAction>,
        timesheet_id: i32,
        origin: Origin,
    ) -> Result<()> {
        match action {
            Some(TimesheetEditorAction::Back) => self.back_to(origin).await?,
            Some(TimesheetEditorAction::SaveEntry(entry)) => match self.db.save_time_entry(&entry).await {
                Ok(_) => self.open_timesheet(timesheet_id, origin).await?,
                Err(err) => {
                    tracing::warn!(timesheet_id, error = %err, "time entry not saved");
                    if let AppScreen::TimesheetEditor(state, _) = &mut self.screen {
                        state.show_form_error(format!("{err:#}"));
                    }
                }
            },
            Some(TimesheetEditorAction::DeleteEntry(entry_id)) => {
                self.db.delete_time_entry(timesheet_id, entry_id).await?;
                self.open_timesheet(timesheet_id, origin).await?;
            }
            Some(TimesheetEditorAction::Submit) => {
                let user = self.current_user()?;
                let status = self.db.apply_timesheet_action(&user, timesheet_id, &ApprovalAction::Submit).await?;
                self.open_timesheet(timesheet_id, origin).await?;
                self.flash = Some(format!("Timesheet {}", status.label().to_lowercase()));
            }
            None => {}
        }
        Ok(())
    }

    async fn on_expenses(&mut self, action: Option<ExpenseAction>) -> Result<()> {
        let user = self.current_user()?;
        match action {
            Some(ExpenseAction::Back) => self.open_dashboard().await?,
            Some(ExpenseAction::Create(title)) => {
                let id = self.db.create_expense_report(user.id, &title).await?;
                self.open_expense_report(id, Origin::Own).await?;
            }
            Some(ExpenseAction::Open(id)) => self.open_expense_report(id, Origin::Own).await?,
            Some(ExpenseAction::Submit(id)) => {
                let status = self.db.apply_expense_action(&user, id, &ApprovalAction::Submit).await?;
                self.open_expenses().await?;
                self.flash = Some(format!("Expense report {}", status.label().to_lowercase()));
            }
            Some(ExpenseAction::Delete(id)) => {
                self.db.delete_expense_report(id).await?;
                self.open_expenses().await?;
            }
            None => {}
        }
        Ok(())
    }

    async fn on_expense_editor(&mut self, action: Option<ExpenseEditorAction>, report_id: i32, origin: Origin) -> Result<()> {
        match action {
            Some(ExpenseEditorAction::Back) => self.back_to(origin).await?,
            Some(ExpenseEditorAction::SaveItem(item)) => match self.db.save_expense_item(&item).await {
                Ok(_) => self.open_expense_report(report_id, origin).await?,
                Err(err) => {
                    tracing::warn!(report_id, error = %err, "expense item not saved");
                    if let AppScreen::ExpenseEditor(state, _) = &mut self.screen {
                        state.show_form_error(format!("{err:#}"));
                    }
                }
            },
            Some(ExpenseEditorAction::DeleteItem(item_id)) => {
                self.db.delete_expense_item(report_id, item_id).await?;
                self.open_expense_report(report_id, origin).await?;
            }
            Some(ExpenseEditorAction::Submit) => {
                let user = self.current_user()?;
                let status = self.db.apply_expense_action(&user, report_id, &ApprovalAction::Submit).await?;
                self.open_expense_report(report_id, origin).await?;
                self.flash = Some(format!("Expense report {}", status.label().to_lowercase()));
            }
            None => {}
        }
        Ok(())
    }

    async fn on_approvals(&mut self, action: Option<ApprovalsAction>) -> Result<()> {
        let user = self.current_user()?;
        match action {
            Some(ApprovalsAction::Back) => self.open_dashboard().await?,
            Some(ApprovalsAction::OpenTimesheet(id)) => self.open_timesheet(id, Origin::Approvals).await?,
            Some(ApprovalsAction::OpenExpense(id)) => self.open_expense_report(id, Origin::Approvals).await?,
            Some(ApprovalsAction::Timesheet(id, action)) => {
                let status = self.db.apply_timesheet_action(&user, id, &action).await?;
                self.open_approvals().await?;
                self.flash = Some(format!("Timesheet {}", status.label().to_lowercase()));
            }
            Some(ApprovalsAction::Expense(id, action)) => {
                let status = self.db.apply_expense_action(&user, id, &action).await?;
                self.open_approvals().await?;
                self.flash = Some(format!("Expense report {}", status.label().to_lowercase()));
            }
            None => {}
        }
        Ok(())
    }

    async fn on_admin_timesheets(
        &mut self,
        action: Option<AdminTimesheetAction>,
        view: AdminView,
    ) -> Result<()> {
        match action {
            Some(AdminTimesheetAction::Back) => self.open_dashboard().await?,
            Some(AdminTimesheetAction::Reload { from, to }) => self.load_admin_timesheets(from, to).await?,
            Some(AdminTimesheetAction::Open(id)) => self.open_timesheet(id, Origin::AdminTimesheets(view)).await?,
            Some(AdminTimesheetAction::Export(rows)) => {
                let path = PathBuf::from(default_file_name("timesheets"));
                let written = export_to_file(&path, &rows)?;
                self.flash = Some(format!("Exported {} timesheets to {}", written, path.display()));
            }
            Some(AdminTimesheetAction::Transition(ids, action)) => {
                let user = self.current_user()?;
                let mut moved = 0;
                let mut failures = Vec::new();
                for id in &ids {
                    match self.db.apply_timesheet_action(&user, *id, &action).await {
                        Ok(_) => moved += 1,
                        Err(err) => failures.push(format!("#{id}: {err}")),
                    }
                }
                self.load_admin_timesheets(view.from, view.to).await?;
                self.flash = Some(if failures.is_empty() {
                    format!("{}: {} timesheet(s) updated", action.name(), moved)
                } else {
                    format!("{}: {} of {} updated; {}", action.name(), moved, ids.len(), failures.join("; "))
                });
            }
            None => {}
        }
        Ok(())
    }

    async fn on_reports(&mut self, action: Option<ReportAction>) -> Result<()> {
        match action {
            Some(ReportAction::Back) => self.open_dashboard().await?,
            Some(ReportAction::Reload { from, to }) => {
                let data = self.load_report_data(from, to).await?;
                if let AppScreen::Reports(state) = &mut self.screen {
                    state.replace_data(data, from, to);
                }
            }
            Some(ReportAction::Export(export)) => {
                let (kind, written, path) = match export {
                    ReportExport::Billing(lines) => {
                        let path = PathBuf::from(default_file_name("billing"));
                        ("billing lines", export_to_file(&path, &lines)?, path)
                    }
                    ReportExport::Compliance(report) => {
                        let path = PathBuf::from(default_file_name("compliance"));
                        ("missing timesheets", export_to_file(&path, &report.missing)?, path)
                    }
                    ReportExport::Entries(entries) => {
                        let path = PathBuf::from(default_file_name("time_entries"));
                        ("time entries", export_to_file(&path, &entries)?, path)
                    }
                };
                self.flash = Some(format!("Exported {} {} to {}", written, kind, path.display()));
            }
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> User {
        User {
            id: 1,
            email: "admin@example.com".into(),
            full_name: "Ada Admin".into(),
            role: Role::Admin,
            client_id: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn dashboard_opens_empty_when_loads_fail() {
        let mut app = App::new(Database::unreachable());
        app.user = Some(admin());

        app.open_dashboard().await.unwrap();
        assert!(matches!(app.screen, AppScreen::Dashboard(_)));
        assert!(app.flash.as_deref().unwrap().starts_with("Could not load"));
    }

    #[tokio::test]
    async fn start_falls_back_to_sign_in_when_lookup_fails() {
        let mut app = App::new(Database::unreachable());

        app.start(Some("admin@example.com")).await.unwrap();
        assert!(app.user.is_none());
        assert!(matches!(app.screen, AppScreen::SignIn(_)));
        assert!(app.flash.is_some());
    }
}
