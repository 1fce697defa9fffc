use crossterm::event::KeyCode;
use tui::{backend::Backend, Frame};

use crate::error::ValidationError;
use crate::models::{AssignmentOverview, Project, ProjectAssignment, User};
use crate::ui::components::form::{parse_amount, parse_date, parse_optional_date, render_form, FormField, FormOutcome, TextForm};

pub enum AssignmentWizardAction {
    Cancel,
    Save(ProjectAssignment),
}

const EMPLOYEE: usize = 0;
const PROJECT: usize = 1;
const START: usize = 2;
const END: usize = 3;
const RATE: usize = 4;

pub struct AssignmentWizardState {
    assignment_id: i32,
    form: TextForm,
}

fn employee_choices(users: &[User]) -> Vec<(String, String)> {
    users
        .iter()
        .filter(|u| u.is_active)
        .map(|u| (u.id.to_string(), format!("{} <{}>", u.full_name, u.email)))
        .collect()
}

fn project_choices(projects: &[Project]) -> Vec<(String, String)> {
    projects
        .iter()
        .filter(|p| p.is_active)
        .map(|p| (p.id.to_string(), p.name.clone()))
        .collect()
}

impl AssignmentWizardState {
    pub fn new(users: &[User], projects: &[Project]) -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            assignment_id: 0,
            form: TextForm::new(
                "Assignment Creation Wizard",
                vec![
                    FormField::choice("Employee", "", employee_choices(users)),
                    FormField::choice("Project", "", project_choices(projects)),
                    FormField::date("Start Date", Some(today)),
                    FormField::date("End Date", None),
                    FormField::number("Bill Rate", ""),
                ],
            ),
        }
    }

    pub fn from_existing(users: &[User], projects: &[Project], assignment: AssignmentOverview) -> Self {
        Self {
            assignment_id: assignment.id,
            form: TextForm::new(
                "Assignment Editing Wizard",
                vec![
                    FormField::choice("Employee", &assignment.user_id.to_string(), employee_choices(users)),
                    FormField::choice("Project", &assignment.project_id.to_string(), project_choices(projects)),
                    FormField::date("Start Date", Some(assignment.start_date)),
                    FormField::date("End Date", assignment.end_date),
                    FormField::number("Bill Rate", format!("{:.2}", assignment.bill_rate)),
                ],
            ),
        }
    }

    pub fn to_assignment(&self) -> Result<ProjectAssignment, ValidationError> {
        let user_id = self.form.value(EMPLOYEE).parse::<i32>().map_err(|_| ValidationError::Required("Employee"))?;
        let project_id = self.form.value(PROJECT).parse::<i32>().map_err(|_| ValidationError::Required("Project"))?;
        let start_date = parse_date("Start Date", self.form.value(START))?;
        let end_date = parse_optional_date("End Date", self.form.value(END))?;
        if let Some(end) = end_date {
            if end < start_date {
                return Err(ValidationError::EndBeforeStart { start: start_date, end });
            }
        }
        let bill_rate = parse_amount("Bill Rate", self.form.value(RATE))?;
        if bill_rate < 0.0 {
            return Err(ValidationError::AmountOutOfRange(bill_rate));
        }

        Ok(ProjectAssignment {
            id: self.assignment_id,
            user_id,
            project_id,
            start_date,
            end_date,
            bill_rate,
        })
    }
}

pub fn render_assignment_wizard<B: Backend>(frame: &mut Frame<B>, state: &mut AssignmentWizardState) {
    render_form(frame, &state.form);
}

pub fn handle_key(state: &mut AssignmentWizardState, key: KeyCode) -> Option<AssignmentWizardAction> {
    match state.form.handle_key(key) {
        FormOutcome::Cancel => Some(AssignmentWizardAction::Cancel),
        FormOutcome::Save => match state.to_assignment() {
            Ok(assignment) => Some(AssignmentWizardAction::Save(assignment)),
            Err(err) => {
                state.form.error = Some(err.to_string());
                None
            }
        },
        FormOutcome::Pending => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::NaiveDate;

    fn users() -> Vec<User> {
        vec![User {
            id: 3,
            email: "ada@example.com".into(),
            full_name: "Ada".into(),
            role: Role::Employee,
            client_id: Some(1),
            is_active: true,
        }]
    }

    fn projects() -> Vec<Project> {
        vec![Project {
            id: 8,
            client_id: 1,
            name: "Engine".into(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            is_active: true,
        }]
    }

    #[test]
    fn rate_is_required() {
        let state = AssignmentWizardState::new(&users(), &projects());
        assert_eq!(state.to_assignment(), Err(ValidationError::Required("Bill Rate")));
    }

    #[test]
    fn builds_assignment_from_choices() {
        let mut state = AssignmentWizardState::new(&users(), &projects());
        state.form.fields[START].value = "2024-02-01".into();
        state.form.fields[RATE].value = "95.5".into();
        let assignment = state.to_assignment().unwrap();
        assert_eq!((assignment.user_id, assignment.project_id), (3, 8));
        assert_eq!(assignment.bill_rate, 95.5);
        assert_eq!(assignment.end_date, None);
    }
}
