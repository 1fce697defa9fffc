use crossterm::event::KeyCode;
use tui::{backend::Backend, Frame};

use crate::error::{require, ValidationError};
use crate::models::{Client, Project};
use crate::ui::components::form::{parse_date, parse_optional_date, render_form, FormField, FormOutcome, TextForm};

pub enum ProjectWizardAction {
    Cancel,
    Save(Project),
}

const NAME: usize = 0;
const CLIENT: usize = 1;
const DESCRIPTION: usize = 2;
const START: usize = 3;
const END: usize = 4;

pub struct ProjectWizardState {
    project_id: i32,
    is_active: bool,
    form: TextForm,
}

fn client_choices(clients: &[Client]) -> Vec<(String, String)> {
    clients
        .iter()
        .filter(|c| c.is_active)
        .map(|c| (c.id.to_string(), c.name.clone()))
        .collect()
}

impl ProjectWizardState {
    pub fn new(clients: &[Client], client_id: Option<i32>) -> Self {
        let today = chrono::Local::now().date_naive();
        let client = client_id.map(|id| id.to_string()).unwrap_or_default();
        Self {
            project_id: 0,
            is_active: true,
            form: TextForm::new(
                "Project Creation Wizard",
                vec![
                    FormField::text("Name", ""),
                    FormField::choice("Client", &client, client_choices(clients)),
                    FormField::text("Description", ""),
                    FormField::date("Start Date", Some(today)),
                    FormField::date("End Date", None),
                ],
            ),
        }
    }

    pub fn from_existing(clients: &[Client], project: Project) -> Self {
        Self {
            project_id: project.id,
            is_active: project.is_active,
            form: TextForm::new(
                "Project Editing Wizard",
                vec![
                    FormField::text("Name", project.name),
                    FormField::choice("Client", &project.client_id.to_string(), client_choices(clients)),
                    FormField::text("Description", project.description.unwrap_or_default()),
                    FormField::date("Start Date", Some(project.start_date)),
                    FormField::date("End Date", project.end_date),
                ],
            ),
        }
    }

    pub fn to_project(&self) -> Result<Project, ValidationError> {
        require("Name", self.form.value(NAME))?;
        let client_id = self
            .form
            .value(CLIENT)
            .parse::<i32>()
            .map_err(|_| ValidationError::Required("Client"))?;
        let start_date = parse_date("Start Date", self.form.value(START))?;
        let end_date = parse_optional_date("End Date", self.form.value(END))?;
        if let Some(end) = end_date {
            if end < start_date {
                return Err(ValidationError::EndBeforeStart { start: start_date, end });
            }
        }
        let description = self.form.value(DESCRIPTION).trim();

        Ok(Project {
            id: self.project_id,
            client_id,
            name: self.form.value(NAME).trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            start_date,
            end_date,
            is_active: self.is_active,
        })
    }
}

pub fn render_project_wizard<B: Backend>(frame: &mut Frame<B>, state: &mut ProjectWizardState) {
    render_form(frame, &state.form);
}

pub fn handle_key(state: &mut ProjectWizardState, key: KeyCode) -> Option<ProjectWizardAction> {
    match state.form.handle_key(key) {
        FormOutcome::Cancel => Some(ProjectWizardAction::Cancel),
        FormOutcome::Save => match state.to_project() {
            Ok(project) => Some(ProjectWizardAction::Save(project)),
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
    use chrono::NaiveDate;

    fn clients() -> Vec<Client> {
        vec![
            Client { id: 1, name: "Acme".into(), contact_email: "a@acme.com".into(), is_active: true },
            Client { id: 2, name: "Old".into(), contact_email: "a@old.com".into(), is_active: false },
            Client { id: 3, name: "Globex".into(), contact_email: "a@globex.com".into(), is_active: true },
        ]
    }

    #[test]
    fn only_active_clients_are_offered() {
        let state = ProjectWizardState::new(&clients(), None);
        let offered: Vec<&str> = state.form.fields[CLIENT].choices.iter().map(|(v, _)| v.as_str()).collect();
        assert_eq!(offered, vec!["1", "3"]);
        assert_eq!(state.form.value(CLIENT), "1");
    }

    #[test]
    fn end_before_start_is_rejected() {
        let project = Project {
            id: 4,
            client_id: 3,
            name: "Migration".into(),
            description: Some("move stuff".into()),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: None,
            is_active: true,
        };
        let mut state = ProjectWizardState::from_existing(&clients(), project);
        state.form.fields[END].value = "2024-02-01".into();
        assert!(matches!(state.to_project(), Err(ValidationError::EndBeforeStart { .. })));

        state.form.fields[END].value = "2024-12-31".into();
        let saved = state.to_project().unwrap();
        assert_eq!(saved.id, 4);
        assert_eq!(saved.client_id, 3);
        assert_eq!(saved.end_date, NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn blank_description_is_none() {
        let mut state = ProjectWizardState::new(&clients(), Some(3));
        state.form.fields[NAME].value = "Audit".into();
        let project = state.to_project().unwrap();
        assert_eq!(project.description, None);
        assert_eq!(project.client_id, 3);
    }
}
