use crossterm::event::KeyCode;
use tui::{backend::Backend, Frame};

use crate::error::{check_email, require, ValidationError};
use crate::models::{Client, Role, User};
use crate::ui::components::form::{render_form, FormField, FormOutcome, TextForm};

pub enum EmployeeWizardAction {
    Cancel,
    Save(User),
}

const NAME: usize = 0;
const EMAIL: usize = 1;
const ROLE: usize = 2;
const CLIENT: usize = 3;

pub struct EmployeeWizardState {
    user_id: i32,
    is_active: bool,
    form: TextForm,
}

fn role_choices() -> Vec<(String, String)> {
    [Role::Employee, Role::Manager, Role::Admin]
        .iter()
        .map(|r| (r.as_str().to_string(), r.as_str().to_string()))
        .collect()
}

fn client_choices(clients: &[Client]) -> Vec<(String, String)> {
    let mut choices = vec![(String::new(), "No client".to_string())];
    choices.extend(clients.iter().filter(|c| c.is_active).map(|c| (c.id.to_string(), c.name.clone())));
    choices
}

impl EmployeeWizardState {
    pub fn new(clients: &[Client]) -> Self {
        Self {
            user_id: 0,
            is_active: true,
            form: TextForm::new(
                "Employee Creation Wizard",
                vec![
                    FormField::text("Full Name", ""),
                    FormField::text("Email", ""),
                    FormField::choice("Role", Role::Employee.as_str(), role_choices()),
                    FormField::choice("Client", "", client_choices(clients)),
                ],
            ),
        }
    }

    pub fn from_existing(clients: &[Client], user: User) -> Self {
        let client = user.client_id.map(|id| id.to_string()).unwrap_or_default();
        Self {
            user_id: user.id,
            is_active: user.is_active,
            form: TextForm::new(
                "Employee Editing Wizard",
                vec![
                    FormField::text("Full Name", user.full_name),
                    FormField::text("Email", user.email),
                    FormField::choice("Role", user.role.as_str(), role_choices()),
                    FormField::choice("Client", &client, client_choices(clients)),
                ],
            ),
        }
    }

    pub fn to_user(&self) -> Result<User, ValidationError> {
        require("Full Name", self.form.value(NAME))?;
        let email = self.form.value(EMAIL).trim().to_lowercase();
        check_email(&email)?;
        let role = Role::try_from(self.form.value(ROLE).to_string()).map_err(|_| ValidationError::Required("Role"))?;
        let client_id = self.form.value(CLIENT).parse::<i32>().ok();
        if role == Role::Manager && client_id.is_none() {
            return Err(ValidationError::Required("Client (managers approve for a client)"));
        }

        Ok(User {
            id: self.user_id,
            email,
            full_name: self.form.value(NAME).trim().to_string(),
            role,
            client_id,
            is_active: self.is_active,
        })
    }
}

pub fn render_employee_wizard<B: Backend>(frame: &mut Frame<B>, state: &mut EmployeeWizardState) {
    render_form(frame, &state.form);
}

pub fn handle_key(state: &mut EmployeeWizardState, key: KeyCode) -> Option<EmployeeWizardAction> {
    match state.form.handle_key(key) {
        FormOutcome::Cancel => Some(EmployeeWizardAction::Cancel),
        FormOutcome::Save => match state.to_user() {
            Ok(user) => Some(EmployeeWizardAction::Save(user)),
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

    fn clients() -> Vec<Client> {
        vec![Client { id: 7, name: "Acme".into(), contact_email: "a@acme.com".into(), is_active: true }]
    }

    #[test]
    fn new_employee_defaults() {
        let mut state = EmployeeWizardState::new(&clients());
        state.form.fields[NAME].value = "Ada Lovelace".into();
        state.form.fields[EMAIL].value = " Ada@Example.com ".into();
        let user = state.to_user().unwrap();
        assert_eq!(user.role, Role::Employee);
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.client_id, None);
    }

    #[test]
    fn managers_need_a_client() {
        let mut state = EmployeeWizardState::new(&clients());
        state.form.fields[NAME].value = "Grace".into();
        state.form.fields[EMAIL].value = "grace@example.com".into();
        state.form.fields[ROLE].value = "manager".into();
        assert!(matches!(state.to_user(), Err(ValidationError::Required(_))));

        state.form.fields[CLIENT].value = "7".into();
        assert_eq!(state.to_user().unwrap().client_id, Some(7));
    }
}
