use crossterm::event::KeyCode;
use tui::{backend::Backend, Frame};

use crate::error::{check_email, require, ValidationError};
use crate::models::Client;
use crate::ui::components::form::{render_form, FormField, FormOutcome, TextForm};

pub enum ClientWizardAction {
    Cancel,
    Save(Client),
}

const NAME: usize = 0;
const EMAIL: usize = 1;

pub struct ClientWizardState {
    client_id: i32,
    is_active: bool,
    form: TextForm,
}

impl ClientWizardState {
    pub fn new() -> Self {
        Self::build(0, true, "", "", "Client Creation Wizard")
    }

    pub fn from_existing(client: Client) -> Self {
        Self::build(client.id, client.is_active, &client.name, &client.contact_email, "Client Editing Wizard")
    }

    fn build(client_id: i32, is_active: bool, name: &str, email: &str, title: &str) -> Self {
        Self {
            client_id,
            is_active,
            form: TextForm::new(
                title,
                vec![FormField::text("Name", name), FormField::text("Contact Email", email)],
            ),
        }
    }

    pub fn to_client(&self) -> Result<Client, ValidationError> {
        require("Name", self.form.value(NAME))?;
        check_email(self.form.value(EMAIL).trim())?;

        Ok(Client {
            id: self.client_id,
            name: self.form.value(NAME).trim().to_string(),
            contact_email: self.form.value(EMAIL).trim().to_string(),
            is_active: self.is_active,
        })
    }
}

pub fn render_client_wizard<B: Backend>(frame: &mut Frame<B>, state: &mut ClientWizardState) {
    render_form(frame, &state.form);
}

pub fn handle_key(state: &mut ClientWizardState, key: KeyCode) -> Option<ClientWizardAction> {
    match state.form.handle_key(key) {
        FormOutcome::Cancel => Some(ClientWizardAction::Cancel),
        FormOutcome::Save => match state.to_client() {
            Ok(client) => Some(ClientWizardAction::Save(client)),
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

    fn type_into(state: &mut ClientWizardState, text: &str) {
        handle_key(state, KeyCode::Enter);
        for c in text.chars() {
            handle_key(state, KeyCode::Char(c));
        }
        handle_key(state, KeyCode::Enter);
    }

    #[test]
    fn save_is_refused_until_fields_are_valid() {
        let mut state = ClientWizardState::new();
        assert!(handle_key(&mut state, KeyCode::Char('s')).is_none());
        assert_eq!(state.form.error.as_deref(), Some("Name is required"));

        type_into(&mut state, "Acme");
        handle_key(&mut state, KeyCode::Down);
        type_into(&mut state, "ap@acme.com");

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ClientWizardAction::Save(client)) => {
                assert_eq!(client.id, 0);
                assert_eq!(client.name, "Acme");
                assert!(client.is_active);
            }
            _ => panic!("expected save"),
        }
    }

    #[test]
    fn editing_keeps_identity() {
        let existing = Client { id: 9, name: "Globex".into(), contact_email: "x@globex.com".into(), is_active: false };
        let mut state = ClientWizardState::from_existing(existing);
        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ClientWizardAction::Save(client)) => {
                assert_eq!(client.id, 9);
                assert!(!client.is_active);
            }
            _ => panic!("expected save"),
        }
    }
}
