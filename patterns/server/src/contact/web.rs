use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    response::Response,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::contact::{Contact, ContactService, ContactServiceError, ContactSubmission};
use crate::render::{DualRender, FormInput, ResponseMode};
use crate::web::{AppState, ErrorResponse, ValidationErrorResponse, WebError};

impl From<ContactServiceError> for WebError {
    fn from(err: ContactServiceError) -> Self {
        match err {
            ContactServiceError::Validation(errors) => WebError::Validation(errors),
            ContactServiceError::Database(err) => WebError::Database(err),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ContactForm {
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    company: String,
    message: String,
}

impl From<ContactForm> for ContactSubmission {
    fn from(form: ContactForm) -> Self {
        Self {
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            phone: form.phone,
            company: form.company,
            message: form.message,
        }
    }
}

/// API response for a stored contact.
#[derive(Debug, Serialize, ToSchema)]
pub struct ContactSubmittedResponse {
    success: bool,
    /// Thank-you message addressed to the contact
    message: String,
    contact_id: i32,
}

/// JSON representation of a contact search hit.
#[derive(Debug, Serialize, ToSchema)]
pub struct ContactJson {
    id: i32,
    first_name: String,
    last_name: String,
    email: String,
    company: String,
}

impl From<&Contact> for ContactJson {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id(),
            first_name: contact.first_name().to_string(),
            last_name: contact.last_name().to_string(),
            email: contact.email().to_string(),
            company: contact.company().to_string(),
        }
    }
}

/// API response for a contact search.
#[derive(Debug, Serialize, ToSchema)]
pub struct ContactSearchResponse {
    results: Vec<ContactJson>,
    count: usize,
}

#[derive(Template)]
#[template(path = "partials/form_success.html")]
struct FormSuccessTemplate<'a> {
    contact: &'a Contact,
}

#[derive(Template)]
#[template(path = "partials/contact_results.html")]
struct ContactResultsTemplate<'a> {
    query: &'a str,
    contacts: &'a [Contact],
}

/// A freshly stored contact.
#[derive(Debug)]
pub struct ContactSubmitted(pub Contact);

impl DualRender for ContactSubmitted {
    fn payload(&self) -> impl Serialize + '_ {
        ContactSubmittedResponse {
            success: true,
            message: format!(
                "Thank you, {}! We'll be in touch soon.",
                self.0.first_name()
            ),
            contact_id: self.0.id(),
        }
    }

    fn fragment(&self) -> askama::Result<String> {
        FormSuccessTemplate { contact: &self.0 }.render()
    }
}

/// Contacts matching a live search.
#[derive(Debug)]
pub struct ContactResults {
    query: String,
    contacts: Vec<Contact>,
}

impl DualRender for ContactResults {
    fn payload(&self) -> impl Serialize + '_ {
        ContactSearchResponse {
            results: self.contacts.iter().map(ContactJson::from).collect(),
            count: self.contacts.len(),
        }
    }

    fn fragment(&self) -> askama::Result<String> {
        ContactResultsTemplate {
            query: &self.query,
            contacts: &self.contacts,
        }
        .render()
    }
}

/// Query parameters for the live search.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Text matched against name, email and company
    #[serde(default)]
    q: String,
}

/// Handler for POST /contacts.
#[tracing::instrument(skip(state, form))]
#[utoipa::path(
    post,
    path = "/api/contacts",
    request_body(content = ContactForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Contact stored", body = ContactSubmittedResponse),
        (status = 400, description = "Field errors", body = ValidationErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Contacts"
)]
pub async fn submit_contact_handler(
    mode: ResponseMode,
    State(state): State<Arc<AppState>>,
    FormInput(form): FormInput<ContactForm>,
) -> Response {
    let service = ContactService::new(&state.db);
    let result = service.submit(&ContactSubmission::from(form)).await;
    if let Ok(contact) = &result {
        state
            .notifier
            .notify(&format!("New contact: {}", contact.full_name()));
    }
    mode.respond(result.map(ContactSubmitted))
}

/// Handler for GET /contacts/search.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/contacts/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Up to 20 matching contacts, newest first", body = ContactSearchResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Contacts"
)]
pub async fn search_contacts_handler(
    mode: ResponseMode,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let service = ContactService::new(&state.db);
    let result = service
        .search(&query.q)
        .await
        .map(|contacts| ContactResults {
            query: query.q.trim().to_string(),
            contacts,
        });
    mode.respond(result)
}

/// Creates and returns the contact router.
pub fn create_contact_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/contacts", post(submit_contact_handler))
        .route("/contacts/search", get(search_contacts_handler))
        .with_state(state)
}
