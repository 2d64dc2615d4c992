use crate::entities::*;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::*;
use std::collections::BTreeMap;

pub mod web;

/// Maximum number of contacts a search returns.
pub const SEARCH_LIMIT: u64 = 20;

const DUPLICATE_EMAIL: &str = "This email is already registered";

/// Validation messages keyed by form field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Contact {
    id: i32,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    company: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl Contact {
    /// Returns the ID of the contact.
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns "first last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<contact::Model> for Contact {
    fn from(model: contact::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            company: model.company,
            message: model.message,
            created_at: model.created_at,
        }
    }
}

/// A contact form submission. Every field is trimmed before use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub message: String,
}

impl ContactSubmission {
    fn trimmed(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            company: self.company.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }

    /// Collects every field-level problem that needs no database lookup.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.first_name.is_empty() {
            errors.insert("first_name", "First name is required".to_string());
        }
        if self.last_name.is_empty() {
            errors.insert("last_name", "Last name is required".to_string());
        }
        if self.email.is_empty() {
            errors.insert("email", "Email is required".to_string());
        } else if !self.email.contains('@') {
            errors.insert("email", "Please enter a valid email".to_string());
        }
        if self.message.is_empty() {
            errors.insert("message", "Message is required".to_string());
        }
        errors
    }
}

/// Error type for ContactService operations.
#[derive(Debug, thiserror::Error)]
pub enum ContactServiceError {
    /// One or more fields were rejected.
    #[error("Contact submission has {} invalid field(s)", .0.len())]
    Validation(FieldErrors),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub struct ContactService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl ContactService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> ContactService<'_> {
        ContactService { db }
    }

    /// Validates and stores a contact form submission.
    ///
    /// # Arguments
    ///
    /// * `submission` - The raw form fields.
    ///
    /// # Returns
    ///
    /// The stored `Contact`, or `Validation` carrying every invalid field at
    /// once. A duplicate email is reported on the `email` field.
    #[tracing::instrument(skip(self))]
    pub async fn submit(&self, submission: &ContactSubmission) -> Result<Contact, ContactServiceError> {
        let submission = submission.trimmed();
        let mut errors = submission.validate();

        if !submission.email.is_empty() && self.email_exists(&submission.email).await? {
            errors.insert("email", DUPLICATE_EMAIL.to_string());
        }

        if !errors.is_empty() {
            return Err(ContactServiceError::Validation(errors));
        }

        self.store(submission).await
    }

    /// Inserts an already validated submission. A concurrent insert of the
    /// same email trips the unique index and is reported on `email` as well.
    async fn store(&self, submission: ContactSubmission) -> Result<Contact, ContactServiceError> {
        let active_model = contact::ActiveModel {
            first_name: ActiveValue::Set(submission.first_name),
            last_name: ActiveValue::Set(submission.last_name),
            email: ActiveValue::Set(submission.email),
            phone: ActiveValue::Set(submission.phone),
            company: ActiveValue::Set(submission.company),
            message: ActiveValue::Set(submission.message),
            created_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        let created_model = active_model
            .insert(self.db)
            .await
            .map_err(insert_error)?;
        tracing::info!("Stored contact {}", created_model.id);
        Ok(Contact::from(created_model))
    }

    /// Searches contacts by name, email or company, case-insensitively.
    ///
    /// # Arguments
    ///
    /// * `query` - The search text; blank returns the newest contacts.
    ///
    /// # Returns
    ///
    /// At most [`SEARCH_LIMIT`] contacts, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Contact>, ContactServiceError> {
        let query = query.trim();
        let mut select = contact::Entity::find();

        if !query.is_empty() {
            let pattern = contains_pattern(&query.to_lowercase());
            let matches = |column: contact::Column| {
                Expr::expr(Func::lower(Expr::col(column)))
                    .like(LikeExpr::new(pattern.as_str()).escape('\\'))
            };
            select = select.filter(
                Condition::any()
                    .add(matches(contact::Column::FirstName))
                    .add(matches(contact::Column::LastName))
                    .add(matches(contact::Column::Email))
                    .add(matches(contact::Column::Company)),
            );
        }

        let contacts = select
            .order_by_desc(contact::Column::CreatedAt)
            .order_by_desc(contact::Column::Id)
            .limit(SEARCH_LIMIT)
            .all(self.db)
            .await?
            .into_iter()
            .map(Contact::from)
            .collect();
        Ok(contacts)
    }

    #[tracing::instrument(skip(self))]
    async fn email_exists(&self, email: &str) -> Result<bool, ContactServiceError> {
        let existing = contact::Entity::find()
            .filter(contact::Column::Email.eq(email))
            .one(self.db)
            .await?;
        Ok(existing.is_some())
    }
}

/// Builds a `LIKE` pattern matching `text` anywhere, with `\`, `%` and `_`
/// taken literally.
fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn insert_error(err: DbErr) -> ContactServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::warn!("Duplicate email rejected by unique index");
            let mut errors = FieldErrors::new();
            errors.insert("email", DUPLICATE_EMAIL.to_string());
            ContactServiceError::Validation(errors)
        }
        _ => ContactServiceError::Database(err),
    }
}
