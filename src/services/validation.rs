//! Input validation shared by all services.

use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::AssigneeRole;

const MAX_NAME_LEN: usize = 200;

/// Stateless validator. Built once at startup and handed to each service.
#[derive(Debug, Clone, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Trimmed, non-empty, bounded text field.
    pub fn required_text(&self, field: &str, value: &str) -> Result<String, AppError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(format!("{} is required", field)));
        }
        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                field, MAX_NAME_LEN
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Blank optional text collapses to `None`.
    pub fn optional_text(&self, value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn optional_email(&self, value: Option<&str>) -> Result<Option<String>, AppError> {
        match self.optional_text(value) {
            Some(email) if !is_plausible_email(&email) => Err(AppError::Validation(format!(
                "email {:?} is not a valid address",
                email
            ))),
            other => Ok(other),
        }
    }

    /// A stored metadata document must be a JSON object when present.
    pub fn metadata_document(&self, value: Option<Value>) -> Result<Option<Value>, AppError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(Value::Object(map))),
            Some(_) => Err(AppError::Validation(
                "metadata must be a JSON object".to_string(),
            )),
        }
    }

    /// A merge payload must be a JSON object; its top-level keys are what gets replaced.
    pub fn metadata_patch<'a>(&self, value: &'a Value) -> Result<&'a Map<String, Value>, AppError> {
        value.as_object().ok_or_else(|| {
            AppError::Validation("metadata update must be a JSON object".to_string())
        })
    }

    pub fn role(&self, value: &str) -> Result<AssigneeRole, AppError> {
        AssigneeRole::parse(value.trim()).ok_or_else(|| {
            AppError::Validation(format!(
                "role must be one of primary, secondary, observer (got {:?})",
                value
            ))
        })
    }

    pub fn non_empty_batch(&self, len: usize) -> Result<(), AppError> {
        if len == 0 {
            return Err(AppError::Validation("No members provided".to_string()));
        }
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}
