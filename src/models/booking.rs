use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::database::{Document, ID_FIELD};
use crate::error::ApiError;

/// Validated body of `POST /bookings`.
///
/// `email`, `service` and `status` must be non-empty strings; every other
/// field the client sends is stored as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    doc: Document,
}

impl NewBooking {
    pub const REQUIRED_FIELDS: [&'static str; 3] = ["email", "service", "status"];

    pub fn parse(body: Value) -> Result<Self, ApiError> {
        let Value::Object(mut doc) = body else {
            return Err(ApiError::bad_request("Booking must be a JSON object"));
        };

        let mut field_errors = HashMap::new();
        for field in Self::REQUIRED_FIELDS {
            match doc.get(field) {
                Some(Value::String(s)) if !s.trim().is_empty() => {}
                Some(Value::String(_)) => {
                    field_errors.insert(field.to_string(), "This field must not be empty".to_string());
                }
                Some(_) => {
                    field_errors.insert(field.to_string(), "This field must be a string".to_string());
                }
                None => {
                    field_errors.insert(field.to_string(), "This field is required".to_string());
                }
            }
        }

        if let Some(Value::String(email)) = doc.get("email") {
            if !email.trim().is_empty() && !email.contains('@') {
                field_errors.insert("email".to_string(), "Invalid email address".to_string());
            }
        }

        if !field_errors.is_empty() {
            return Err(ApiError::validation_error("Invalid booking", Some(field_errors)));
        }

        // Ids are assigned by the store
        doc.remove(ID_FIELD);

        Ok(Self { doc })
    }

    pub fn email(&self) -> &str {
        self.doc.get("email").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn into_document(self) -> Document {
        self.doc
    }
}

/// Body of `PATCH /bookings/:id`. Only `status` is ever written.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

impl StatusUpdate {
    pub fn into_set(self) -> Result<Document, ApiError> {
        if self.status.trim().is_empty() {
            let mut field_errors = HashMap::new();
            field_errors.insert("status".to_string(), "This field must not be empty".to_string());
            return Err(ApiError::validation_error("Invalid status update", Some(field_errors)));
        }

        let mut set = Document::new();
        set.insert("status".to_string(), Value::String(self.status));
        Ok(set)
    }
}
