use crate::domain::submission::ContactForm;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Incoming form body. Fields are kept as raw JSON so that a missing field, `null`, or a
/// non-string value all surface as "required" rather than as a parse failure.
#[derive(Debug, Default)]
pub struct ContactRequest {
    pub name: Value,
    pub email: Value,
    pub message: Value,
}

/// Only a JSON object carries fields; arrays and scalars read as an empty form.
impl From<Value> for ContactRequest {
    fn from(body: Value) -> Self {
        let Value::Object(mut fields) = body else {
            return Self::default();
        };

        Self {
            name: fields.remove("name").unwrap_or_default(),
            email: fields.remove("email").unwrap_or_default(),
            message: fields.remove("message").unwrap_or_default(),
        }
    }
}

impl From<ContactRequest> for ContactForm {
    fn from(request: ContactRequest) -> Self {
        Self {
            name: request.name.as_str().map(str::to_string),
            email: request.email.as_str().map(str::to_string),
            message: request.message.as_str().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

impl ContactResponse {
    #[must_use]
    pub fn submitted() -> Self {
        Self { success: true, message: "Contact form submitted successfully".to_string() }
    }

    #[must_use]
    pub const fn failure(message: String) -> Self {
        Self { success: false, message }
    }
}
