//! Contact / booking inquiry endpoint

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::notify::ContactInquiry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    /// "contact" or "booking"
    #[serde(rename = "type", default = "default_inquiry_type")]
    pub inquiry_type: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
}

fn default_inquiry_type() -> String {
    "contact".to_string()
}

impl ContactRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(AppError::validation("A valid email is required"));
        }
        Ok(())
    }
}

/// POST /api/contact — rate limited upstream by the router
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> AppResult<Json<Value>> {
    req.validate()?;

    let inquiry = ContactInquiry {
        inquiry_type: req.inquiry_type,
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        phone: req.phone,
        message: req.message,
    };

    state
        .notifier
        .contact_inquiry(&inquiry)
        .await
        .map_err(|e| AppError::Internal(format!("failed to forward inquiry: {e}")))?;

    tracing::info!(inquiry_type = %inquiry.inquiry_type, "Contact inquiry accepted");

    Ok(Json(json!({
        "success": true,
        "message": "Thank you, we will get back to you shortly."
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> ContactRequest {
        ContactRequest {
            inquiry_type: "booking".into(),
            first_name: "Iryna".into(),
            last_name: "S".into(),
            email: "iryna@example.com".into(),
            phone: Some("+380501234567".into()),
            message: Some("Evening appointment please".into()),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn missing_name_rejected() {
        let mut req = base_request();
        req.first_name = "  ".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn bad_email_rejected() {
        let mut req = base_request();
        req.email = "not-an-email".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn inquiry_type_defaults_to_contact() {
        let req: ContactRequest = serde_json::from_value(serde_json::json!({
            "firstName": "Iryna",
            "lastName": "S",
            "email": "iryna@example.com"
        }))
        .unwrap();
        assert_eq!(req.inquiry_type, "contact");
    }
}
