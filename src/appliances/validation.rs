use crate::auth::services::is_valid_email;
use crate::error::{AppResult, FieldErrors};

/// Borrowed view of the caller-editable fields shared by create and update.
#[derive(Debug, Default)]
pub struct Submission<'a> {
    pub appliance_type: Option<&'a str>,
    pub has_condition: bool,
    pub has_status: bool,
    pub brand: Option<&'a str>,
    pub model_number: Option<&'a str>,
    pub description: Option<&'a str>,
    pub collection_address: Option<&'a str>,
    pub recycling_comment: Option<&'a str>,
    pub customer_name: Option<&'a str>,
    pub customer_phone: Option<&'a str>,
    pub customer_email: Option<&'a str>,
}

fn max_len(errors: &mut FieldErrors, field: &'static str, value: Option<&str>, max: usize) {
    if let Some(v) = value {
        if v.chars().count() > max {
            errors.add(
                field,
                format!("must be a string with a maximum length of {}", max),
            );
        }
    }
}

pub fn validate(s: &Submission<'_>) -> AppResult<()> {
    let mut errors = FieldErrors::new();

    match s.appliance_type.map(str::trim) {
        None | Some("") => errors.add("appliance_type", "is required"),
        Some(_) => max_len(&mut errors, "appliance_type", s.appliance_type, 100),
    }
    if !s.has_condition {
        errors.add("condition", "is required");
    }
    if !s.has_status {
        errors.add("status", "is required");
    }

    max_len(&mut errors, "brand", s.brand, 50);
    max_len(&mut errors, "model_number", s.model_number, 50);
    max_len(&mut errors, "description", s.description, 500);
    max_len(&mut errors, "collection_address", s.collection_address, 200);
    max_len(&mut errors, "recycling_comment", s.recycling_comment, 500);
    max_len(&mut errors, "customer_name", s.customer_name, 100);
    max_len(&mut errors, "customer_phone", s.customer_phone, 20);
    max_len(&mut errors, "customer_email", s.customer_email, 100);

    if let Some(email) = s.customer_email.filter(|e| !e.is_empty()) {
        if !is_valid_email(email) {
            errors.add("customer_email", "is not a valid e-mail address");
        }
    }

    errors.into_result()
}
