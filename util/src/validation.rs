//! Helpers for turning `validator` failures into response messages.

use validator::ValidationErrors;

/// Flattens field-level validation errors into one `;`-joined message.
///
/// Fields are sorted so the message is deterministic regardless of the
/// underlying map order.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(_, errs)| {
            errs.iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::format_validation_errors;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(email(message = "Invalid email format"))]
        email: String,
        #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
        password: String,
    }

    #[test]
    fn joins_messages_in_field_order() {
        let probe = Probe {
            email: "nope".into(),
            password: "short".into(),
        };
        let errors = probe.validate().unwrap_err();
        let message = format_validation_errors(&errors);
        assert_eq!(
            message,
            "Invalid email format; Password must be at least 8 characters"
        );
    }
}
