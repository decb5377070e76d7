use validator::ValidationErrors;

/// Flattens field-level validation failures into one `"; "`-joined message.
///
/// Only errors that carry a custom `message` are reported, so every `#[validate]`
/// attribute on a request DTO should set one.
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
    use super::*;
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
        assert_eq!(
            format_validation_errors(&errors),
            "Invalid email format; Password must be at least 8 characters"
        );
    }

    #[test]
    fn valid_input_has_no_errors() {
        let probe = Probe {
            email: "a@b.com".into(),
            password: "long-enough".into(),
        };
        assert!(probe.validate().is_ok());
    }
}
