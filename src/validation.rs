//! Request validation.
//!
//! DTOs derive [`validator::Validate`]; failures are flattened into the
//! `errors` list of the response envelope, one entry per failing rule.

use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::{AppError, FieldError};

/// Key validator uses for struct-level (`schema`) errors.
const SCHEMA_KEY: &str = "__all__";

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(field_errors("", &errors))
    }
}

/// Flattens nested and list errors into dotted paths under `prefix`
/// (`details.quantity`, `items[2].quantity`). Struct-level errors are
/// reported under their error code, which names the offending field.
pub fn field_errors(prefix: &str, errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(prefix, errors, &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn collect(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let field: &str = field.as_ref();
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let name = if field == SCHEMA_KEY {
                        error.code.as_ref()
                    } else {
                        field
                    };
                    out.push(FieldError {
                        field: join(prefix, name),
                        message: message_of(error),
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(&join(prefix, field), inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(&format!("{}[{index}]", join(prefix, field)), inner, out);
                }
            }
        }
    }
}

fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn message_of(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => error.code.to_string(),
    }
}

pub fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Rejects values that are empty once surrounding whitespace is removed.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(invalid("required", "is required"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Line {
        #[validate(range(min = 1, max = 10, message = "must be between 1 and 10"))]
        quantity: i32,
    }

    #[derive(Validate)]
    #[validate(schema(function = "distinct_names"))]
    struct Signup {
        #[validate(email(message = "must be a valid email"))]
        email: String,
        #[validate(length(min = 8, max = 128, message = "must be between 8 and 128 characters"))]
        password: String,
        #[validate(custom(function = "not_blank"))]
        name: String,
        #[validate(nested)]
        lines: Vec<Line>,
    }

    fn distinct_names(signup: &Signup) -> Result<(), ValidationError> {
        if signup.name == signup.password {
            return Err(invalid("password", "must differ from the name"));
        }
        Ok(())
    }

    fn signup(email: &str, password: &str, name: &str, quantities: &[i32]) -> Signup {
        Signup {
            email: email.into(),
            password: password.into(),
            name: name.into(),
            lines: quantities.iter().map(|&quantity| Line { quantity }).collect(),
        }
    }

    #[test]
    fn collects_every_failing_field() {
        let errors = signup("nope", "short", "   ", &[1, 0]).validate().unwrap_err();
        let fields = field_errors("", &errors);
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, ["email", "lines[1].quantity", "name", "password"]);
        assert_eq!(fields[2].message, "is required");
    }

    #[test]
    fn schema_errors_name_their_field() {
        let errors = signup("jo@example.com", "same-secret", "same-secret", &[])
            .validate()
            .unwrap_err();
        let fields = field_errors("", &errors);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "password");
        assert_eq!(fields[0].message, "must differ from the name");
    }

    #[test]
    fn prefix_is_prepended() {
        let errors = signup("nope", "long enough", "Jo", &[]).validate().unwrap_err();
        let fields = field_errors("details", &errors);
        assert_eq!(fields[0].field, "details.email");
    }

    #[test]
    fn converts_into_validation_error() {
        let errors = signup("nope", "long enough", "Jo", &[]).validate().unwrap_err();
        match AppError::from(errors) {
            AppError::Validation(fields) => assert_eq!(fields[0].message, "must be a valid email"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(signup("jo@example.com", "long enough", "Jo", &[3]).validate().is_ok());
    }
}
