//! MediFlow Input Validation
//!
//! Pure functions that check submitted form fields and accumulate
//! human-readable error messages. Rules are independent per field so a
//! caller can display every problem at once; for a single field the
//! required check runs before the format check, and a missing field
//! reports only "missing".
//!
//! No network or storage side effects.

use serde::{Deserialize, Serialize};

/// Validation error with detailed context
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub code: ValidationErrorCode,
}

/// Specific validation error codes for programmatic handling
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValidationErrorCode {
    Required,
    InvalidFormat,
    OutOfRange,
    InvalidCharacters,
    Mismatch,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({:?})", self.field, self.message, self.code)
    }
}

/// Validation result that can accumulate multiple errors
#[derive(Clone, Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add_error(&mut self, field: &str, message: &str, code: ValidationErrorCode) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
            code,
        });
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The messages alone, in rule order, for the API error envelope.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }
}

/// Sign-up form fields as submitted by the client.
///
/// Every field is optional at this layer; HTML forms submit empty strings
/// for untouched inputs, which count as missing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SignUpFields {
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: Option<String>,
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
}

/// Medicine catalog fields as submitted by the client.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MedicineFields {
    pub name: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Person names: letters, optionally separated by apostrophe, comma,
/// period, space, or hyphen. Must start with a letter; a punctuation
/// separator must be followed by a letter or a space.
pub fn is_valid_name(name: &str) -> bool {
    let chars: Vec<char> = name.chars().collect();
    match chars.first() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_alphabetic() || c == ' ' {
            continue;
        }
        if !matches!(c, '\'' | ',' | '.' | '-') {
            return false;
        }
        match chars.get(i + 1) {
            Some(next) if next.is_ascii_alphabetic() || *next == ' ' => {}
            _ => return false,
        }
    }
    true
}

/// Emails: one `@` with a non-empty local part, a dotted domain, and no
/// whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let Some(domain) = parts.next() else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let mut labels = domain.split('.');
    domain.contains('.') && labels.all(|l| !l.is_empty())
}

/// Validate a sign-up submission.
///
/// Mirrors the password handling of the account form: presence plus
/// confirmation equality, no strength rule.
pub fn validate_sign_up(fields: &SignUpFields) -> ValidationResult {
    let mut result = ValidationResult::new();

    match present(&fields.first_name) {
        None => result.add_error(
            "firstName",
            "Please enter first name",
            ValidationErrorCode::Required,
        ),
        Some(name) if !is_valid_name(name) => result.add_error(
            "firstName",
            "First name is invalid",
            ValidationErrorCode::InvalidCharacters,
        ),
        _ => {}
    }

    match present(&fields.last_name) {
        None => result.add_error(
            "lastName",
            "Please enter last name",
            ValidationErrorCode::Required,
        ),
        Some(name) if !is_valid_name(name) => result.add_error(
            "lastName",
            "Last name is invalid",
            ValidationErrorCode::InvalidCharacters,
        ),
        _ => {}
    }

    match present(&fields.email) {
        None => result.add_error("email", "Please enter email", ValidationErrorCode::Required),
        Some(email) if !is_valid_email(email) => result.add_error(
            "email",
            "Invalid email format",
            ValidationErrorCode::InvalidFormat,
        ),
        _ => {}
    }

    if present(&fields.password).is_none() {
        result.add_error(
            "password",
            "Please enter password",
            ValidationErrorCode::Required,
        );
    }

    if present(&fields.confirm_password).is_none() {
        result.add_error(
            "confirmPassword",
            "Please re-enter password in Confirm Password field",
            ValidationErrorCode::Required,
        );
    }

    match present(&fields.user_type) {
        None => result.add_error(
            "userType",
            "Please enter User Type",
            ValidationErrorCode::Required,
        ),
        Some(kind) if !matches!(kind, "Patient" | "Doctor" | "Admin") => result.add_error(
            "userType",
            "User Type is invalid",
            ValidationErrorCode::InvalidFormat,
        ),
        _ => {}
    }

    // Confirmation is compared by equality, never by format. Two absent
    // fields compare equal and report only the missing-field errors above.
    if fields.password.as_deref().unwrap_or("") != fields.confirm_password.as_deref().unwrap_or("")
    {
        result.add_error(
            "confirmPassword",
            "Password and Confirm Password did not match",
            ValidationErrorCode::Mismatch,
        );
    }

    result
}

/// Validate a login submission: presence only, credentials are checked
/// against the store by the caller.
pub fn validate_login(email: &Option<String>, password: &Option<String>) -> ValidationResult {
    let mut result = ValidationResult::new();
    if present(email).is_none() {
        result.add_error("email", "Please enter email", ValidationErrorCode::Required);
    }
    if present(password).is_none() {
        result.add_error(
            "password",
            "Please enter password",
            ValidationErrorCode::Required,
        );
    }
    result
}

/// Validate a medicine catalog entry.
pub fn validate_medicine(fields: &MedicineFields) -> ValidationResult {
    let mut result = ValidationResult::new();

    if present(&fields.name).is_none() {
        result.add_error(
            "name",
            "Please enter medicine name",
            ValidationErrorCode::Required,
        );
    }
    if present(&fields.company).is_none() {
        result.add_error(
            "company",
            "Please enter company name",
            ValidationErrorCode::Required,
        );
    }
    if present(&fields.description).is_none() {
        result.add_error(
            "description",
            "Please enter medicine description",
            ValidationErrorCode::Required,
        );
    }
    match fields.price {
        None => result.add_error(
            "price",
            "Please enter medicine cost",
            ValidationErrorCode::Required,
        ),
        Some(price) if !price.is_finite() || price <= 0.0 => result.add_error(
            "price",
            "Medicine cost is invalid",
            ValidationErrorCode::OutOfRange,
        ),
        _ => {}
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_sign_up() -> SignUpFields {
        SignUpFields {
            first_name: Some("Alice".into()),
            last_name: Some("Johnson".into()),
            email: Some("alice@example.com".into()),
            password: Some("hunter2hunter2".into()),
            confirm_password: Some("hunter2hunter2".into()),
            user_type: Some("Patient".into()),
        }
    }

    #[test]
    fn complete_sign_up_passes() {
        assert!(validate_sign_up(&complete_sign_up()).is_valid());
    }

    #[test]
    fn missing_field_reports_only_missing() {
        let fields = SignUpFields {
            first_name: None,
            ..complete_sign_up()
        };
        let result = validate_sign_up(&fields);
        assert_eq!(result.messages(), vec!["Please enter first name"]);
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let fields = SignUpFields {
            email: Some("   ".into()),
            ..complete_sign_up()
        };
        let result = validate_sign_up(&fields);
        assert_eq!(result.messages(), vec!["Please enter email"]);
    }

    #[test]
    fn every_missing_field_is_reported() {
        let result = validate_sign_up(&SignUpFields::default());
        assert_eq!(
            result.messages(),
            vec![
                "Please enter first name",
                "Please enter last name",
                "Please enter email",
                "Please enter password",
                "Please re-enter password in Confirm Password field",
                "Please enter User Type",
            ]
        );
    }

    #[test]
    fn mismatched_confirmation_is_reported() {
        let fields = SignUpFields {
            confirm_password: Some("something-else".into()),
            ..complete_sign_up()
        };
        let result = validate_sign_up(&fields);
        assert_eq!(
            result.messages(),
            vec!["Password and Confirm Password did not match"]
        );
    }

    #[test]
    fn unknown_user_type_is_invalid() {
        let fields = SignUpFields {
            user_type: Some("Nurse".into()),
            ..complete_sign_up()
        };
        let result = validate_sign_up(&fields);
        assert_eq!(result.messages(), vec!["User Type is invalid"]);
        assert_eq!(result.errors[0].code, ValidationErrorCode::InvalidFormat);
    }

    #[test]
    fn names_accept_common_punctuation() {
        for name in ["O'Brien", "Mary-Jane", "van der Berg", "St. Clair"] {
            assert!(is_valid_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn names_reject_digits_and_leading_separators() {
        for name in ["4lice", "-Smith", "Jean--Luc", "Anne-", ""] {
            assert!(!is_valid_name(name), "{name:?} should be invalid");
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@b..co"));
        assert!(!is_valid_email("a@@b.co"));
    }

    #[test]
    fn medicine_error_order_matches_form() {
        let fields = MedicineFields {
            name: Some("Aspirin".into()),
            ..MedicineFields::default()
        };
        let result = validate_medicine(&fields);
        assert_eq!(
            result.messages(),
            vec![
                "Please enter company name",
                "Please enter medicine description",
                "Please enter medicine cost",
            ]
        );
    }

    #[test]
    fn medicine_cost_must_be_positive() {
        let fields = MedicineFields {
            name: Some("Aspirin".into()),
            company: Some("Bayer".into()),
            description: Some("Pain reliever".into()),
            price: Some(0.0),
        };
        let result = validate_medicine(&fields);
        assert_eq!(result.messages(), vec!["Medicine cost is invalid"]);
    }

    #[test]
    fn merge_accumulates_both_sides() {
        let mut left = validate_login(&None, &Some("pw".into()));
        let right = validate_login(&Some("a@b.co".into()), &None);
        left.merge(right);
        assert_eq!(left.errors.len(), 2);
    }
}

#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn alphabetic_names_always_pass(name in "[A-Za-z]{1,40}") {
            prop_assert!(is_valid_name(&name));
        }

        #[test]
        fn names_with_digits_always_fail(
            prefix in "[A-Za-z]{0,10}",
            digit in "[0-9]",
            suffix in "[A-Za-z]{0,10}",
        ) {
            let name = format!("{prefix}{digit}{suffix}");
            prop_assert!(!is_valid_name(&name));
        }

        #[test]
        fn simple_addresses_always_parse(
            local in "[a-z0-9]{1,16}",
            host in "[a-z0-9]{1,12}",
            tld in "[a-z]{2,6}",
        ) {
            let email = format!("{local}@{host}.{tld}");
            prop_assert!(is_valid_email(&email));
        }

        #[test]
        fn sign_up_never_panics(
            first in proptest::option::of(".{0,20}"),
            last in proptest::option::of(".{0,20}"),
            email in proptest::option::of(".{0,30}"),
        ) {
            let fields = SignUpFields {
                first_name: first,
                last_name: last,
                email,
                password: Some("pw".into()),
                confirm_password: Some("pw".into()),
                user_type: Some("Doctor".into()),
            };
            let _ = validate_sign_up(&fields);
        }
    }
}
