//! Input validation for credentials and registration forms.

use regex::Regex;
use std::sync::LazyLock;

/// Message shown when a password fails [`is_valid_password`]
pub const PASSWORD_REQUIREMENTS: &str =
    "Password must be at least 8 characters and include uppercase, lowercase and a number";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*@([a-z0-9-]+\.)+[a-z]{2,}$"#)
        .expect("email pattern is valid")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("phone pattern is valid"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(&email.trim().to_lowercase())
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Optional leading `+` and 10 to 15 digits; whitespace is ignored
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE.is_match(&compact)
}
