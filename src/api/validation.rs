//! Input validation for API requests.
//!
//! Small per-field validators returning `Result<(), String>`; handlers
//! collect failures with the `ValidationErrorBuilder` from the `error`
//! module and return them as a single 400 response.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Pragmatic email shape check; real validation happens via the unique
    /// index and the user actually receiving mail.
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    /// Digits with optional leading +, separators allowed
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 \-]{5,17}$").unwrap();
}

pub fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name is required".to_string());
    }
    if trimmed.len() > 100 {
        return Err("Name is too long (max 100 characters)".to_string());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 || !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err("Password must contain at least one letter and one digit".to_string());
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.is_empty() {
        // phone is optional at registration
        return Ok(());
    }
    if !PHONE_REGEX.is_match(phone) {
        return Err("Invalid phone number".to_string());
    }
    Ok(())
}

/// Accounts self-register as student or vendor only; admin accounts are
/// seeded from config at startup.
pub fn validate_registration_type(user_type: &str) -> Result<(), String> {
    match user_type {
        "student" | "vendor" => Ok(()),
        "admin" => Err("Admin accounts cannot be registered".to_string()),
        _ => Err("Type must be 'student' or 'vendor'".to_string()),
    }
}

pub fn validate_title(title: &str) -> Result<(), String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("Title is required".to_string());
    }
    if trimmed.len() < 3 {
        return Err("Title is too short (min 3 characters)".to_string());
    }
    if trimmed.len() > 120 {
        return Err("Title is too long (max 120 characters)".to_string());
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), String> {
    if description.len() > 5000 {
        return Err("Description is too long (max 5000 characters)".to_string());
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() {
        return Err("Price must be a number".to_string());
    }
    if price < 0.0 {
        return Err("Price must be non-negative".to_string());
    }
    Ok(())
}

pub fn validate_location(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    if value.len() > 120 {
        return Err(format!("{} is too long (max 120 characters)", field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(validate_email("student@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("spaces in@example.com").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("hunter42x").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("allletters").is_err());
        assert!(validate_password("12345678901").is_err());
    }

    #[test]
    fn phone_is_optional_but_checked() {
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+91 98765 43210").is_ok());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn registration_type_excludes_admin() {
        assert!(validate_registration_type("student").is_ok());
        assert!(validate_registration_type("vendor").is_ok());
        assert!(validate_registration_type("admin").is_err());
        assert!(validate_registration_type("superuser").is_err());
    }

    #[test]
    fn price_bounds() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(8500.0).is_ok());
        assert!(validate_price(-1.0).is_err());
        assert!(validate_price(f64::NAN).is_err());
    }

    #[test]
    fn title_bounds() {
        assert!(validate_title("Sunrise Boys Hostel").is_ok());
        assert!(validate_title("  ").is_err());
        assert!(validate_title("ab").is_err());
        assert!(validate_title(&"x".repeat(121)).is_err());
    }
}
