//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Longest accepted car model, in characters
const MAX_CAR_MODEL_LEN: usize = 64;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.chars().count() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate and normalize a car model, returning the trimmed value
pub fn validate_car_model(model: &str) -> Result<String, String> {
    let model = model.trim();

    if model.is_empty() {
        return Err("Car model is required".to_string());
    }

    if model.chars().count() > MAX_CAR_MODEL_LEN {
        return Err(format!(
            "Car model must be at most {} characters long",
            MAX_CAR_MODEL_LEN
        ));
    }

    if model.chars().any(char::is_control) {
        return Err("Car model cannot contain control characters".to_string());
    }

    Ok(model.to_string())
}
