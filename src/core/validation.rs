//! Validation errors and value checks for CLI and config input

use std::fmt;

/// User-facing validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

impl crate::core::error_handling::ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// Validate positive integer value
pub fn validate_positive_int(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("Value must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a valid positive integer", value)),
    }
}

/// Validate that a queue URL is an absolute http(s) URL with a queue path
pub fn validate_queue_url(flag: &str, value: &str) -> Result<reqwest::Url, ValidationError> {
    let url = reqwest::Url::parse(value.trim()).map_err(|e| {
        ValidationError::new(&format!("{} '{}' is not a valid URL: {}", flag, value, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ValidationError::new(&format!(
            "{} '{}' must use http or https",
            flag, value
        )));
    }
    if url.path().trim_matches('/').is_empty() {
        return Err(ValidationError::new(&format!(
            "{} '{}' does not name a queue",
            flag, value
        )));
    }
    Ok(url)
}

/// Validate a JSON pointer as used to locate the unique id in a body
///
/// The empty pointer names the whole document, which can never be a string
/// id, so it is rejected along with anything not starting with `/`.
pub fn validate_json_pointer(value: &str) -> Result<String, String> {
    if value.is_empty() {
        Err("the unique id pointer must not be empty".to_string())
    } else if value.starts_with('/') {
        Ok(value.to_string())
    } else {
        Err(format!("'{}' is not a JSON pointer (must start with '/')", value))
    }
}
