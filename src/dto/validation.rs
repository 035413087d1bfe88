//! Validation helpers for DTOs.

use validator::{ValidateUrl, ValidationError};

const MAX_GAME_ID_LEN: usize = 64;

/// Validates a caller-assigned game identifier: 1 to 64 ASCII letters, digits, `-` or `_`.
///
/// # Examples
///
/// ```ignore
/// validate_game_id("game-1700000000000") // Ok
/// validate_game_id("g 1")                // Err - space
/// validate_game_id("")                   // Err - empty
/// ```
pub fn validate_game_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_GAME_ID_LEN {
        let mut err = ValidationError::new("game_id_length");
        err.message = Some(
            format!(
                "Game ID must be between 1 and {MAX_GAME_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("game_id_format");
        err.message = Some("Game ID may only contain ASCII letters, digits, '-' and '_'".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that `url` is an absolute http(s) URL.
pub fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    if url.validate_url() && (url.starts_with("http://") || url.starts_with("https://")) {
        return Ok(());
    }
    let mut err = ValidationError::new("url");
    err.message = Some(format!("`{url}` is not an absolute http(s) URL").into());
    Err(err)
}

/// Validates that `value` holds at most `max` characters.
pub fn validate_max_chars(value: &str, max: usize) -> Result<(), ValidationError> {
    let count = value.chars().count();
    if count <= max {
        return Ok(());
    }
    let mut err = ValidationError::new("length");
    err.message = Some(format!("must be at most {max} characters (got {count})").into());
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_game_id_valid() {
        assert!(validate_game_id("g1").is_ok());
        assert!(validate_game_id("game-1700000000000").is_ok());
        assert!(validate_game_id("Retro_Pack").is_ok());
    }

    #[test]
    fn test_validate_game_id_invalid_length() {
        assert!(validate_game_id("").is_err());
        assert!(validate_game_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_game_id_invalid_format() {
        assert!(validate_game_id("g 1").is_err());
        assert!(validate_game_id("g/1").is_err());
        assert!(validate_game_id("jeu-é").is_err());
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("https://youtube.com/watch?v=abc").is_ok());
        assert!(validate_http_url("ftp://example.com/file").is_err());
        assert!(validate_http_url("not a url").is_err());
    }

    #[test]
    fn test_validate_max_chars_counts_characters() {
        assert!(validate_max_chars("ééé", 3).is_ok());
        assert!(validate_max_chars("abcd", 3).is_err());
    }
}
