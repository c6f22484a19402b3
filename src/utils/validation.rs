use crate::error::{AppError, AppResult};
use chrono::NaiveDate;
use regex::Regex;

/// Usernames: 3-150 characters of letters, digits and `_ . @ + -`.
pub fn validate_username(username: &str) -> AppResult<()> {
    let username_regex = Regex::new(r"^[A-Za-z0-9_.@+\-]{3,150}$")
        .map_err(|e| AppError::InternalError(format!("Invalid username pattern: {e}")))?;

    if !username_regex.is_match(username) {
        return Err(AppError::ValidationError(
            "Username must be 3-150 characters of letters, digits and _.@+-".to_string(),
        ));
    }

    Ok(())
}

/// Rejects values longer than `max` characters.
pub fn validate_max_len(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::ValidationError(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub fn validate_not_blank(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(())
}

pub fn validate_date_order(birth_date: Option<NaiveDate>, death_date: NaiveDate) -> AppResult<()> {
    if let Some(birth) = birth_date
        && birth > death_date
    {
        return Err(AppError::ValidationError(
            "Birth date cannot be after death date".to_string(),
        ));
    }
    Ok(())
}

/// Turns `"quran, khatma #dua"` into `"#quran #khatma #dua"`.
pub fn format_hashtags(raw: &str) -> String {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(|t| t.trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ahmad").is_ok());
        assert!(validate_username("a.b+c@d-e_f").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(151)).is_err());
        assert!(validate_username(&"x".repeat(150)).is_ok());
    }

    #[test]
    fn test_validate_max_len_counts_chars() {
        assert!(validate_max_len("bio", "مرحبا", 5).is_ok());
        assert!(validate_max_len("bio", "مرحبا!", 5).is_err());
    }

    #[test]
    fn test_validate_date_order() {
        let death = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        assert!(validate_date_order(None, death).is_ok());
        assert!(validate_date_order(NaiveDate::from_ymd_opt(1950, 1, 1), death).is_ok());
        assert!(validate_date_order(Some(death), death).is_ok());
        assert!(validate_date_order(NaiveDate::from_ymd_opt(2021, 1, 1), death).is_err());
    }

    #[test]
    fn test_format_hashtags() {
        assert_eq!(format_hashtags("quran, khatma #dua"), "#quran #khatma #dua");
        assert_eq!(format_hashtags("  "), "");
    }
}
