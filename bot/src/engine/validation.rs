/// Minimum accepted player UID length.
pub const MIN_UID_LENGTH: usize = 6;

/// Validate a player UID. Must be at least 6 characters, ASCII digits only.
pub fn validate_uid(uid: &str) -> Result<(), String> {
    if uid.is_empty() {
        return Err("UID cannot be empty".into());
    }
    if !uid.chars().all(|c| c.is_ascii_digit()) {
        return Err("UID must be numeric".into());
    }
    if uid.len() < MIN_UID_LENGTH {
        return Err(format!(
            "UID too short (min {} digits)",
            MIN_UID_LENGTH
        ));
    }
    Ok(())
}
