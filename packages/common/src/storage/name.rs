use super::error::StorageError;

const MAX_NAME_LEN: usize = 255;

/// Extension of an uploaded filename including the leading dot, or an empty
/// string when there is none. The extension is returned unchanged.
pub fn extension_of(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    match base.rfind('.') {
        Some(0) | None => String::new(),
        Some(idx) => base[idx..].to_string(),
    }
}

/// Collision-free stored name: a random UUID followed by the original extension.
pub fn generate_name(original: &str) -> String {
    format!("{}{}", uuid::Uuid::new_v4(), extension_of(original))
}

/// Reject anything that is not a single flat path component.
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidName("name must not be empty".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(StorageError::InvalidName(format!(
            "name exceeds {MAX_NAME_LEN} bytes"
        )));
    }
    if name.contains(['/', '\\']) {
        return Err(StorageError::InvalidName(
            "name must not contain path separators".into(),
        ));
    }
    if name.contains('\0') || name.chars().any(|c| c.is_control()) {
        return Err(StorageError::InvalidName(
            "name must not contain control characters".into(),
        ));
    }
    if name.starts_with('.') {
        return Err(StorageError::InvalidName(
            "name must not start with '.'".into(),
        ));
    }
    Ok(())
}
