/// Placeholder identity for submissions without a name.
pub const UNKNOWN_STUDENT: &str = "Unknown";

/// Trims the name and replaces each whitespace character with `_`.
pub fn normalize_student_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return UNKNOWN_STUDENT.to_string();
    }
    trimmed
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Reduces a normalized name to characters safe inside a file name.
pub fn file_safe(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        UNKNOWN_STUDENT.to_string()
    } else {
        safe
    }
}
