use ammonia;

use crate::error::AppError;

/// Clean HTML content using the ammonia library.
///
/// This employs a whitelist-based sanitization strategy: it preserves safe tags
/// (like <b>, <p>) while stripping dangerous tags (like <script>, <iframe>)
/// and malicious attributes (like onclick).
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitizes comment content before storage.
/// Content that is empty once cleaned and trimmed is rejected.
pub fn clean_comment_content(input: &str) -> Result<String, AppError> {
    let cleaned = clean_html(input.trim());
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(AppError::BadRequest(
            "Comment content is empty after sanitization".to_string(),
        ));
    }
    Ok(cleaned.to_string())
}
