//! Utility functions for the catalog repository.

use crate::errors::SearchIndexError;

/// Characters that may not appear in an index name.
const FORBIDDEN_INDEX_CHARS: &[char] = &[
    '\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':',
];

/// Validate an index name.
///
/// Index names must be non-empty, lowercase, must not start with `-`, `_` or `+`,
/// and must not contain any of `\ / * ? " < > | , # :` or spaces.
///
/// # Example
///
/// ```
/// use catalog_repository::validate_index_name;
///
/// assert!(validate_index_name("good").is_ok());
/// assert!(validate_index_name("Good").is_err());
/// ```
pub fn validate_index_name(name: &str) -> Result<(), SearchIndexError> {
    if name.is_empty() {
        return Err(SearchIndexError::validation("Index name is required"));
    }
    if name == "." || name == ".." {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' is reserved",
            name
        )));
    }
    if name.starts_with(['-', '_', '+']) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' must not start with '-', '_' or '+'",
            name
        )));
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' must be lowercase",
            name
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' contains invalid character '{}'",
            name, c
        )));
    }
    Ok(())
}

/// Validate a document id.
///
/// Document ids must be non-empty and at most 512 bytes.
pub fn validate_document_id(id: &str) -> Result<(), SearchIndexError> {
    if id.is_empty() {
        return Err(SearchIndexError::validation("Document id is required"));
    }
    if id.len() > 512 {
        return Err(SearchIndexError::validation(format!(
            "Document id is {} bytes long, maximum is 512",
            id.len()
        )));
    }
    Ok(())
}
