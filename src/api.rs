//! Typed bindings for the backend endpoints consumed by the console.
//!
//! Each submodule extends [`Gateway`](crate::gateway::Gateway) with one endpoint family, so
//! every call goes through the same header, envelope, and refresh handling.

pub mod auth;
pub mod vacancies;

pub use auth::*;
pub use vacancies::*;

// self
use crate::error::ValidationError;

/// Rejects empty identifiers and ones that would escape their path segment.
pub(crate) fn path_segment<'a>(
	field: &'static str,
	value: &'a str,
) -> Result<&'a str, ValidationError> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return Err(ValidationError::Required { field });
	}
	if trimmed.chars().any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace()) {
		return Err(ValidationError::InvalidIdentifier { field, value: value.to_owned() });
	}

	Ok(trimmed)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn path_segments_reject_reserved_characters() {
		assert_eq!(path_segment("id", " 42 "), Ok("42"));
		assert_eq!(path_segment("id", ""), Err(ValidationError::Required { field: "id" }));
		assert!(matches!(
			path_segment("id", "../users"),
			Err(ValidationError::InvalidIdentifier { field: "id", .. })
		));
	}
}
