//! Token sanitization for bucket-name components.
//!
//! Bucket names may only contain lowercase ASCII letters, digits, `.` and `-`.
//! Every component is pushed through the same rule before it is measured, and
//! the joined name is pushed through it once more before it is returned.

/// Every character a bucket name may contain.
pub const ALLOWED_CHARS: &str = ".-0123456789abcdefghijklmnopqrstuvwxyz";

/// Whether `c` may appear in a bucket name.
pub fn is_allowed_char(c: char) -> bool {
	c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
}

/// Sanitize a token, turning underscores into hyphens.
pub fn sanitize(token: &str) -> String {
	sanitize_with_separator(token, '-')
}

/// Sanitize a token, turning underscores into `separator`.
///
/// - Lowercases the token
/// - Replaces `_` with the separator
/// - Drops anything outside [`ALLOWED_CHARS`]
/// - Collapses runs of `-` and runs of `.` into a single character
///
/// Collapsing happens after filtering, so `a-!-b` becomes `a-b` and the rule
/// is idempotent.
pub fn sanitize_with_separator(token: &str, separator: char) -> String {
	let mut result = String::with_capacity(token.len());

	for c in token.chars().flat_map(char::to_lowercase) {
		let c = if c == '_' { separator } else { c };
		if !is_allowed_char(c) {
			continue;
		}
		// Collapse `--` and `..`
		if (c == '-' || c == '.') && result.ends_with(c) {
			continue;
		}
		result.push(c);
	}

	result
}

/// Keep only the ASCII digits of a token.
pub fn sanitize_number(token: &str) -> String {
	token.chars().filter(|c| c.is_ascii_digit()).collect()
}
