//! Bucket name synthesis.
//!
//! Packs a required name part and up to four optional parts into a single
//! S3-compatible bucket name of at most [`MAX_BUCKET_NAME_LEN`] characters:
//!
//! ```text
//! prefix-name_part1-name_part2-suffix_part1-suffix_part2
//! ```
//!
//! Region components are compressed to their short code and 12-digit account
//! ids are never shortened. When the name is too long, the other components
//! are trimmed one trailing character at a time, slot by slot, down to their
//! configured max lengths.

use crate::region::{is_valid_region, region_short_code};
use crate::sanitize::sanitize_with_separator;

/// S3 bucket names are limited to 63 characters.
pub const MAX_BUCKET_NAME_LEN: usize = 63;

/// Default separator between components.
pub const DEFAULT_SEPARATOR: char = '-';

/// Room reserved for separators when sizing the default budgets.
const DEFAULT_SEPARATOR_BUDGET: usize = 4;

const ACCOUNT_ID_LEN: usize = 12;

/// Errors raised before any name is computed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
	#[error("name_part1 cannot be empty")]
	EmptyNamePart1,

	#[error(
		"Max length of bucket name must be <= {max} characters, please consider adjusting \
		 the following parameter(s): prefix_max_len : {}, name_part1_max_len : {}, \
		 name_part2_max_len : {}, suffix_part1_max_len : {}, suffix_part2_max_len : {}",
		.budgets.prefix,
		.budgets.name_part1,
		.budgets.name_part2,
		.budgets.suffix_part1,
		.budgets.suffix_part2
	)]
	BudgetExceeded { max: usize, budgets: Budgets },
}

/// A component position in the bucket name, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
	Prefix,
	NamePart1,
	NamePart2,
	SuffixPart1,
	SuffixPart2,
}

impl Slot {
	/// All slots in the order they are joined, scanned and trimmed.
	pub const ALL: [Slot; 5] = [
		Slot::Prefix,
		Slot::NamePart1,
		Slot::NamePart2,
		Slot::SuffixPart1,
		Slot::SuffixPart2,
	];

	fn index(self) -> usize {
		self as usize
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Slot::Prefix => "prefix",
			Slot::NamePart1 => "name_part1",
			Slot::NamePart2 => "name_part2",
			Slot::SuffixPart1 => "suffix_part1",
			Slot::SuffixPart2 => "suffix_part2",
		}
	}
}

/// Per-slot max lengths.
///
/// A slot is only trimmed down to its own max length, and a max length of
/// zero means the slot is never trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budgets {
	pub prefix: usize,
	pub name_part1: usize,
	pub name_part2: usize,
	pub suffix_part1: usize,
	pub suffix_part2: usize,
}

impl Default for Budgets {
	fn default() -> Self {
		Self {
			prefix: 5,
			name_part1: 28,
			name_part2: 9,
			suffix_part1: 12,
			suffix_part2: 5,
		}
	}
}

impl Budgets {
	pub fn get(&self, slot: Slot) -> usize {
		match slot {
			Slot::Prefix => self.prefix,
			Slot::NamePart1 => self.name_part1,
			Slot::NamePart2 => self.name_part2,
			Slot::SuffixPart1 => self.suffix_part1,
			Slot::SuffixPart2 => self.suffix_part2,
		}
	}

	pub fn set(&mut self, slot: Slot, max_len: usize) {
		match slot {
			Slot::Prefix => self.prefix = max_len,
			Slot::NamePart1 => self.name_part1 = max_len,
			Slot::NamePart2 => self.name_part2 = max_len,
			Slot::SuffixPart1 => self.suffix_part1 = max_len,
			Slot::SuffixPart2 => self.suffix_part2 = max_len,
		}
	}

	/// Sum of all slot budgets plus the reserved separator budget.
	pub fn total(&self) -> usize {
		Slot::ALL
			.iter()
			.fold(DEFAULT_SEPARATOR_BUDGET, |acc, &slot| acc.saturating_add(self.get(slot)))
	}
}

/// Builder for a bucket name.
///
/// ```
/// use mlops_naming::naming::BucketNameBuilder;
///
/// let name = BucketNameBuilder::new("sc-product")
/// 	.prefix("mlops")
/// 	.name_part2("assets")
/// 	.suffix_part1("123456789012")
/// 	.suffix_part2("us-east-1")
/// 	.build()
/// 	.unwrap();
/// assert_eq!(name, "mlops-sc-product-assets-123456789012-use1");
/// ```
#[derive(Debug, Clone)]
pub struct BucketNameBuilder {
	parts: [Option<String>; 5],
	budgets: Budgets,
	separator: char,
	convert_region_to_short_code: bool,
}

impl Default for BucketNameBuilder {
	fn default() -> Self {
		Self {
			parts: Default::default(),
			budgets: Budgets::default(),
			separator: DEFAULT_SEPARATOR,
			convert_region_to_short_code: true,
		}
	}
}

impl BucketNameBuilder {
	/// Create a builder with the required first name part and default budgets.
	pub fn new(name_part1: impl Into<String>) -> Self {
		Self::default().name_part1(name_part1)
	}

	/// Set or clear the value of a slot.
	pub fn part(mut self, slot: Slot, value: Option<String>) -> Self {
		self.parts[slot.index()] = value;
		self
	}

	pub fn prefix(self, value: impl Into<String>) -> Self {
		self.part(Slot::Prefix, Some(value.into()))
	}

	pub fn name_part1(self, value: impl Into<String>) -> Self {
		self.part(Slot::NamePart1, Some(value.into()))
	}

	pub fn name_part2(self, value: impl Into<String>) -> Self {
		self.part(Slot::NamePart2, Some(value.into()))
	}

	pub fn suffix_part1(self, value: impl Into<String>) -> Self {
		self.part(Slot::SuffixPart1, Some(value.into()))
	}

	pub fn suffix_part2(self, value: impl Into<String>) -> Self {
		self.part(Slot::SuffixPart2, Some(value.into()))
	}

	pub fn budgets(mut self, budgets: Budgets) -> Self {
		self.budgets = budgets;
		self
	}

	pub fn max_len(mut self, slot: Slot, max_len: usize) -> Self {
		self.budgets.set(slot, max_len);
		self
	}

	pub fn separator(mut self, separator: char) -> Self {
		self.separator = separator;
		self
	}

	pub fn convert_region_to_short_code(mut self, convert: bool) -> Self {
		self.convert_region_to_short_code = convert;
		self
	}

	/// Synthesize the bucket name.
	///
	/// The result is non-empty, at most [`MAX_BUCKET_NAME_LEN`] characters and
	/// only contains `[a-z0-9.-]`. Inputs that cannot be trimmed enough are
	/// cut by a final hard clamp, which may land inside an account id or a
	/// region code, or right after a separator. Each unset slot counts as -1
	/// when measuring, so names with missing parts lean on that clamp.
	pub fn build(&self) -> Result<String, ValidationError> {
		let name_part1_present = self.parts[Slot::NamePart1.index()]
			.as_deref()
			.map(|v| !v.trim().is_empty())
			.unwrap_or(false);
		if !name_part1_present {
			return Err(ValidationError::EmptyNamePart1);
		}

		if self.budgets.total() > MAX_BUCKET_NAME_LEN {
			return Err(ValidationError::BudgetExceeded {
				max: MAX_BUCKET_NAME_LEN,
				budgets: self.budgets,
			});
		}

		let separator = sanitize_separator(self.separator);

		// Slots given a non-blank value fix the number of separators
		let raw: Vec<Option<&str>> = self
			.parts
			.iter()
			.map(|p| p.as_deref().filter(|v| !v.trim().is_empty()))
			.collect();
		let present = raw.iter().filter(|p| p.is_some()).count();
		let separator_len = present.saturating_sub(1);

		log::info!(
			"prefix : {:?}, name_part1 : {:?}, name_part2 : {:?}, suffix_part1 : {:?}, \
			 suffix_part2 : {:?}, budgets : {:?}, separator : {:?}",
			raw[0],
			raw[1],
			raw[2],
			raw[3],
			raw[4],
			self.budgets,
			separator
		);

		let mut values: Vec<Option<String>> = raw
			.iter()
			.map(|p| p.map(|v| sanitize_with_separator(v, separator)))
			.collect();

		if values[Slot::NamePart1.index()]
			.as_deref()
			.map_or(true, str::is_empty)
		{
			return Err(ValidationError::EmptyNamePart1);
		}

		let region_slot = Slot::ALL.into_iter().find(|slot| {
			raw[slot.index()]
				.map(|v| is_valid_region(&v.to_lowercase()))
				.unwrap_or(false)
		});

		if self.convert_region_to_short_code {
			if let Some(slot) = region_slot {
				if let Some(code) = raw[slot.index()].and_then(region_short_code) {
					values[slot.index()] = Some(code);
				}
			}
		}

		let account_slot = Slot::ALL.into_iter().find(|slot| {
			values[slot.index()]
				.as_deref()
				.map(is_account_id)
				.unwrap_or(false)
		});

		// Each unset slot counts as -1
		let unset = values.iter().filter(|v| v.is_none()).count();
		let actual_len = values.iter().flatten().map(String::len).sum::<usize>() as i64
			+ separator_len as i64
			- unset as i64;
		let mut slack = MAX_BUCKET_NAME_LEN as i64 - actual_len;

		log::info!(
			"allowed len : {}, actual len : {}, slack : {}, region slot : {:?}, account slot : {:?}",
			MAX_BUCKET_NAME_LEN,
			actual_len,
			slack,
			region_slot.map(Slot::as_str),
			account_slot.map(Slot::as_str)
		);

		let mut pass = 0;
		'trim: while slack < 0 {
			pass += 1;
			let before = slack;

			for slot in Slot::ALL {
				if Some(slot) == region_slot || Some(slot) == account_slot {
					continue;
				}
				let max_len = self.budgets.get(slot);
				let Some(value) = values[slot.index()].as_mut() else {
					continue;
				};
				if max_len > 0 && value.len() > max_len {
					value.pop();
					slack += 1;
					if slack >= 0 {
						break 'trim;
					}
				}
			}

			log::debug!("trim pass {}: slack {} -> {}", pass, before, slack);

			if slack == before {
				log::warn!(
					"bucket name is still {} character(s) over budget after trimming",
					-slack
				);
				break;
			}
		}

		let joined = values
			.iter()
			.flatten()
			.filter(|v| !v.is_empty())
			.map(String::as_str)
			.collect::<Vec<_>>()
			.join(&separator.to_string());
		let clamped: String = joined.chars().take(MAX_BUCKET_NAME_LEN).collect();

		Ok(sanitize_with_separator(&clamped, separator))
	}
}

/// Sanitize the separator, falling back to `-` when nothing survives.
fn sanitize_separator(separator: char) -> char {
	sanitize_with_separator(&separator.to_string(), DEFAULT_SEPARATOR)
		.chars()
		.next()
		.unwrap_or(DEFAULT_SEPARATOR)
}

fn is_account_id(value: &str) -> bool {
	value.len() == ACCOUNT_ID_LEN && value.bytes().all(|b| b.is_ascii_digit())
}

/// Synthesize a bucket name from `name_part1` alone, with default budgets.
pub fn create_bucket_name(name_part1: &str) -> Result<String, ValidationError> {
	BucketNameBuilder::new(name_part1).build()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_budgets_fill_the_ceiling() {
		assert_eq!(Budgets::default().total(), MAX_BUCKET_NAME_LEN);
	}

	#[test]
	fn test_single_part_is_sanitized() {
		assert_eq!(create_bucket_name("My_Project").unwrap(), "my-project");
	}

	#[test]
	fn test_empty_name_part1_rejected() {
		assert_eq!(create_bucket_name(""), Err(ValidationError::EmptyNamePart1));
		assert_eq!(create_bucket_name("   "), Err(ValidationError::EmptyNamePart1));
		assert_eq!(
			BucketNameBuilder::default().prefix("mlops").build(),
			Err(ValidationError::EmptyNamePart1)
		);
	}

	#[test]
	fn test_name_part1_sanitized_away_rejected() {
		assert_eq!(create_bucket_name("!!!"), Err(ValidationError::EmptyNamePart1));
	}

	#[test]
	fn test_budget_exceeded_rejected() {
		let err = BucketNameBuilder::new("proj")
			.max_len(Slot::Prefix, 6)
			.build()
			.unwrap_err();
		assert!(matches!(err, ValidationError::BudgetExceeded { max: 63, .. }));
		assert!(err.to_string().contains("prefix_max_len : 6"));
	}

	#[test]
	fn test_budget_check_runs_after_name_check() {
		let err = BucketNameBuilder::new("")
			.max_len(Slot::Prefix, 60)
			.build()
			.unwrap_err();
		assert_eq!(err, ValidationError::EmptyNamePart1);
	}

	#[test]
	fn test_blank_optional_parts_are_ignored() {
		let name = BucketNameBuilder::new("proj")
			.prefix("  ")
			.name_part2("")
			.build()
			.unwrap();
		assert_eq!(name, "proj");
	}

	#[test]
	fn test_optional_part_sanitized_to_nothing_is_skipped() {
		let name = BucketNameBuilder::new("proj")
			.name_part2("!!!")
			.suffix_part1("data")
			.build()
			.unwrap();
		assert_eq!(name, "proj-data");
	}

	#[test]
	fn test_separator_is_sanitized() {
		let dotted = BucketNameBuilder::new("a")
			.prefix("b")
			.separator('.')
			.build()
			.unwrap();
		assert_eq!(dotted, "b.a");

		// Underscore sanitizes to hyphen, anything else invalid falls back to hyphen
		let underscored = BucketNameBuilder::new("a").prefix("b").separator('_').build().unwrap();
		assert_eq!(underscored, "b-a");
		let slashed = BucketNameBuilder::new("a").prefix("b").separator('/').build().unwrap();
		assert_eq!(slashed, "b-a");
	}

	#[test]
	fn test_underscores_follow_the_separator() {
		let name = BucketNameBuilder::new("model_store")
			.prefix("ml")
			.separator('.')
			.build()
			.unwrap();
		assert_eq!(name, "ml.model.store");
	}

	#[test]
	fn test_region_detected_in_any_slot() {
		let name = BucketNameBuilder::new("eu-west-1")
			.prefix("mlops")
			.build()
			.unwrap();
		assert_eq!(name, "mlops-euw1");
	}

	#[test]
	fn test_only_first_region_is_compressed() {
		let name = BucketNameBuilder::new("proj")
			.suffix_part1("us-east-1")
			.suffix_part2("us-west-2")
			.build()
			.unwrap();
		assert_eq!(name, "proj-use1-us-west-2");
	}

	#[test]
	fn test_region_matched_on_raw_value() {
		// Case is folded before matching, surrounding whitespace is not trimmed
		let upper = BucketNameBuilder::new("proj").suffix_part2("US-EAST-1").build().unwrap();
		assert_eq!(upper, "proj-use1");

		let padded = BucketNameBuilder::new("proj").suffix_part2(" us-east-1").build().unwrap();
		assert_eq!(padded, "proj-us-east-1");
	}

	#[test]
	fn test_slot_is_trimmed_down_to_its_budget_only() {
		let name = BucketNameBuilder::new("n".repeat(30))
			.prefix("p".repeat(33))
			.name_part2("m")
			.suffix_part1("s")
			.suffix_part2("t")
			.build()
			.unwrap();
		// Every slot is set, so the measured length is exact: 33 + 30 + 3 + 4 = 70.
		// name_part1 stops at its budget of 28, the prefix gives up the rest.
		assert_eq!(name, format!("{}-{}-m-s-t", "p".repeat(28), "n".repeat(28)));
	}

	#[test]
	fn test_unset_slots_shorten_the_measured_length() {
		// Measured as 64 - 3 = 61, nothing is trimmed and the clamp cuts name_part1
		let name = BucketNameBuilder::new("n".repeat(30))
			.prefix("p".repeat(33))
			.build()
			.unwrap();
		assert_eq!(name, format!("{}-{}", "p".repeat(33), "n".repeat(29)));
	}

	#[test]
	fn test_slot_with_zero_budget_is_never_trimmed() {
		let name = BucketNameBuilder::new("n".repeat(40))
			.max_len(Slot::NamePart1, 0)
			.prefix("p".repeat(30))
			.build()
			.unwrap();
		// Only the prefix gives way, 5 short of the 8 needed; the clamp does the rest
		assert_eq!(name, format!("{}-{}", "p".repeat(25), "n".repeat(37)));
	}

	#[test]
	fn test_trimming_alternates_between_slots() {
		let name = BucketNameBuilder::new("n".repeat(50))
			.prefix("p".repeat(20))
			.build()
			.unwrap();
		// Measured 8 - 3 = 5 over: prefix and name_part1 give one character per pass
		assert_eq!(name, format!("{}-{}", "p".repeat(17), "n".repeat(45)));
	}

	#[test]
	fn test_long_name_part1_with_short_prefix() {
		// Measured 71 - 3 = 68, so 5 characters are trimmed before the clamp
		let name = BucketNameBuilder::new("n".repeat(60))
			.prefix("p".repeat(10))
			.build()
			.unwrap();
		assert_eq!(name, format!("{}-{}", "p".repeat(7), "n".repeat(55)));
	}
}
