//! AWS region table and short codes.
//!
//! The region list is part of the naming contract: adding or removing an entry
//! changes which components get compressed, and therefore which bucket names
//! are produced.

/// Regions recognized by the name synthesizer.
pub const VALID_REGIONS: [&str; 30] = [
	"us-east-1",
	"us-east-2",
	"us-west-1",
	"us-west-2",
	"af-south-1",
	"ap-east-1",
	"ap-south-1",
	"ap-south-2",
	"ap-southeast-1",
	"ap-southeast-2",
	"ap-southeast-3",
	"ap-southeast-4",
	"ap-northeast-1",
	"ap-northeast-2",
	"ap-northeast-3",
	"ca-central-1",
	"eu-central-1",
	"eu-central-2",
	"eu-west-1",
	"eu-west-2",
	"eu-west-3",
	"eu-south-1",
	"eu-south-2",
	"eu-north-1",
	"il-central-1",
	"me-south-1",
	"me-central-1",
	"sa-east-1",
	"us-gov-east-1",
	"us-gov-west-1",
];

/// Word abbreviations, applied in order.
const ABBREVIATIONS: [(&str, &str); 6] = [
	("east", "e"),
	("west", "w"),
	("south", "s"),
	("north", "n"),
	("central", "c"),
	("gov", "g"),
];

/// Exact membership test against [`VALID_REGIONS`].
pub fn is_valid_region(region: &str) -> bool {
	VALID_REGIONS.contains(&region)
}

/// Compress a region into its short code, e.g. `us-east-1` → `use1`.
///
/// The input is lowercased and trimmed first. Returns `None` for anything not
/// in [`VALID_REGIONS`].
pub fn region_short_code(region: &str) -> Option<String> {
	let region = region.trim().to_lowercase();
	if !is_valid_region(&region) {
		return None;
	}

	let code = ABBREVIATIONS
		.iter()
		.fold(region, |acc, &(word, abbr)| acc.replace(word, abbr));
	Some(code.replace('-', ""))
}

/// Length of the longest region identifier.
pub fn max_region_len() -> usize {
	VALID_REGIONS.iter().map(|r| r.len()).max().unwrap_or(0)
}
