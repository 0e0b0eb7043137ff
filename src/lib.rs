//! MLOps Bucket Naming Library
//!
//! Synthesizes S3 bucket names that fit the 63 character limit for a
//! multi-account MLOps platform, and plans the names for every deployment
//! stage listed in the platform config.

pub mod app_config;
pub mod naming;
pub mod region;
pub mod sanitize;

use anyhow::{anyhow, bail, Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use app_config::{AccountId, CdkAppConfig, DeploymentStage};
use naming::BucketNameBuilder;

pub use naming::{Budgets, Slot, ValidationError, MAX_BUCKET_NAME_LEN};

/// The fixed parts of a per-stage bucket name.
///
/// The app prefix, account id and region come from the config; the name
/// parts come from here.
#[derive(Debug, Clone)]
pub struct BucketTemplate {
	pub name_part1: String,
	pub name_part2: Option<String>,
	pub convert_region_to_short_code: bool,
}

impl Default for BucketTemplate {
	fn default() -> Self {
		Self {
			name_part1: "sc-product".to_string(),
			name_part2: Some("assets".to_string()),
			convert_region_to_short_code: true,
		}
	}
}

impl BucketTemplate {
	/// Bucket name for one account/region pair.
	pub fn bucket_name(
		&self,
		app_prefix: &str,
		account: &AccountId,
		region: &str,
	) -> Result<String, ValidationError> {
		BucketNameBuilder::new(self.name_part1.as_str())
			.prefix(app_prefix)
			.part(Slot::NamePart2, self.name_part2.clone())
			.suffix_part1(account.as_str())
			.suffix_part2(region)
			.convert_region_to_short_code(self.convert_region_to_short_code)
			.build()
	}
}

/// Planned bucket for a single deployment stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageBucket {
	pub set_name: String,
	pub stage_name: String,
	pub account: AccountId,
	pub region: String,
	pub bucket_name: String,
}

/// Compute the bucket name of every enabled stage in every enabled set.
///
/// Rows come back in config order. `fallback_region` is used for stages
/// whose set has no `default_region`.
pub fn plan_stage_buckets(
	config: &CdkAppConfig,
	template: &BucketTemplate,
	fallback_region: Option<&str>,
) -> Result<Vec<StageBucket>> {
	// Flatten first (sequential - keeps config order)
	let stages: Vec<_> = config
		.deployments
		.iter()
		.filter(|deployment| deployment.enabled)
		.flat_map(|deployment| {
			deployment
				.deployment_stages(fallback_region)
				.into_iter()
				.filter(|stage| stage.enabled)
				.map(move |stage| (deployment.set_name.as_str(), stage))
		})
		.collect();

	log::info!("Planning bucket names for {} stage(s)", stages.len());

	// Parallel name synthesis
	stages
		.par_iter()
		.map(|(set_name, stage)| stage_bucket(config, template, set_name, stage))
		.collect()
}

/// Compute the bucket name of one stage in every enabled set that has it.
///
/// Stage names match case-insensitively. Fails if no enabled set has an
/// enabled stage by that name.
pub fn plan_stage_bucket(
	config: &CdkAppConfig,
	template: &BucketTemplate,
	stage_name: &str,
	fallback_region: Option<&str>,
) -> Result<Vec<StageBucket>> {
	let rows = config
		.deployments
		.iter()
		.filter(|deployment| deployment.enabled)
		.filter_map(|deployment| {
			deployment
				.stage_by_name(stage_name, fallback_region)
				.filter(|stage| stage.enabled)
				.map(|stage| stage_bucket(config, template, &deployment.set_name, &stage))
		})
		.collect::<Result<Vec<_>>>()?;

	if rows.is_empty() {
		bail!(
			"No enabled stage named {:?} in any enabled deployment set.\n\
			 Run without --stage to list every planned stage.",
			stage_name
		);
	}

	Ok(rows)
}

fn stage_bucket(
	config: &CdkAppConfig,
	template: &BucketTemplate,
	set_name: &str,
	stage: &DeploymentStage,
) -> Result<StageBucket> {
	let region = stage.region.clone().ok_or_else(|| {
		anyhow!(
			"Stage {}/{} has no region.\n\
			 Set `region` on the stage, `default_region` on the set, or CDK_DEFAULT_REGION.",
			set_name,
			stage.stage_name
		)
	})?;

	let bucket_name = template
		.bucket_name(&config.app_prefix, &stage.account, &region)
		.with_context(|| {
			format!(
				"Failed to name bucket for stage {}/{}",
				set_name, stage.stage_name
			)
		})?;

	log::debug!("{}/{} -> {}", set_name, stage.stage_name, bucket_name);

	Ok(StageBucket {
		set_name: set_name.to_string(),
		stage_name: stage.stage_name.clone(),
		account: stage.account.clone(),
		region,
		bucket_name,
	})
}
