//! Platform configuration detection, loading and validation.
//!
//! Finds `config/cdk-app.yml` (or `cdk-app.yml`) and parses the deployment
//! sets and stages that bucket names are planned for.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::region::is_valid_region;
use crate::sanitize::sanitize_number;

/// Config file locations relative to each searched directory, in priority order.
const CONFIG_CANDIDATES: [&str; 2] = ["config/cdk-app.yml", "cdk-app.yml"];

/// A 12-digit AWS account id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
	/// Parse an account id, ignoring anything that isn't a digit.
	///
	/// Shorter ids are zero-padded, since YAML integers lose leading zeros.
	pub fn parse(value: &str) -> Result<Self> {
		let digits = sanitize_number(value);
		if digits.is_empty() || digits.len() > 12 {
			bail!("Invalid account id {:?}: expected 12 digits", value);
		}
		Ok(Self(format!("{:0>12}", digits)))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for AccountId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl<'de> Deserialize<'de> for AccountId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Number(u64),
			Text(String),
		}

		let raw = match Raw::deserialize(deserializer)? {
			Raw::Number(n) => n.to_string(),
			Raw::Text(s) => s,
		};
		AccountId::parse(&raw).map_err(serde::de::Error::custom)
	}
}

impl Serialize for AccountId {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.0)
	}
}

/// Top-level document: everything lives under `cdk_app_config`.
#[derive(Debug, Clone, Deserialize)]
struct AppConfigFile {
	cdk_app_config: CdkAppConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CdkAppConfig {
	#[serde(default = "default_app_prefix")]
	pub app_prefix: String,
	#[serde(default)]
	pub pipeline: Option<PipelineConfig>,
	#[serde(default)]
	pub deployments: Vec<DeploymentConfig>,
}

fn default_app_prefix() -> String {
	"mlops-cdk".to_string()
}

fn default_enabled() -> bool {
	true
}

/// The account and region hosting the CI/CD pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
	pub account: Option<AccountId>,
	pub region: Option<String>,
}

/// A named set of deployment stages (dev, preprod, prod, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
	pub set_name: String,
	#[serde(default = "default_enabled")]
	pub enabled: bool,
	#[serde(default)]
	pub default_region: Option<String>,
	#[serde(default)]
	pub stages: Vec<DeploymentStage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentStage {
	pub stage_name: String,
	pub account: AccountId,
	#[serde(default = "default_enabled")]
	pub enabled: bool,
	#[serde(default)]
	pub region: Option<String>,
}

impl DeploymentConfig {
	/// Stages with their region resolved.
	///
	/// A stage's own region wins, then the set's `default_region`, then
	/// `fallback_region`. Stages left without a region keep `None`.
	pub fn deployment_stages(&self, fallback_region: Option<&str>) -> Vec<DeploymentStage> {
		let default_region = non_blank(self.default_region.as_deref()).or(non_blank(fallback_region));

		self.stages
			.iter()
			.map(|stage| DeploymentStage {
				region: non_blank(stage.region.as_deref())
					.or(default_region)
					.map(str::to_string),
				..stage.clone()
			})
			.collect()
	}

	/// Find a stage by name, ignoring case.
	pub fn stage_by_name(&self, name: &str, fallback_region: Option<&str>) -> Option<DeploymentStage> {
		self.deployment_stages(fallback_region)
			.into_iter()
			.find(|stage| stage.stage_name.eq_ignore_ascii_case(name))
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|v| !v.is_empty())
}

/// Find the platform config by searching upward from a starting directory.
///
/// In each directory, `config/cdk-app.yml` is checked before `cdk-app.yml`.
/// Returns `None` if no config is found.
pub fn find_app_config(start_dir: &Path) -> Option<PathBuf> {
	start_dir.ancestors().find_map(|dir| {
		CONFIG_CANDIDATES
			.iter()
			.map(|candidate| dir.join(candidate))
			.find(|path| path.is_file())
	})
}

/// Read and parse a config file.
pub fn load_app_config(config_path: &Path) -> Result<CdkAppConfig> {
	let content = fs::read_to_string(config_path)
		.with_context(|| format!("Failed to read {}", config_path.display()))?;

	let file: AppConfigFile = serde_yaml::from_str(&content)
		.with_context(|| format!("Failed to parse {}", config_path.display()))?;

	log::info!(
		"Loaded {} with {} deployment set(s)",
		config_path.display(),
		file.cdk_app_config.deployments.len()
	);

	Ok(file.cdk_app_config)
}

/// Check that the config can produce bucket names.
///
/// Every problem is reported at once; returns `Err` with the full list.
pub fn validate_app_config(config: &CdkAppConfig) -> Result<()> {
	let mut problems = Vec::new();

	if config.app_prefix.trim().is_empty() {
		problems.push("app_prefix is empty".to_string());
	}

	if let Some(region) = config.pipeline.as_ref().and_then(|p| p.region.as_deref()) {
		if !is_valid_region(region.trim()) {
			problems.push(format!("pipeline: unknown region {:?}", region));
		}
	}

	let mut set_names = HashSet::new();
	for deployment in &config.deployments {
		let set_name = deployment.set_name.trim();
		if set_name.is_empty() {
			problems.push("a deployment set has an empty set_name".to_string());
		} else if !set_names.insert(set_name.to_lowercase()) {
			problems.push(format!("duplicate deployment set {:?}", set_name));
		}

		if let Some(region) = non_blank(deployment.default_region.as_deref()) {
			if !is_valid_region(region) {
				problems.push(format!(
					"{}: unknown default_region {:?}",
					set_name, region
				));
			}
		}

		let mut stage_names = HashSet::new();
		for stage in &deployment.stages {
			if !stage_names.insert(stage.stage_name.trim().to_lowercase()) {
				problems.push(format!(
					"{}: duplicate stage {:?}",
					set_name, stage.stage_name
				));
			}
			if let Some(region) = non_blank(stage.region.as_deref()) {
				if !is_valid_region(region) {
					problems.push(format!(
						"{}/{}: unknown region {:?}",
						set_name, stage.stage_name, region
					));
				}
			}
		}
	}

	if !problems.is_empty() {
		bail!(
			r#"
ERROR: The platform config cannot be used to plan bucket names.

Fix the following:

  - {}

Regions must be one of the supported AWS region ids (e.g. "eu-west-1").
"#,
			problems.join("\n  - ")
		);
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::tempdir;

	fn parse(yaml: &str) -> CdkAppConfig {
		serde_yaml::from_str::<AppConfigFile>(yaml)
			.unwrap()
			.cdk_app_config
	}

	#[test]
	fn test_find_app_config() {
		let temp = tempdir().unwrap();
		let nested = temp.path().join("a").join("b");
		fs::create_dir_all(&nested).unwrap();

		// No config → None
		assert!(find_app_config(&nested).is_none());

		// Bare cdk-app.yml in an ancestor works
		fs::write(temp.path().join("cdk-app.yml"), "cdk_app_config: {}\n").unwrap();
		assert_eq!(
			find_app_config(&nested),
			Some(temp.path().join("cdk-app.yml"))
		);

		// config/cdk-app.yml wins in the same directory
		fs::create_dir_all(temp.path().join("config")).unwrap();
		fs::write(
			temp.path().join("config").join("cdk-app.yml"),
			"cdk_app_config: {}\n",
		)
		.unwrap();
		assert_eq!(
			find_app_config(&nested),
			Some(temp.path().join("config/cdk-app.yml"))
		);
	}

	#[test]
	fn test_load_app_config_defaults() {
		let temp = tempdir().unwrap();
		let path = temp.path().join("cdk-app.yml");
		fs::write(&path, "cdk_app_config: {}\n").unwrap();

		let config = load_app_config(&path).unwrap();
		assert_eq!(config.app_prefix, "mlops-cdk");
		assert!(config.pipeline.is_none());
		assert!(config.deployments.is_empty());
	}

	#[test]
	fn test_load_app_config_reports_path() {
		let temp = tempdir().unwrap();
		let path = temp.path().join("cdk-app.yml");
		fs::write(&path, "cdk_app_config: [not, a, map]\n").unwrap();

		let err = load_app_config(&path).unwrap_err();
		assert!(err.to_string().contains("cdk-app.yml"));
	}

	#[test]
	fn test_account_id_parsing() {
		assert_eq!(AccountId::parse("123456789012").unwrap().as_str(), "123456789012");
		assert_eq!(AccountId::parse("1234-5678-9012").unwrap().as_str(), "123456789012");
		assert_eq!(AccountId::parse("12345678901").unwrap().as_str(), "012345678901");
		assert!(AccountId::parse("1234567890123").is_err());
		assert!(AccountId::parse("none").is_err());
	}

	#[test]
	fn test_account_id_from_yaml_number_or_string() {
		let config = parse(
			r#"
cdk_app_config:
  deployments:
    - set_name: first
      stages:
        - stage_name: dev
          account: 12345678901
        - stage_name: prod
          account: "098765432109"
"#,
		);
		let stages = &config.deployments[0].stages;
		assert_eq!(stages[0].account.as_str(), "012345678901");
		assert_eq!(stages[1].account.as_str(), "098765432109");
	}

	#[test]
	fn test_deployment_stages_region_fallback() {
		let config = parse(
			r#"
cdk_app_config:
  deployments:
    - set_name: first
      default_region: eu-west-1
      stages:
        - stage_name: dev
          account: 111111111111
        - stage_name: prod
          account: 222222222222
          region: " us-east-1 "
    - set_name: second
      stages:
        - stage_name: dev
          account: 333333333333
          region: ""
"#,
		);

		let first = config.deployments[0].deployment_stages(Some("ap-south-1"));
		assert_eq!(first[0].region.as_deref(), Some("eu-west-1"));
		assert_eq!(first[1].region.as_deref(), Some("us-east-1"));

		let second = &config.deployments[1];
		assert_eq!(
			second.deployment_stages(Some("ap-south-1"))[0].region.as_deref(),
			Some("ap-south-1")
		);
		assert_eq!(second.deployment_stages(None)[0].region, None);
	}

	#[test]
	fn test_stage_by_name_ignores_case() {
		let config = parse(
			r#"
cdk_app_config:
  deployments:
    - set_name: first
      stages:
        - stage_name: PreProd
          account: 111111111111
"#,
		);
		let stage = config.deployments[0]
			.stage_by_name("preprod", Some("eu-west-2"))
			.unwrap();
		assert_eq!(stage.stage_name, "PreProd");
		assert_eq!(stage.region.as_deref(), Some("eu-west-2"));
		assert!(config.deployments[0].stage_by_name("prod", None).is_none());
	}

	#[test]
	fn test_validate_app_config() {
		let valid = parse(
			r#"
cdk_app_config:
  app_prefix: mlops
  pipeline:
    account: 111111111111
    region: eu-west-1
  deployments:
    - set_name: first
      stages:
        - stage_name: dev
          account: 222222222222
          region: eu-west-1
"#,
		);
		assert!(validate_app_config(&valid).is_ok());

		let invalid = parse(
			r#"
cdk_app_config:
  app_prefix: " "
  deployments:
    - set_name: first
      default_region: moon-1
      stages:
        - stage_name: dev
          account: 222222222222
        - stage_name: DEV
          account: 333333333333
          region: eu-west-9
"#,
		);
		let message = validate_app_config(&invalid).unwrap_err().to_string();
		assert!(message.contains("app_prefix is empty"));
		assert!(message.contains("unknown default_region \"moon-1\""));
		assert!(message.contains("duplicate stage \"DEV\""));
		assert!(message.contains("first/DEV: unknown region \"eu-west-9\""));
	}
}
