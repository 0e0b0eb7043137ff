//! MLOps Bucket Naming CLI
//!
//! Synthesizes S3 bucket names that fit in 63 characters, either one at a
//! time or for every stage in the platform config.

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use mlops_naming::app_config::{find_app_config, load_app_config, validate_app_config};
use mlops_naming::naming::{BucketNameBuilder, DEFAULT_SEPARATOR};
use mlops_naming::region::region_short_code;
use mlops_naming::sanitize::sanitize;
use mlops_naming::{plan_stage_bucket, plan_stage_buckets, BucketTemplate, Budgets, Slot};
use std::env;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mlops-naming")]
#[command(version)]
#[command(about = "Synthesize S3 bucket names for MLOps deployments", long_about = None)]
struct Cli {
	/// Log what the synthesizer is doing (RUST_LOG overrides)
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Synthesize a single bucket name
	Name(NameArgs),

	/// Print the short code of an AWS region
	Region {
		#[arg(value_name = "REGION")]
		region: String,
	},

	/// Print a token the way bucket name components are sanitized
	Sanitize {
		#[arg(value_name = "TOKEN")]
		token: String,
	},

	/// Plan the bucket name of every stage in the platform config
	Stages(StagesArgs),
}

#[derive(Args, Debug)]
struct NameArgs {
	/// Required first name part
	#[arg(value_name = "NAME_PART1")]
	name_part1: String,

	#[arg(long)]
	prefix: Option<String>,

	#[arg(long)]
	name_part2: Option<String>,

	#[arg(long)]
	suffix_part1: Option<String>,

	#[arg(long)]
	suffix_part2: Option<String>,

	#[arg(long, default_value = "5")]
	prefix_max_len: usize,

	#[arg(long, default_value = "28")]
	name_part1_max_len: usize,

	#[arg(long, default_value = "9")]
	name_part2_max_len: usize,

	#[arg(long, default_value = "12")]
	suffix_part1_max_len: usize,

	#[arg(long, default_value = "5")]
	suffix_part2_max_len: usize,

	/// Character placed between components
	#[arg(long, default_value_t = DEFAULT_SEPARATOR)]
	separator: char,

	/// Keep region ids as-is instead of compressing them (us-east-1 → use1)
	#[arg(long)]
	keep_region: bool,
}

#[derive(Args, Debug)]
struct StagesArgs {
	/// Path to cdk-app.yml (searched upward from the current directory if omitted)
	#[arg(short, long, value_name = "CONFIG")]
	config: Option<PathBuf>,

	#[arg(long, default_value = "sc-product")]
	name_part1: String,

	/// Second name part (pass an empty string to omit)
	#[arg(long, default_value = "assets")]
	name_part2: String,

	/// Keep region ids as-is instead of compressing them
	#[arg(long)]
	keep_region: bool,

	/// Only plan the stage with this name (case-insensitive) in each set
	#[arg(long, value_name = "STAGE")]
	stage: Option<String>,

	/// Region for stages whose set has no default_region
	#[arg(long, env = "CDK_DEFAULT_REGION")]
	default_region: Option<String>,

	/// Print the plan as JSON
	#[arg(long)]
	json: bool,

	/// Skip platform config validation (use with caution)
	#[arg(long)]
	skip_config_check: bool,
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	let default_filter = if cli.verbose { "info" } else { "warn" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
		.init();

	match cli.command {
		Command::Name(args) => run_name(args),
		Command::Region { region } => {
			let code = region_short_code(&region)
				.ok_or_else(|| anyhow!("Unknown AWS region: {}", region))?;
			println!("{}", code);
			Ok(())
		}
		Command::Sanitize { token } => {
			println!("{}", sanitize(&token));
			Ok(())
		}
		Command::Stages(args) => run_stages(args),
	}
}

fn run_name(args: NameArgs) -> Result<()> {
	let budgets = Budgets {
		prefix: args.prefix_max_len,
		name_part1: args.name_part1_max_len,
		name_part2: args.name_part2_max_len,
		suffix_part1: args.suffix_part1_max_len,
		suffix_part2: args.suffix_part2_max_len,
	};

	let name = BucketNameBuilder::new(args.name_part1)
		.part(Slot::Prefix, args.prefix)
		.part(Slot::NamePart2, args.name_part2)
		.part(Slot::SuffixPart1, args.suffix_part1)
		.part(Slot::SuffixPart2, args.suffix_part2)
		.budgets(budgets)
		.separator(args.separator)
		.convert_region_to_short_code(!args.keep_region)
		.build()?;

	println!("{}", name);
	Ok(())
}

fn run_stages(args: StagesArgs) -> Result<()> {
	// Determine the config file
	let config_path = if let Some(path) = args.config {
		path
	} else {
		let cwd = env::current_dir()?;
		match find_app_config(&cwd) {
			Some(path) => path,
			None => bail!(
				"No --config specified and no platform config found.\n\
				 Looked for config/cdk-app.yml or cdk-app.yml in {} and its parents.\n\
				 Example: mlops-naming stages --config ./config/cdk-app.yml",
				cwd.display()
			),
		}
	};

	let config = load_app_config(&config_path)?;

	if !args.skip_config_check {
		validate_app_config(&config)?;
	}

	let template = BucketTemplate {
		name_part1: args.name_part1,
		name_part2: Some(args.name_part2).filter(|v| !v.trim().is_empty()),
		convert_region_to_short_code: !args.keep_region,
	};

	let fallback_region = args.default_region.as_deref();
	let plan = match args.stage.as_deref() {
		Some(stage) => plan_stage_bucket(&config, &template, stage, fallback_region)?,
		None => plan_stage_buckets(&config, &template, fallback_region)?,
	};

	if args.json {
		println!("{}", serde_json::to_string_pretty(&plan)?);
		return Ok(());
	}

	if plan.is_empty() {
		eprintln!(
			"Warning: No enabled deployment stages in {}",
			config_path.display()
		);
		return Ok(());
	}

	for row in &plan {
		println!(
			"{}/{}\t{}\t{}\t{}",
			row.set_name, row.stage_name, row.account, row.region, row.bucket_name
		);
	}

	Ok(())
}
