use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use plane_sync::config::{AppConfig, ExpandedPath, ExportDefaults};
use plane_sync::grammar::Tag;
use plane_sync::issues::{self, Issue};
use plane_sync::modules::{self, Module, ModuleDepths};
use plane_sync::records::{self, IssueExport, LabelExport, ModuleExport, SubIssueExport};
use plane_sync::sub_issues::{self, SubIssue};
use plane_sync::{labels, plane, reader, sync};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
	/// Path to the TOML config file.
	#[arg(long, default_value = "plane-sync.toml")]
	config: PathBuf,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Parse a checklist and print the extraction as JSON
	Parse(ParseArgs),
	/// Parse a checklist and write export records to a directory
	Export(ExportArgs),
	/// Push previously exported records to the remote project
	Sync(SyncArgs),
}

#[derive(Args)]
struct ParseArgs {
	/// Checklist markdown file
	file: PathBuf,
	#[clap(flatten)]
	shared: ExtractFlags,
}

#[derive(Args)]
struct ExportArgs {
	/// Checklist markdown file
	file: PathBuf,
	/// Output directory for the JSON record files
	#[arg(long, short, default_value = "plane-export")]
	out: PathBuf,
	#[clap(flatten)]
	shared: ExtractFlags,
}

#[derive(Args)]
struct ExtractFlags {
	/// Which heading depths count as module sections
	#[arg(long, value_enum, default_value = "top")]
	depths: ModuleDepths,
	/// Only extract issues from module headings containing this text
	#[arg(long)]
	section: Option<String>,
}

#[derive(Args)]
struct SyncArgs {
	/// Which record kind to push
	#[arg(value_enum)]
	target: SyncTarget,
	/// Records file produced by `export` (the export directory for `all`)
	records: PathBuf,
	/// Plan only, create nothing
	#[arg(long)]
	dry_run: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SyncTarget {
	Labels,
	Modules,
	Issues,
	SubIssues,
	/// Labels, then modules, then issues, then sub-issues
	All,
}

struct Extraction {
	modules: Vec<Module>,
	labels: Vec<Tag>,
	issues: Vec<Issue>,
	sub_issues: Vec<SubIssue>,
}

fn extract(file: &Path, flags: &ExtractFlags, defaults: &ExportDefaults) -> Result<Extraction> {
	let tree = reader::parse_markdown_file(file)?;

	let all_modules = modules::extract_modules(&tree, defaults.module_sort_base, flags.depths);
	let (valid, invalid): (Vec<Module>, Vec<Module>) = all_modules.into_iter().partition(modules::validate_module);
	for module in &invalid {
		tracing::warn!(heading = %module.raw_heading_text, "skipping invalid module");
	}

	let labels: Vec<Tag> = labels::extract_labels(&tree).into_iter().filter(labels::validate_label).collect();

	// Offline extraction: no remote catalog, label ids stay unresolved.
	let mut issues: Vec<Issue> = Vec::new();
	match &flags.section {
		Some(section) => {
			issues.extend(issues::extract_issues_in_section(&tree, |text| text.contains(section.as_str()), flags.depths, &[]));
		}
		None =>
			for module in &valid {
				issues.extend(issues::extract_issues_in_section(&tree, |text| text == module.raw_heading_text, flags.depths, &[]));
			},
	}
	issues.retain(|issue| {
		let ok = issues::validate_issue(issue);
		if !ok {
			tracing::warn!(raw = %issue.raw_text, "skipping issue with empty name");
		}
		ok
	});

	let base_dir = file.parent().unwrap_or(Path::new("."));
	let mut sub_issues: Vec<SubIssue> = Vec::new();
	for issue in &issues {
		let Some(link) = &issue.trailing_link else { continue };
		let sub_path = base_dir.join(link);
		match sub_issues::extract_sub_issues_from_file(&sub_path, &issue.name, &issue.module_name) {
			Ok(subs) => sub_issues.extend(subs.into_iter().filter(|s| sub_issues::validate_sub_issue(s))),
			Err(e) => tracing::warn!(issue = %issue.name, "skipping unreadable sub-issue file: {e}"),
		}
	}

	Ok(Extraction {
		modules: valid,
		labels,
		issues,
		sub_issues,
	})
}

fn cmd_parse(args: &ParseArgs, defaults: &ExportDefaults) -> Result<()> {
	let extraction = extract(&args.file, &args.shared, defaults)?;
	let output = serde_json::json!({
		"modules": extraction.modules,
		"labels": extraction.labels,
		"issues": extraction.issues,
		"sub_issues": extraction.sub_issues,
	});
	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}

fn cmd_export(args: &ExportArgs, defaults: &ExportDefaults) -> Result<()> {
	let extraction = extract(&args.file, &args.shared, defaults)?;

	let label_export = LabelExport {
		labels: extraction.labels.iter().map(|tag| records::label_record(tag, defaults)).collect(),
	};
	let module_export = ModuleExport {
		modules: extraction.modules.iter().map(|m| records::module_record(m, defaults)).collect(),
	};
	let issue_export = IssueExport {
		issues: extraction.issues.iter().map(records::issue_record).collect(),
	};
	let sub_issue_export = SubIssueExport {
		issues: extraction.sub_issues.iter().map(records::sub_issue_record).collect(),
	};

	records::write_json(&args.out.join("labels.json"), &label_export)?;
	records::write_json(&args.out.join("modules.json"), &module_export)?;
	records::write_json(&args.out.join("issues.json"), &issue_export)?;
	records::write_json(&args.out.join("sub-issues.json"), &sub_issue_export)?;

	tracing::info!(
		labels = label_export.labels.len(),
		modules = module_export.modules.len(),
		issues = issue_export.issues.len(),
		sub_issues = sub_issue_export.issues.len(),
		out = %args.out.display(),
		"export written"
	);
	Ok(())
}

async fn cmd_sync(args: &SyncArgs, config: &AppConfig) -> Result<()> {
	let client = plane::create_client(&config.plane)?;
	let options = config.sync.batch_options();

	let summary = match args.target {
		SyncTarget::Labels => {
			let export: LabelExport = records::load_json(&args.records)?;
			sync::sync_labels(client, &export.labels, options, args.dry_run).await?
		}
		SyncTarget::Modules => {
			let export: ModuleExport = records::load_json(&args.records)?;
			sync::sync_modules(client, &export.modules, options, args.dry_run).await?
		}
		SyncTarget::Issues => {
			let export: IssueExport = records::load_json(&args.records)?;
			sync::sync_issues(client, &export.issues, &config.sync.states, options, args.dry_run).await?
		}
		SyncTarget::SubIssues => {
			let export: SubIssueExport = records::load_json(&args.records)?;
			sync::sync_sub_issues(client, &export.issues, &config.sync.states, options, args.dry_run).await?
		}
		SyncTarget::All => {
			// Dependency order: issues need labels and modules remotely,
			// sub-issues need their parent issues.
			let labels: LabelExport = records::load_json(&args.records.join("labels.json"))?;
			let modules: ModuleExport = records::load_json(&args.records.join("modules.json"))?;
			let issues: IssueExport = records::load_json(&args.records.join("issues.json"))?;
			let sub_issues: SubIssueExport = records::load_json(&args.records.join("sub-issues.json"))?;

			let mut total = sync::sync_labels(Arc::clone(&client), &labels.labels, options, args.dry_run).await?;
			for summary in [
				sync::sync_modules(Arc::clone(&client), &modules.modules, options, args.dry_run).await?,
				sync::sync_issues(Arc::clone(&client), &issues.issues, &config.sync.states, options, args.dry_run).await?,
				sync::sync_sub_issues(client, &sub_issues.issues, &config.sync.states, options, args.dry_run).await?,
			] {
				total.successful += summary.successful;
				total.failed += summary.failed;
				total.elapsed += summary.elapsed;
			}
			total
		}
	};

	if summary.failed > 0 {
		tracing::error!(failed = summary.failed, successful = summary.successful, "sync finished with failures");
	}
	Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

	let cli = Cli::parse();

	match &cli.command {
		Commands::Parse(args) => cmd_parse(args, &ExportDefaults::default()),
		Commands::Export(args) => {
			// Export works offline; the config is optional and only supplies
			// payload defaults when present.
			let defaults = AppConfig::try_from(ExpandedPath(cli.config.clone())).map(|c| c.export).unwrap_or_default();
			cmd_export(args, &defaults)
		}
		Commands::Sync(args) => {
			let config = AppConfig::try_from(ExpandedPath(cli.config.clone()))?;
			cmd_sync(args, &config).await
		}
	}
}
