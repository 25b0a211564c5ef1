//! Shapeshot binary.
//!
//! Walks the demo global environment and writes its shape snapshot as JSON.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use shapeshot_host::{BaseTemplate, HostValue};
use shapeshot_host::fixtures::demo_global;
use shapeshot_walker::{GraphWalker, WalkerConfig, WalkerSettings};
use tracing::info;

/// Root key the demo global is recorded under.
const ROOT_KEY: &str = "window";

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "SHAPESHOT_LOG";

/// Shapeshot command line arguments.
#[derive(Parser, Debug)]
#[command(name = "shapeshot")]
#[command(about = "Snapshot the shape of a live object graph as JSON")]
struct Args {
	/// TOML settings file
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Objects visited per slice
	#[arg(short, long, value_name = "N")]
	batch_size: Option<usize>,

	/// Deepest level that is descended
	#[arg(long, value_name = "N")]
	max_depth: Option<usize>,

	/// Write the snapshot here instead of stdout
	#[arg(short, long, value_name = "PATH")]
	output: Option<PathBuf>,

	/// Pretty-print the JSON
	#[arg(short, long)]
	pretty: bool,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let settings = load_settings(&args)?;
	info!(
		batch_size = settings.max_dequeue_size,
		max_depth = settings.max_depth,
		identity = ?settings.identity,
		"starting shapeshot"
	);

	let template = BaseTemplate::standard();
	let window = demo_global(&template);

	let walker = GraphWalker::new(WalkerConfig::from_settings(&settings).on_tick(|| tracing::trace!("shapeshot.tick")));
	walker.visit(&HostValue::from(window), ROOT_KEY).context("failed to start walk")?;
	let report = walker.run().await.context("walk failed")?;

	let snapshot = walker.to_json().context("snapshot unavailable")?;
	info!(nodes = walker.progress().nodes, slices = report.slices, "walk complete");

	write_snapshot(&snapshot, args.output.as_deref(), args.pretty)
}

/// Loads file settings, then applies command line overrides.
fn load_settings(args: &Args) -> anyhow::Result<WalkerSettings> {
	let mut settings = match &args.config {
		Some(path) => WalkerSettings::load(path).with_context(|| format!("failed to load settings from {}", path.display()))?,
		None => WalkerSettings::default(),
	};
	if let Some(size) = args.batch_size {
		settings.max_dequeue_size = size;
	}
	if let Some(depth) = args.max_depth {
		settings.max_depth = depth;
	}
	settings.validate().context("invalid settings")?;
	Ok(settings)
}

fn write_snapshot(snapshot: &serde_json::Value, output: Option<&Path>, pretty: bool) -> anyhow::Result<()> {
	let mut text = if pretty {
		serde_json::to_string_pretty(snapshot)?
	} else {
		serde_json::to_string(snapshot)?
	};
	text.push('\n');

	match output {
		Some(path) => {
			std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
			info!(path = %path.display(), "snapshot written");
		}
		None => {
			let mut stdout = std::io::stdout().lock();
			stdout.write_all(text.as_bytes()).context("failed to write stdout")?;
			stdout.flush()?;
		}
	}
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("shapeshot=debug,shapeshot_walker=debug,shapeshot_worker=debug,info")
		} else {
			EnvFilter::new("warn,shapeshot=info")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
