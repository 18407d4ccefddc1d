use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use asset_forge::{Project, ProjectOptions, SourceAssetId};

#[derive(Parser, Debug)]
#[command(name = "asset-forge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a project (or one of its assets) for a renderer target.
    Compile(CompileArgs),
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Project manifest file.
    #[arg(long)]
    project: PathBuf,

    /// Renderer target name from the targets table.
    #[arg(long)]
    target: String,

    /// Output root (defaults to `<project dir>/output`); the target compiles into `<root>/<target>`.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Rebuild every asset even when the cache says it is current.
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Compile only this source asset id; any failure aborts.
    #[arg(long)]
    asset: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
    }
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let options = ProjectOptions {
        output_directory: args.output,
        cache_directory: None,
        force: args.force,
    };
    let mut project = Project::load(&args.project, &args.target, options)?;

    if let Some(id) = args.asset {
        let rebuilt = project.compile_asset(SourceAssetId(id))?;
        let state = if rebuilt { "compiled" } else { "up to date" };
        eprintln!("asset {id} {state}; wrote {}", project.package_path().display());
        return Ok(());
    }

    let report = project.compile_all()?;
    eprintln!(
        "compiled {}, up to date {}, failed {}; wrote {}",
        report.compiled,
        report.skipped,
        report.failures.len(),
        project.package_path().display()
    );
    if !report.is_success() {
        for failure in &report.failures {
            eprintln!("  asset {}: {}", failure.source_id, failure.message);
        }
        anyhow::bail!("{} asset(s) failed to compile", report.failures.len());
    }
    Ok(())
}
