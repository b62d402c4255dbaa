//! pdkit — Playdate SDK development environment tool.
//!
//! ## Commands
//!
//! - `new`: scaffold a project from a template
//! - `build` / `run` / `watch` / `deploy`: drive the vendor toolchain
//! - `templates` / `examples` / `run-example`: browse shipped content
//! - `setup` / `doctor` / `clean`: environment bootstrap and hygiene

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::Level;

use pdkit::commands::build::{self, BuildOptions, BuildResult};
use pdkit::commands::clean;
use pdkit::commands::create::{self, CreateOptions};
use pdkit::commands::device;
use pdkit::commands::doctor;
use pdkit::commands::list;
use pdkit::commands::setup::{self, SetupOptions};
use pdkit::commands::simulator;
use pdkit::commands::watch::{self, WatchOptions};
use pdkit::ToolContext;

#[derive(Parser)]
#[command(name = "pdkit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Development environment tool for the Playdate SDK", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new project from a template
    New {
        /// Project name
        name: String,

        /// Template to copy
        #[arg(short, long, default_value = create::DEFAULT_TEMPLATE)]
        template: String,

        /// Parent directory for the new project (default: current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Compile the project with the vendor compiler
    Build {
        /// Project directory (default: current directory)
        #[arg(long)]
        project: Option<PathBuf>,

        /// Source directory (default: first of source/, Source/, src/)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Output bundle path (default: output.pdx in the project)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Open a compiled bundle in the Playdate Simulator
    Run {
        /// Bundle path (default: output.pdx in the current directory)
        bundle: Option<PathBuf>,
    },

    /// Rebuild whenever the source directory changes
    Watch {
        /// Project directory (default: current directory)
        #[arg(long)]
        project: Option<PathBuf>,

        /// Force the polling backend even when a native notifier exists
        #[arg(long)]
        poll: bool,

        /// Poll interval in seconds (polling backend only)
        #[arg(long, default_value = "1")]
        interval: u64,
    },

    /// Install a compiled bundle onto a connected Playdate
    Deploy {
        /// Bundle path (default: output.pdx in the current directory)
        bundle: Option<PathBuf>,
    },

    /// Show the connected Playdate's serial number and firmware
    Device,

    /// List the available project templates
    Templates,

    /// List the example projects
    Examples,

    /// Build an example project and open it in the simulator
    RunExample {
        /// Example name (see `pdkit examples`)
        name: String,
    },

    /// Remove compiled bundle artifacts
    Clean {
        /// Project directory (default: current directory)
        #[arg(long)]
        project: Option<PathBuf>,
    },

    /// Install the SDK and its companion tools
    Setup {
        /// Answer yes to every prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Report what is installed and what is missing
    Doctor,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    pdkit::logging::init_tracing(level);

    let ctx = ToolContext::from_env();

    let outcome = match cli.command {
        Commands::New {
            name,
            template,
            dir,
        } => cmd_new(&ctx, name, template, dir),
        Commands::Build {
            project,
            source,
            output,
        } => cmd_build(&ctx, project, source, output).await,
        Commands::Run { bundle } => cmd_run(&ctx, bundle).await,
        Commands::Watch {
            project,
            poll,
            interval,
        } => cmd_watch(&ctx, project, poll, interval).await,
        Commands::Deploy { bundle } => cmd_deploy(&ctx, bundle).await,
        Commands::Device => cmd_device(&ctx).await,
        Commands::Templates => cmd_templates(&ctx),
        Commands::Examples => cmd_examples(&ctx),
        Commands::RunExample { name } => cmd_run_example(&ctx, name).await,
        Commands::Clean { project } => cmd_clean(project),
        Commands::Setup { yes } => setup::setup(&ctx, SetupOptions { assume_yes: yes })
            .await
            .map_err(Into::into),
        Commands::Doctor => cmd_doctor(&ctx).await,
    };

    if let Err(e) = outcome {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn cmd_new(
    ctx: &ToolContext,
    name: String,
    template: String,
    dir: Option<PathBuf>,
) -> Result<()> {
    let result = create::create_project(
        ctx,
        CreateOptions {
            name,
            template: Some(template),
            dest_parent: dir,
        },
    )?;
    println!(
        "{} {} from template '{}' at {}",
        "created".green().bold(),
        result.name,
        result.template,
        result.path
    );
    Ok(())
}

async fn cmd_build(
    ctx: &ToolContext,
    project: Option<PathBuf>,
    source: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let result = build::build(
        ctx,
        BuildOptions {
            project_dir: project,
            source_dir: source,
            output,
        },
    )
    .await;
    print_build(&result);
    if !result.success {
        // Diagnostics are already on screen
        std::process::exit(1);
    }
    Ok(())
}

fn print_build(result: &BuildResult) {
    for warning in &result.warnings {
        println!(
            "{} {}:{}: {}",
            "warning".yellow(),
            warning.file,
            warning.line,
            warning.message
        );
    }
    for error in &result.errors {
        println!(
            "{} {}:{}: {}",
            "error".red(),
            error.file,
            error.line,
            error.message
        );
    }

    if result.success {
        println!("{} {}", "built".green().bold(), result.output_path);
    } else {
        // A failed build with nothing parsed would otherwise be invisible
        if result.errors.is_empty() && !result.raw_output.trim().is_empty() {
            println!("{}", result.raw_output.trim_end());
        }
        println!("{}", "build failed".red().bold());
    }
}

async fn cmd_run(ctx: &ToolContext, bundle: Option<PathBuf>) -> Result<()> {
    let launch = simulator::run_bundle(ctx, bundle).await?;
    println!("{} {}", "running".green().bold(), launch.bundle);
    Ok(())
}

async fn cmd_watch(
    ctx: &ToolContext,
    project: Option<PathBuf>,
    poll: bool,
    interval: u64,
) -> Result<()> {
    watch::watch(
        ctx,
        WatchOptions {
            project_dir: project,
            force_poll: poll,
            poll_interval: Some(Duration::from_secs(interval.max(1))),
        },
        print_build,
    )
    .await?;
    Ok(())
}

async fn cmd_deploy(ctx: &ToolContext, bundle: Option<PathBuf>) -> Result<()> {
    let message = device::deploy(ctx, bundle).await?;
    println!("{} {message}", "deployed".green().bold());
    Ok(())
}

async fn cmd_device(ctx: &ToolContext) -> Result<()> {
    let status = device::device_info(ctx).await;
    if !status.connected {
        bail!(status
            .error
            .unwrap_or_else(|| "No Playdate detected".to_string()));
    }
    println!("{}", "Playdate connected".green().bold());
    if let Some(serial) = status.serial {
        println!("  serial:   {serial}");
    }
    if let Some(firmware) = status.firmware {
        println!("  firmware: {firmware}");
    }
    Ok(())
}

fn cmd_templates(ctx: &ToolContext) -> Result<()> {
    let templates = list::list_templates(ctx)?;
    if templates.is_empty() {
        println!("No templates found under {}", ctx.templates_root().display());
        return Ok(());
    }
    for template in templates {
        if template.description.is_empty() {
            println!("{}", template.name.bold());
        } else {
            println!("{:<16} {}", template.name.bold(), template.description);
        }
    }
    Ok(())
}

fn cmd_examples(ctx: &ToolContext) -> Result<()> {
    let examples = list::list_examples(ctx)?;
    if examples.is_empty() {
        println!("No examples found under {}", ctx.demos_root().display());
        return Ok(());
    }
    for example in examples {
        let built = if example.built {
            "built".green().to_string()
        } else {
            "not built".dimmed().to_string()
        };
        println!("{:<16} [{built}]", example.name.bold());
    }
    Ok(())
}

async fn cmd_run_example(ctx: &ToolContext, name: String) -> Result<()> {
    let example_dir = ctx.demos_root().join(&name);
    if !example_dir.is_dir() {
        bail!("Example '{name}' not found — see `pdkit examples`");
    }

    let result = build::build(
        ctx,
        BuildOptions {
            project_dir: Some(example_dir),
            source_dir: None,
            output: None,
        },
    )
    .await;
    print_build(&result);
    if !result.success {
        std::process::exit(1);
    }

    let launch = simulator::run_bundle(ctx, Some(PathBuf::from(&result.output_path))).await?;
    println!("{} {}", "running".green().bold(), launch.bundle);
    Ok(())
}

fn cmd_clean(project: Option<PathBuf>) -> Result<()> {
    let result = clean::clean(project)?;
    if result.removed.is_empty() {
        println!("Nothing to clean");
    } else {
        for path in result.removed {
            println!("{} {path}", "removed".green().bold());
        }
    }
    Ok(())
}

async fn cmd_doctor(ctx: &ToolContext) -> Result<()> {
    let report = doctor::doctor(ctx).await;

    println!(
        "platform:      {} ({})",
        report.platform.os.label(),
        report.platform.arch
    );
    println!("sdk root:      {}", report.sdk_root);
    print_check("sdk", report.sdk_installed);
    print_check("compiler (pdc)", report.compiler_installed);
    if let Some(version) = report.compiler_version {
        println!("  version:     {version}");
    }
    print_check("simulator", report.simulator_installed);
    print_check("device utility (pdutil)", report.device_util_installed);
    println!("watch backend: {}", report.watch_backend);

    Ok(())
}

fn print_check(label: &str, present: bool) {
    let mark = if present {
        "ok".green().to_string()
    } else {
        "missing".red().to_string()
    };
    println!("{label:<22} [{mark}]");
}
