use anyhow::Context;
use clap::Parser;

use releaseflow::build::CommandBuildRunner;
use releaseflow::config;
use releaseflow::git::{Git2Vcs, Vcs};
use releaseflow::pipeline::{PipelineContext, ReleasePipeline};
use releaseflow::tracker::RestTracker;
use releaseflow::ui;
use releaseflow::ui::ConsoleOperator;

#[derive(clap::Parser)]
#[command(
    name = "releaseflow",
    about = "Drive a gitflow release from the current branch, keeping the issue tracker in sync"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Branch to release from (defaults to the checked-out branch)")]
    branch: Option<String>,

    #[arg(long, help = "Commit to cut the release or hotfix branch from when resuming")]
    commit: Option<String>,

    #[arg(long, help = "Resolve the release state and stop before any side effect")]
    start_release_phase: bool,

    #[arg(long, help = "Run build and tracker sync, then stop for a manual commit")]
    pause_for_commit: bool,

    #[arg(long, help = "Delete superseded unreleased tracker versions on release")]
    squash_unreleased: bool,

    #[arg(short, long, help = "Print version information")]
    version: bool,
}

fn main() {
    let args = Args::parse();

    if args.version {
        println!("releaseflow {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = config::load_config(args.config.as_deref()).context("loading configuration")?;

    if !config.tracker.is_configured() {
        anyhow::bail!(
            "No issue tracker configured: set [tracker] base_url and project in releaseflow.toml"
        );
    }

    let vcs = Git2Vcs::open(".").context("opening git repository")?;

    let branch = match args.branch {
        Some(branch) => branch,
        None => vcs
            .current_branch()?
            .context("Not on a branch; pass --branch explicitly")?,
    };

    let user = std::env::var("RELEASEFLOW_TRACKER_USER").unwrap_or_default();
    let token = std::env::var("RELEASEFLOW_TRACKER_TOKEN").unwrap_or_default();
    let tracker = RestTracker::new(&config.tracker.base_url, &user, &token)
        .context("creating tracker client")?;

    let build_command = config.build.command.clone().context(
        "No build command configured: set [build] command in releaseflow.toml",
    )?;
    let build = CommandBuildRunner::new(build_command, config.build.args.clone());

    let operator = ConsoleOperator::new();

    let mut ctx = PipelineContext::new(branch.as_str());
    ctx.commit = args.commit;
    ctx.start_release_phase = args.start_release_phase;
    ctx.pause_for_commit = args.pause_for_commit;
    ctx.squash_unreleased = args.squash_unreleased;

    ui::display_status(&format!("Releasing from branch '{}'", branch));

    let pipeline = ReleasePipeline::new(&vcs, &tracker, &operator, &build, &config);
    pipeline.run(&ctx)?;

    ui::display_success("Release flow complete");
    Ok(())
}
