use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::{Parser, Subcommand};

use thalia::{logging, tui, App, Config, Snapshot, Tui, Workspace};

/// A terminal UI for git repositories
#[derive(Parser, Debug)]
#[command(name = "thalia", version, about, long_about = None)]
struct Args {
    /// Settings file (defaults to $THALIA_CONFIG_FILE, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Open the interactive UI (default)
    Tui {
        /// Any path inside the repository
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Print branch, working tree status and recent commits
    Status {
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new repository
    Init { dir: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Cmd::Tui {
        path: PathBuf::from("."),
    });

    if matches!(command, Cmd::Tui { .. }) {
        tui::install_panic_hook();
        // Ok to fail silently, the app works without logs
        let _ = logging::init();
    } else {
        logging::init_stderr();
    }

    let config = Config::load(args.config.as_deref())?;

    match command {
        Cmd::Tui { path } => {
            let mut tui = Tui::new()?;
            let mut app = App::new(path, config);
            app.run(&mut tui).await?;
        }
        Cmd::Status { path, json } => status(&path, config, json).await?,
        Cmd::Init { dir } => {
            let service = config.service.with_watch(false);
            let workspace = Workspace::init(&dir, &service)
                .await
                .with_context(|| format!("Failed to initialize {}", dir.display()))?;
            println!(
                "Initialized empty repository in {}",
                workspace.root().display()
            );
            workspace.shutdown().await;
        }
    }

    Ok(())
}

async fn status(path: &Path, config: Config, json: bool) -> anyhow::Result<()> {
    let service = config.service.with_watch(false);
    let workspace = Workspace::open(path, &service).await?;
    let snapshot = workspace.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&*snapshot)?);
    } else {
        print!("{}", format_status(&snapshot));
    }

    workspace.shutdown().await;
    Ok(())
}

fn format_status(snapshot: &Snapshot) -> String {
    let mut out = format!("## {}\n", snapshot.head.label());
    for file in &snapshot.files {
        match &file.original_path {
            Some(from) => out.push_str(&format!("{} {} -> {}\n", file.code(), from, file.path)),
            None => out.push_str(&format!("{} {}\n", file.code(), file.path)),
        }
    }
    for commit in snapshot.commits.iter().take(5) {
        out.push_str(&format!("{} {}\n", commit.short_sha(), commit.summary()));
    }
    out
}
