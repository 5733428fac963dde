use clap::{Parser, Subcommand};
use gitpane::audit::AuditLogger;
use gitpane::git::{DiffRequest, ProcessRunner, parse_change_line};
use gitpane::{AppResult, ChangeRecord, Config, GitError, GitResult, Host, Repository, StatusFlags};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gitpane",
    version,
    about = "Stage, commit, push and pull from a single panel",
    long_about = "Drives the gitpane repository panel from a terminal. \
    Asset files under the configured root are staged, reset and checked out \
    together with their sidecar files."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show branch and file status")]
    Status {
        #[arg(short, long, help = "Fetch the upstream and list incoming/outgoing files")]
        remote: bool,
    },
    #[command(about = "Stage paths, or everything when none are given")]
    Stage {
        #[arg(index = 1)]
        paths: Vec<String>,
    },
    #[command(about = "Unstage paths, or everything when none are given")]
    Unstage {
        #[arg(index = 1)]
        paths: Vec<String>,
    },
    #[command(about = "Commit the index")]
    Commit {
        #[arg(short, long, help = "Commit message")]
        message: String,
    },
    #[command(about = "Push the current branch")]
    Push,
    #[command(about = "Merge the upstream, preferring remote changes")]
    Pull {
        #[arg(long = "keep-local", help = "Keep the local version of this path (repeatable)")]
        keep_local: Vec<String>,
    },
    #[command(about = "Discard the changes to a path")]
    Discard {
        #[arg(index = 1)]
        path: String,
    },
    #[command(about = "Restore a path from a revision")]
    Checkout {
        #[arg(index = 1)]
        revision: String,
        #[arg(index = 2)]
        path: String,
    },
    #[command(about = "Show the history of a path")]
    Log {
        #[arg(index = 1, default_value = ".")]
        path: String,
        #[arg(short = 'n', long, help = "Number of entries")]
        count: Option<usize>,
    },
    #[command(about = "List the files changed by a revision")]
    Show {
        #[arg(index = 1, default_value = "HEAD")]
        revision: String,
    },
    #[command(about = "Compare a path against a revision in the diff tool")]
    Diff {
        #[arg(index = 1)]
        path: String,
        #[arg(long = "rev", default_value = "HEAD")]
        revision: String,
    },
    #[command(about = "Use another git executable and remember it")]
    SetGit {
        #[arg(index = 1)]
        executable: String,
    },
    #[command(about = "Show the detected git version")]
    Version,
}

/// Host that reports to the terminal
struct TerminalHost {
    runner: ProcessRunner,
    diff_tool: String,
}

impl Host for TerminalHost {
    fn refresh_assets(&self) {
        debug!("working tree changed");
    }

    fn show_progress(&self, title: &str, info: &str) {
        eprintln!("{}: {}", title, info);
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        eprint!("{}\n{} [y/N] ", title, message);
        let _ = io::stderr().flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
            Err(_) => false,
        }
    }

    fn warn(&self, title: &str, message: &str) {
        eprintln!("{}: {}", title, message);
    }

    fn invoke_diff_tool(&self, request: &DiffRequest) -> GitResult<()> {
        println!("--- {}\n+++ {}", request.left_label, request.right_label);
        let output = self.runner.run(&self.diff_tool, &[&request.left, &request.right], None)?;
        print!("{}", output.text());
        Ok(())
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gitpane=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> AppResult<()> {
    let mut config = Config::load_or_default()?;
    let mut repo = Repository::discover(&config)?;

    if config.behavior.log_commands {
        match AuditLogger::new() {
            Ok(logger) => repo = repo.with_audit(logger),
            Err(e) => warn!(error = %e, "command history disabled"),
        }
    }

    let host = TerminalHost {
        runner: ProcessRunner::with_timeout(config.timeout())?,
        diff_tool: config.diff.tool.clone(),
    };

    if !repo.is_ready() && !matches!(cli.command, Commands::SetGit { .. } | Commands::Version) {
        eprintln!(
            "git executable '{}' is not usable; run `gitpane set-git <path>`",
            config.git.executable
        );
        return Err(GitError::NotReady.into());
    }

    match cli.command {
        Commands::Status { remote } => {
            repo.refresh_status(remote, &host)?;
            print_status(&repo, remote);
        }
        Commands::Stage { paths } => {
            repo.refresh_status(false, &host)?;
            if paths.is_empty() {
                repo.stage(None)?;
            } else {
                for path in &paths {
                    repo.stage(Some(&lookup(&repo, path)?))?;
                }
            }
        }
        Commands::Unstage { paths } => {
            repo.refresh_status(false, &host)?;
            if paths.is_empty() {
                repo.unstage(None)?;
            } else {
                for path in &paths {
                    repo.unstage(Some(&lookup(&repo, path)?))?;
                }
            }
        }
        Commands::Commit { message } => repo.commit(&message)?,
        Commands::Push => repo.push()?,
        Commands::Pull { keep_local } => {
            repo.refresh_status(true, &host)?;
            for record in repo.remote_updates_mut() {
                record.discard_remote_on_pull = keep_local.iter().any(|p| p == record.path());
            }
            let outcome = repo.pull(&host)?;
            for path in outcome.reverted {
                println!("kept local: {}", path);
            }
        }
        Commands::Discard { path } => {
            repo.refresh_status(false, &host)?;
            let record = lookup(&repo, &path)?;
            if !repo.discard(&record, &host)? {
                println!("cancelled");
            }
        }
        Commands::Checkout { revision, path } => {
            if !repo.checkout_path(&path, &revision, &host)? {
                println!("cancelled");
            }
        }
        Commands::Log { path, count } => {
            let count = count.unwrap_or(config.behavior.log_count);
            for entry in repo.commit_log(&path, count)? {
                println!(
                    "{} {} {:<16} {}",
                    entry.short_hash,
                    entry.timestamp.format("%m-%d %H:%M"),
                    entry.author,
                    entry.message
                );
            }
        }
        Commands::Show { revision } => {
            for record in repo.head_files(&revision)? {
                println!("{}", record.path());
            }
        }
        Commands::Diff { path, revision } => repo.invoke_external_diff(&path, &revision, &host)?,
        Commands::SetGit { executable } => {
            if repo.set_executable_path(&executable) {
                config.git.executable = executable;
                config.save()?;
                println!("{}", repo.environment().version);
            } else {
                eprintln!("'{}' did not report a git version; keeping {}", executable, config.git.executable);
            }
        }
        Commands::Version => println!("{}", repo.environment().version),
    }

    Ok(())
}

/// The refreshed record for `path`, or a bare one when git did not list it
fn lookup(repo: &Repository, path: &str) -> GitResult<ChangeRecord> {
    if let Some(record) = repo.state().local_changes.iter().find(|r| r.path() == path) {
        return Ok(record.clone());
    }
    parse_change_line(path, true, repo.layout())
        .ok_or_else(|| GitError::ParseError(format!("Invalid path: {}", path)))
}

fn print_status(repo: &Repository, remote: bool) {
    let state = repo.state();

    println!("Branch {}", state.branch.info);

    println!("\nUnstaged:");
    for record in &state.local_changes {
        if record.has_status(StatusFlags::HAS_UNSTAGED_CHANGES) {
            println!("  {}", record);
        }
    }

    println!("\nStaged:");
    for record in &state.local_changes {
        if record.has_status(StatusFlags::HAS_STAGED_CHANGES) {
            println!("  {}", record);
        }
    }

    if !remote || !state.branch.has_upstream() {
        return;
    }

    println!("\nIncoming from {} (behind {}):", state.branch.upstream, state.branch.behind);
    for record in &state.remote_updates {
        let marker = if repo.is_conflicting(record) { "!" } else { " " };
        println!(" {} {}", marker, record.path());
    }

    println!("\nOutgoing (ahead {}):", state.branch.ahead);
    for record in &state.local_pushing {
        println!("   {}", record.path());
    }

    if repo.can_pull() {
        println!("\nready to pull");
    } else if repo.can_push() {
        println!("\nready to push");
    }
}
