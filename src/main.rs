//! lrweb CLI entry point

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use lrweb::{
    commands::{
        cmd_add_paper, cmd_create_project, cmd_create_run, cmd_delete_project, cmd_init,
        cmd_link_paper, cmd_list_papers, cmd_list_projects, cmd_list_runs, cmd_show_paper,
        cmd_show_project, cmd_show_run, cmd_status, cmd_update_project, cmd_watch_run,
        print_added_paper, print_created_run, print_init_report, print_load_error, print_paper,
        print_papers, print_project, print_project_completions, print_project_overview,
        print_projects, print_run_overview, print_runs, print_status, with_spinner, InitOptions,
        SnapshotSource,
    },
    config::{Config, OriginMode},
    error::Result,
    models::{LinkPaper, NewPaper, Page},
    progress::LogWriterFactory,
    session::Session,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "lrweb")]
#[command(version, about = "Client for the LRWeb literature-review backend", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the lrweb configuration and optionally a personal user id
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,

        /// Backend origin (defaults to http://localhost:8000)
        #[arg(long, env = "BACKEND_URL")]
        backend_url: Option<String>,

        /// Send requests to the backend directly or through the /api proxy prefix
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Store this user id for the X-User-Id header
        #[arg(long)]
        user_id: Option<Uuid>,

        /// Generate and store a fresh user id
        #[arg(long)]
        new_identity: bool,
    },

    /// Show configuration, identity and backend health
    Status,

    /// Research projects
    Projects {
        #[command(subcommand)]
        action: ProjectsAction,
    },

    /// Pipeline runs of a project
    Runs {
        #[command(subcommand)]
        action: RunsAction,
    },

    /// Papers associated with a project
    Papers {
        #[command(subcommand)]
        action: PapersAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Direct,
    Proxy,
}

impl From<ModeArg> for OriginMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Direct => OriginMode::Direct,
            ModeArg::Proxy => OriginMode::Proxy,
        }
    }
}

/// Offset pagination for list views
#[derive(Args)]
struct PageArgs {
    /// Number of entries to skip
    #[arg(long)]
    skip: Option<u32>,

    /// Maximum number of entries to return
    #[arg(long)]
    limit: Option<u32>,
}

impl PageArgs {
    fn page(&self) -> Option<Page> {
        if self.skip.is_none() && self.limit.is_none() {
            return None;
        }
        let default = Page::default();
        Some(Page {
            skip: self.skip.unwrap_or(default.skip),
            limit: self.limit.unwrap_or(default.limit),
        })
    }
}

#[derive(Subcommand)]
enum ProjectsAction {
    /// List your projects
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Output only project IDs (one per line, for scripting)
        #[arg(long)]
        ids_only: bool,

        /// Output project IDs with descriptions for shell completions
        #[arg(long, value_enum, hide = true)]
        completion: Option<Shell>,
    },

    /// Show a project with its runs
    Show { id: Uuid },

    /// Create a project
    Create {
        /// Project name
        name: String,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Rename or re-describe a project
    Update {
        id: Uuid,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a project with its runs and paper links
    Delete {
        id: Uuid,

        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum RunsAction {
    /// List runs of a project, newest first
    List {
        project_id: Uuid,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show a run with its configuration snapshot
    Show { project_id: Uuid, run_id: Uuid },

    /// Start a run, freezing its configuration
    Create {
        project_id: Uuid,

        /// Configuration snapshot as a JSON object
        #[arg(long)]
        snapshot: Option<String>,

        /// File holding the configuration snapshot
        #[arg(long)]
        snapshot_file: Option<PathBuf>,

        /// Snapshot entry as key=value (repeatable)
        #[arg(long = "set")]
        set: Vec<String>,
    },

    /// Follow a run until it completes or fails
    Watch {
        project_id: Uuid,
        run_id: Uuid,

        /// Seconds between polls
        #[arg(long, default_value = "2")]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum PapersAction {
    /// List papers of a project
    List {
        project_id: Uuid,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one paper of a project
    Show { project_id: Uuid, paper_id: Uuid },

    /// Add a paper; papers with a known DOI or arXiv id are reused
    Add {
        project_id: Uuid,

        /// Paper title
        title: String,

        /// Author (repeatable, in order)
        #[arg(short, long = "author")]
        authors: Vec<String>,

        #[arg(short, long)]
        year: Option<i32>,

        #[arg(long)]
        doi: Option<String>,

        #[arg(long)]
        arxiv_id: Option<String>,

        #[arg(long = "abstract")]
        abstract_text: Option<String>,
    },

    /// Link an existing paper to a project
    Link {
        project_id: Uuid,
        paper_id: Uuid,

        /// Why the paper belongs in the review
        #[arg(long)]
        reason: Option<String>,

        #[arg(long)]
        score: Option<f64>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    // Handle init command specially (doesn't need existing config)
    if matches!(cli.command, Commands::Init { .. }) {
        return handle_init(cli);
    }

    // Handle completions command (doesn't need config)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "lrweb", &mut std::io::stdout());
        print_completion_extras(shell);
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let session = Session::from_config(&config)?;
    let json = cli.json;

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Status => {
            let status = cmd_status(&config, session.client()).await?;
            if json {
                print_json(&status)?;
            } else {
                print_status(&status);
            }
        }

        Commands::Projects { action } => handle_projects(&session, action, json).await?,
        Commands::Runs { action } => handle_runs(&session, action, json).await?,
        Commands::Papers { action } => handle_papers(&session, action, json).await?,
    }

    Ok(())
}

fn handle_init(cli: Cli) -> Result<()> {
    let Commands::Init {
        force,
        backend_url,
        mode,
        user_id,
        new_identity,
    } = cli.command
    else {
        unreachable!()
    };

    // If the user specifies a config file, its parent dir is the base dir
    let (base_dir, config_path) = if let Some(path) = cli.config {
        let base = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(Config::default_base_dir);
        let config = if path.extension().map_or(false, |e| e == "toml") {
            path
        } else {
            path.join("config.toml")
        };
        (base, config)
    } else {
        let base = Config::default_base_dir();
        (base.clone(), base.join("config.toml"))
    };

    let report = cmd_init(InitOptions {
        base_dir,
        config_path,
        force,
        backend_url,
        mode: mode.map(OriginMode::from),
        user_id,
        new_identity,
    })?;

    if cli.json {
        print_json(&serde_json::json!({
            "config_path": report.config_path,
            "identity_path": report.identity_path,
            "user_id": report.persisted_user_id,
        }))?;
    } else {
        print_init_report(&report);
    }
    Ok(())
}

async fn handle_projects(session: &Session, action: ProjectsAction, json: bool) -> Result<()> {
    match action {
        ProjectsAction::List {
            page,
            ids_only,
            completion,
        } => {
            let projects = if completion.is_some() || ids_only {
                cmd_list_projects(session, page.page()).await?
            } else {
                loaded(
                    "projects",
                    with_spinner("Loading projects", cmd_list_projects(session, page.page()))
                        .await,
                )
            };

            if let Some(shell) = completion {
                print_project_completions(&projects, shell);
            } else if ids_only {
                for project in &projects {
                    println!("{}", project.id);
                }
            } else if json {
                print_json(&projects)?;
            } else {
                print_projects(&projects);
            }
        }

        ProjectsAction::Show { id } => {
            let overview = loaded(
                "Project",
                with_spinner("Loading project", cmd_show_project(session, id)).await,
            );
            if json {
                print_json(&overview)?;
            } else {
                print_project_overview(&overview);
            }
        }

        ProjectsAction::Create { name, description } => {
            let project = with_spinner(
                "Creating project",
                cmd_create_project(session, name, description),
            )
            .await?;
            if json {
                print_json(&project)?;
            } else {
                print_project(&project, "Created");
            }
        }

        ProjectsAction::Update {
            id,
            name,
            description,
        } => {
            let project = with_spinner(
                "Updating project",
                cmd_update_project(session, id, name, description),
            )
            .await?;
            if json {
                print_json(&project)?;
            } else {
                print_project(&project, "Updated");
            }
        }

        ProjectsAction::Delete { id, yes } => {
            if !yes {
                eprintln!("⚠️  This deletes the project with all its runs and paper links!");
                eprintln!("Run with --yes to confirm.");
                std::process::exit(1);
            }
            with_spinner("Deleting project", cmd_delete_project(session, id)).await?;
            if json {
                println!(r#"{{"status": "ok", "deleted": "{}"}}"#, id);
            } else {
                println!("✓ Project {} deleted", id);
            }
        }
    }
    Ok(())
}

async fn handle_runs(session: &Session, action: RunsAction, json: bool) -> Result<()> {
    match action {
        RunsAction::List { project_id, page } => {
            let runs = loaded(
                "runs",
                with_spinner("Loading runs", cmd_list_runs(session, project_id, page.page()))
                    .await,
            );
            if json {
                print_json(&runs)?;
            } else {
                print_runs(&runs);
            }
        }

        RunsAction::Show { project_id, run_id } => {
            let overview = loaded(
                "Run",
                with_spinner("Loading run", cmd_show_run(session, project_id, run_id)).await,
            );
            if json {
                print_json(&overview)?;
            } else {
                print_run_overview(&overview);
            }
        }

        RunsAction::Create {
            project_id,
            snapshot,
            snapshot_file,
            set,
        } => {
            let source = SnapshotSource {
                json: snapshot,
                file: snapshot_file,
                set,
            };
            let run = with_spinner("Starting run", cmd_create_run(session, project_id, &source))
                .await?;
            if json {
                print_json(&run)?;
            } else {
                print_created_run(&run);
            }
        }

        RunsAction::Watch {
            project_id,
            run_id,
            interval,
        } => {
            let interval = Duration::from_secs(interval.max(1));
            let run = cmd_watch_run(session, project_id, run_id, interval, json).await;
            let run = loaded("Run", run);
            if !json {
                println!("Run {} finished: {}", run.short_id(), run.status);
            }
        }
    }
    Ok(())
}

async fn handle_papers(session: &Session, action: PapersAction, json: bool) -> Result<()> {
    match action {
        PapersAction::List { project_id, page } => {
            let papers = loaded(
                "papers",
                with_spinner(
                    "Loading papers",
                    cmd_list_papers(session, project_id, page.page()),
                )
                .await,
            );
            if json {
                print_json(&papers)?;
            } else {
                print_papers(&papers);
            }
        }

        PapersAction::Show {
            project_id,
            paper_id,
        } => {
            let paper = loaded(
                "Paper",
                with_spinner("Loading paper", cmd_show_paper(session, project_id, paper_id))
                    .await,
            );
            if json {
                print_json(&paper)?;
            } else {
                print_paper(&paper);
            }
        }

        PapersAction::Add {
            project_id,
            title,
            authors,
            year,
            doi,
            arxiv_id,
            abstract_text,
        } => {
            let paper = NewPaper {
                title,
                authors,
                year,
                doi,
                arxiv_id,
                abstract_text,
            };
            let association =
                with_spinner("Adding paper", cmd_add_paper(session, project_id, paper)).await?;
            if json {
                print_json(&association)?;
            } else {
                print_added_paper(&association);
            }
        }

        PapersAction::Link {
            project_id,
            paper_id,
            reason,
            score,
        } => {
            let link = LinkPaper {
                paper_id,
                inclusion_reason: reason,
                score,
            };
            let association =
                with_spinner("Linking paper", cmd_link_paper(session, project_id, link)).await?;
            if json {
                print_json(&association)?;
            } else {
                print_added_paper(&association);
            }
        }
    }
    Ok(())
}

/// Unwrap a read for display, or render its error state and exit
fn loaded<T>(resource: &str, result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            print_load_error(resource, &e);
            std::process::exit(1);
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(config_path) => {
            if !config_path.exists() {
                eprintln!(
                    "Config file not found: {}\nRun 'lrweb init' first.",
                    config_path.display()
                );
                std::process::exit(1);
            }
            Config::load(config_path)
        }
        // Without an explicit path, defaults apply until `lrweb init` writes a file
        None => Config::load_from(None),
    }
}

fn print_completion_extras(shell: Shell) {
    if let Shell::Bash = shell {
        println!();
        println!("# Dynamic completion of project IDs for 'lrweb projects show|update|delete'");
        println!("_lrweb_dynamic() {{");
        println!("    local cur=\"${{COMP_WORDS[COMP_CWORD]}}\"");
        println!("    local prev=\"${{COMP_WORDS[COMP_CWORD-1]}}\"");
        println!("    if [[ \"${{COMP_WORDS[1]}}\" == \"projects\" && \"$prev\" =~ ^(show|update|delete)$ ]]; then");
        println!("        COMPREPLY=( $(compgen -W \"$(lrweb projects list --completion bash 2>/dev/null)\" -- \"$cur\") )");
        println!("        return 0");
        println!("    fi");
        println!("    _lrweb \"$@\"");
        println!("}}");
        println!("complete -F _lrweb_dynamic -o nosort -o bashdefault -o default lrweb");
    }
}
