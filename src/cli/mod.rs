pub mod interactive;
pub mod shutdown;

use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use interactive::run_session;
use shutdown::detect_shutdown;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    dashboard::{
        brief::stats,
        metrics::{display_text, MetricsFetcher, MetricsSource, DEFAULT_ENDPOINT},
        Dashboard, DashboardSettings,
    },
    tasks::{
        local_storage::{FileLocalStorage, LocalStorage},
        manager::TaskListManager,
    },
    utils::{
        clock::{Clock, DefaultClock},
        dir::{create_application_default_path, create_application_path},
        logging::{enable_logging, LogSettings},
    },
    view::{html::HtmlView, terminal::TerminalView, DashboardView, TaskAction, ViewBindings},
};

#[derive(Parser, Debug)]
#[command(name = "Daybrief", version, long_about = None)]
#[command(about = "Daily greeting, today's tasks and deep work hours in one place", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Endpoint returning {\"daily_data\": [...]}. Defaults to DAYBRIEF_METRICS_URL set at build time"
    )]
    endpoint: Option<String>,
    #[arg(long, global = true, help = "Name used in the greeting")]
    name: Option<String>,
    #[arg(long, global = true, help = "Trace logging, echoed to stderr")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show greeting, tasks and deep work hours")]
    Show,
    #[command(about = "Add a task for today")]
    Add {
        #[arg(required = true, num_args = 1.., help = "Task text")]
        text: Vec<String>,
    },
    #[command(about = "Mark a task as done, or as not done if it already is")]
    Toggle {
        #[arg(help = "Row number as shown by `show`")]
        row: usize,
    },
    #[command(about = "Delete a task")]
    Remove {
        #[arg(help = "Row number as shown by `show`")]
        row: usize,
    },
    #[command(about = "Show only deep work hours")]
    Metrics,
    #[command(about = "Write the dashboard as an HTML page")]
    Export {
        #[arg(long, short, help = "Output file. Standard output is used if missing")]
        output: Option<PathBuf>,
    },
    #[command(about = "Keep the dashboard open and read commands from standard input")]
    Interactive,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .clone()
        .map_or_else(create_application_default_path, create_application_path)?;

    let log_settings = if args.log {
        LogSettings::verbose()
    } else {
        LogSettings::default()
    };
    enable_logging(&app_dir, &log_settings)?;
    info!("Using application directory {app_dir:?}");

    let storage = FileLocalStorage::new(&app_dir)?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let settings = DashboardSettings {
        name: args.name.clone(),
    };
    let endpoint = args
        .endpoint
        .clone()
        .or_else(|| DEFAULT_ENDPOINT.map(Into::into));
    let source: Arc<dyn MetricsSource> = Arc::new(MetricsFetcher::new(endpoint)?);

    match args.commands {
        Commands::Show => {
            let mut dashboard =
                Dashboard::open(storage, TerminalView::stdout(), clock, settings).await?;
            dashboard.refresh_metrics(source.as_ref()).await
        }
        Commands::Add { text } => {
            let mut dashboard = Dashboard::open(storage, quiet_view(), clock, settings).await?;
            dashboard.manager_mut().add(&text.join(" ")).await?;
            print_tasks(dashboard.manager())
        }
        Commands::Toggle { row } => {
            let mut dashboard = Dashboard::open(storage, quiet_view(), clock, settings).await?;
            let bindings = dashboard.manager().view().bindings();
            let action = resolve_row(bindings, row, ViewBindings::toggle)?;
            dashboard.manager_mut().apply(action).await?;
            print_tasks(dashboard.manager())
        }
        Commands::Remove { row } => {
            let mut dashboard = Dashboard::open(storage, quiet_view(), clock, settings).await?;
            let bindings = dashboard.manager().view().bindings();
            let action = resolve_row(bindings, row, ViewBindings::delete)?;
            dashboard.manager_mut().apply(action).await?;
            print_tasks(dashboard.manager())
        }
        Commands::Metrics => {
            let text = display_text(source.as_ref()).await;
            TerminalView::stdout().render_metric(&text)
        }
        Commands::Export { output } => {
            let mut dashboard = Dashboard::open(storage, HtmlView::new(), clock, settings).await?;
            dashboard.refresh_metrics(source.as_ref()).await?;
            let document = dashboard.manager().view().to_document();
            match output {
                Some(path) => {
                    tokio::fs::write(&path, document).await?;
                    info!("Dashboard written to {path:?}");
                }
                None => {
                    let mut stdout = std::io::stdout();
                    stdout.write_all(document.as_bytes())?;
                    stdout.flush()?;
                }
            }
            Ok(())
        }
        Commands::Interactive => {
            let shutdown = CancellationToken::new();
            tokio::spawn(detect_shutdown(shutdown.clone()));
            let mut dashboard =
                Dashboard::open(storage, TerminalView::stdout(), clock, settings).await?;
            let input = BufReader::new(tokio::io::stdin());
            let result = run_session(&mut dashboard, input, source, shutdown.clone()).await;
            shutdown.cancel();
            result
        }
    }
}

/// One-shot commands load the dashboard without drawing it, then print the final list once.
fn quiet_view() -> TerminalView<std::io::Sink> {
    TerminalView::new(std::io::sink(), false)
}

fn print_tasks<S: LocalStorage>(
    manager: &TaskListManager<S, TerminalView<std::io::Sink>>,
) -> Result<()> {
    let mut view = TerminalView::stdout();
    view.render_tasks(manager.tasks())?;
    view.render_stats(stats(manager.tasks()))
}

fn resolve_row(
    bindings: &ViewBindings,
    row: usize,
    action: impl Fn(&ViewBindings, usize) -> Option<TaskAction>,
) -> Result<TaskAction> {
    action(bindings, row).ok_or_else(|| {
        Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!(
                    "There is no task in row {row}, today's list has {} rows",
                    bindings.len()
                ),
            )
            .into()
    })
}
