use std::{
    future::Future,
    io::{ErrorKind, Write},
    pin::Pin,
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    dashboard::{
        metrics::{display_text, MetricsSource},
        Dashboard,
    },
    tasks::local_storage::LocalStorage,
    view::terminal::TerminalView,
};

const HELP: &str = "\
Commands:
  add <text>     add a task (a)
  toggle <row>   mark a task done or not done (x)
  remove <row>   delete a task (rm)
  list           draw the task list again (ls)
  refresh        fetch deep work hours again and redraw the greeting (r)
  help           show this message (?)
  quit           leave (q)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Add(String),
    Toggle(usize),
    Remove(usize),
    List,
    Refresh,
    Help,
    Quit,
}

/// Parses one input line. Blank lines are `None`.
pub fn parse_command(line: &str) -> Result<Option<SessionCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim()))
        .unwrap_or((line, ""));

    let command = match word.to_lowercase().as_str() {
        "add" | "a" => SessionCommand::Add(rest.to_owned()),
        "toggle" | "x" => SessionCommand::Toggle(parse_row(rest)?),
        "remove" | "rm" | "delete" => SessionCommand::Remove(parse_row(rest)?),
        "list" | "ls" => SessionCommand::List,
        "refresh" | "r" => SessionCommand::Refresh,
        "help" | "?" => SessionCommand::Help,
        "quit" | "q" | "exit" => SessionCommand::Quit,
        other => bail!("Unknown command `{other}`, type `help` for the list of commands"),
    };
    Ok(Some(command))
}

fn parse_row(value: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .with_context(|| format!("Expected a row number, got `{value}`"))
}

type MetricFuture = Pin<Box<dyn Future<Output = String> + Send>>;

fn fetch_metric(source: Arc<dyn MetricsSource>) -> MetricFuture {
    Box::pin(async move { display_text(source.as_ref()).await })
}

/// Reads commands from `input` until `quit`, end of input or `shutdown`. The metric request runs
/// alongside and is drawn whenever it completes.
pub async fn run_session<S: LocalStorage, W: Write>(
    dashboard: &mut Dashboard<S, TerminalView<W>>,
    input: impl AsyncBufRead + Unpin,
    source: Arc<dyn MetricsSource>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut lines = LinesStream::new(input.lines());
    let mut metric = fetch_metric(source.clone());
    let mut metric_done = false;

    println!("{HELP}");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Session interrupted");
                break;
            }
            text = &mut metric, if !metric_done => {
                metric_done = true;
                dashboard.show_metric(&text)?;
            }
            line = lines.next() => {
                let Some(line) = line else {
                    break;
                };
                let line = match line {
                    Ok(line) => line,
                    // The undecodable line is already consumed.
                    Err(e) if e.kind() == ErrorKind::InvalidData => {
                        error!("Unreadable input line {e:?}");
                        println!("Could not read that line: {e}");
                        continue;
                    }
                    Err(e) => {
                        error!("Input closed {e:?}");
                        break;
                    }
                };
                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                match command {
                    SessionCommand::Quit => break,
                    SessionCommand::Help => println!("{HELP}"),
                    SessionCommand::Refresh => {
                        metric = fetch_metric(source.clone());
                        metric_done = false;
                        dashboard.refresh_brief()?;
                    }
                    command => {
                        // A failed command never ends the session.
                        if let Err(e) = execute(dashboard, command).await {
                            error!("Command failed {e:?}");
                            println!("{e}");
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Runs a task command against the dashboard. Rows are resolved against the last drawn list.
pub async fn execute<S: LocalStorage, W: Write>(
    dashboard: &mut Dashboard<S, TerminalView<W>>,
    command: SessionCommand,
) -> Result<()> {
    let manager = dashboard.manager_mut();
    match command {
        SessionCommand::Add(text) => {
            manager.add(&text).await?;
        }
        SessionCommand::Toggle(row) => {
            let action = manager
                .view()
                .bindings()
                .toggle(row)
                .ok_or_else(|| anyhow!("No task in row {row}"))?;
            manager.apply(action).await?;
        }
        SessionCommand::Remove(row) => {
            let action = manager
                .view()
                .bindings()
                .delete(row)
                .ok_or_else(|| anyhow!("No task in row {row}"))?;
            manager.apply(action).await?;
        }
        SessionCommand::List => manager.redraw()?,
        SessionCommand::Refresh | SessionCommand::Help | SessionCommand::Quit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use anyhow::Result;
    use async_trait::async_trait;
    use tokio::io::{AsyncWriteExt, BufReader};
    use tokio_util::sync::CancellationToken;

    use crate::{
        dashboard::{
            metrics::{MetricValue, MetricsError, MetricsSource, MockMetricsSource},
            Dashboard, DashboardSettings,
        },
        tasks::local_storage::memory::MemoryStorage,
        utils::clock::test_clock::FixedClock,
        view::terminal::TerminalView,
    };

    use super::{execute, parse_command, run_session, SessionCommand};

    struct DelayedSource {
        inner: MockMetricsSource,
        delay: Duration,
    }

    #[async_trait]
    impl MetricsSource for DelayedSource {
        async fn latest(&self) -> Result<MetricValue, MetricsError> {
            tokio::time::sleep(self.delay).await;
            self.inner.latest().await
        }
    }

    #[test]
    fn test_parse_commands() -> Result<()> {
        assert_eq!(parse_command("")?, None);
        assert_eq!(parse_command("   ")?, None);
        assert_eq!(
            parse_command("add  buy   oat milk ")?,
            Some(SessionCommand::Add("buy   oat milk".into()))
        );
        assert_eq!(parse_command("a")?, Some(SessionCommand::Add("".into())));
        assert_eq!(parse_command("x 2")?, Some(SessionCommand::Toggle(2)));
        assert_eq!(parse_command("RM 1")?, Some(SessionCommand::Remove(1)));
        assert_eq!(parse_command("q")?, Some(SessionCommand::Quit));
        Ok(())
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_command("toggle").is_err());
        assert!(parse_command("toggle first").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[tokio::test]
    async fn test_execute_by_row() -> Result<()> {
        let storage = MemoryStorage::default();
        let mut dashboard = Dashboard::open(
            &storage,
            TerminalView::new(vec![], false),
            Arc::new(FixedClock::at(2018, 7, 4, 8)),
            DashboardSettings::default(),
        )
        .await?;

        execute(&mut dashboard, SessionCommand::Add("first".into())).await?;
        execute(&mut dashboard, SessionCommand::Add("second".into())).await?;
        execute(&mut dashboard, SessionCommand::Toggle(2)).await?;
        execute(&mut dashboard, SessionCommand::Remove(1)).await?;

        let tasks = dashboard.manager().tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "second");
        assert!(tasks[0].completed);

        assert!(execute(&mut dashboard, SessionCommand::Toggle(5)).await.is_err());
        assert!(execute(&mut dashboard, SessionCommand::Add("   ".into()))
            .await
            .is_ok());
        assert_eq!(dashboard.manager().tasks().len(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_keeps_input_flowing_while_metric_loads() -> Result<()> {
        let storage = MemoryStorage::default();
        let mut dashboard = Dashboard::open(
            &storage,
            TerminalView::new(vec![], false),
            Arc::new(FixedClock::at(2018, 7, 4, 8)),
            DashboardSettings::default(),
        )
        .await?;

        let mut inner = MockMetricsSource::new();
        inner
            .expect_latest()
            .times(1)
            .returning(|| Ok(MetricValue::Number(3.25)));
        let source = Arc::new(DelayedSource {
            inner,
            delay: Duration::from_secs(5),
        });

        let (mut client, server) = tokio::io::duplex(1024);
        client
            .write_all(b"add first\n\xff\xfe\nbogus\nadd second\nx 1\n")
            .await?;

        let (result, written) = tokio::join!(
            run_session(
                &mut dashboard,
                BufReader::new(server),
                source,
                CancellationToken::new()
            ),
            async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                client.write_all(b"quit\n").await
            }
        );
        result?;
        written?;

        let tasks = dashboard.manager().tasks();
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].completed);
        assert_eq!(tasks[1].text, "second");

        let output = String::from_utf8(dashboard.manager().view().get_ref().clone())?;
        let toggled = output.rfind("[x] first").unwrap();
        let metric = output.find("Deep work: 3.3 hrs").unwrap();
        assert!(toggled < metric);
        Ok(())
    }

    #[tokio::test]
    async fn test_session_ends_with_input() -> Result<()> {
        let storage = MemoryStorage::default();
        let mut dashboard = Dashboard::open(
            &storage,
            TerminalView::new(vec![], false),
            Arc::new(FixedClock::at(2018, 7, 4, 8)),
            DashboardSettings::default(),
        )
        .await?;
        let source = Arc::new(DelayedSource {
            inner: MockMetricsSource::new(),
            delay: Duration::from_secs(3600),
        });

        let input: &[u8] = b"a water plants\nrm 3\n";
        run_session(&mut dashboard, input, source, CancellationToken::new()).await?;

        assert_eq!(dashboard.manager().tasks().len(), 1);
        let output = String::from_utf8(dashboard.manager().view().get_ref().clone())?;
        assert!(!output.contains("Deep work:"));
        Ok(())
    }
}
