//! Replays a recorded agent session in the terminal.

#[macro_use]
extern crate tracing;

use std::process::ExitCode;

use agent_progress::core::DispatcherBuilder;
use agent_progress::source::EventSource;
use agent_progress::{ConsoleDisplay, ReplayConfig};
use tokio::fs::File;
use tokio::io::{self, AsyncRead};
use tokio::select;
use tokio::signal;
use tokio::time::sleep;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match ReplayConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    debug!("replaying with {config:?}");

    let reader: Box<dyn AsyncRead + Unpin> = match &config.input {
        Some(path) => match File::open(path).await {
            Ok(file) => Box::new(file),
            Err(err) => {
                eprintln!("cannot open {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(io::stdin()),
    };
    let mut source = EventSource::new(reader, config.format);

    let mut dispatcher =
        DispatcherBuilder::with_display(ConsoleDisplay::new(config.console))
            .on_complete(|invocation| {
                info!(
                    "{} ({}) finished as {:?} after {:?}",
                    invocation.name,
                    invocation.id,
                    invocation.status,
                    invocation.elapsed
                );
            })
            .build();

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let exit_code = loop {
        let event = select! {
            event = source.next_event() => event,
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break ExitCode::from(130);
            }
        };
        let event = match event {
            Ok(Some(event)) => event,
            Ok(None) => break ExitCode::SUCCESS,
            Err(err) => {
                error!("error reading events: {err}");
                break ExitCode::FAILURE;
            }
        };

        if let Err(err) = dispatcher.handle(&event) {
            error!("cannot write to the terminal: {err}");
            break ExitCode::FAILURE;
        }

        if !config.delay.is_zero() {
            select! {
                _ = sleep(config.delay) => {}
                _ = &mut ctrl_c => {
                    debug!("interrupted");
                    break ExitCode::from(130);
                }
            }
        }
    };

    if source.skipped() > 0 {
        warn!("skipped {} malformed events", source.skipped());
    }
    // Dropping the display clears a spinner that is still running.
    drop(dispatcher.into_display());
    exit_code
}
