mod cli;
mod console;
mod logging;
mod settings;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{error, info};
use tokio_util::sync::CancellationToken;

use ocup_core::{
    ConsoleOutput, ReleaseFeed, UpdateError, UpdateOptions, UpdateOutcome, Updater,
    UpdaterConfig, build_client,
};

use crate::cli::Cli;
use crate::settings::AppSettings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = AppSettings::load();

    logging::init_logging(
        cli.verbose || settings.debug_logging,
        settings.max_log_size_bytes,
    );
    info!("ocup {} starting", env!("CARGO_PKG_VERSION"));

    let console = console::select_console(cli.quiet);

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            ctrl_c_token.cancel();
        }
    });

    match run(&cli, &settings, Arc::clone(&console), &cancel).await {
        Ok(outcome) => {
            info!("Finished: {outcome:?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Update failed: {err}");
            console.error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(
    cli: &Cli,
    settings: &AppSettings,
    console: Arc<dyn ConsoleOutput>,
    cancel: &CancellationToken,
) -> Result<UpdateOutcome, UpdateError> {
    let client = build_client(settings.http_timeouts())?;
    let feed = ReleaseFeed::new(client.clone(), settings.repo.clone());
    let config = UpdaterConfig {
        binary_name: settings.binary_name.clone(),
        platform_pattern: ocup_platform::platform_pattern(),
        version_timeout: Duration::from_secs(settings.version_timeout_secs),
        extract_timeout: Duration::from_secs(settings.extract_timeout_secs),
    };
    let options = UpdateOptions {
        force: cli.force,
        skip_release_notes: cli.skip_notes,
        custom_path: cli.path.clone().or_else(|| settings.install_dir.clone()),
    };

    Updater::new(client, feed, config, console)
        .run(&options, cancel)
        .await
}
