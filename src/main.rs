use std::fs::{self, OpenOptions};
use std::io;
use std::process::ExitCode;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use random_directions::fusion::SensorFusion;
use random_directions::navigator::forward_lines;
use random_directions::output::StdioSink;
use random_directions::server::SensorServer;
use random_directions::target::TargetStore;
use random_directions::{Config, Navigator, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("directions: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "directions failed");
            eprintln!("directions: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    fs::create_dir_all(&config.cache_dir)?;
    init_logging(&config)?;
    tracing::info!("Directions starting...");

    let target = TargetStore::open(config.target_path(), config.resume)?;
    let (fusion, headings) = SensorFusion::new();
    let server = SensorServer::new(config.listen_addr.clone(), config.sensors.clone(), fusion);
    let navigator = Navigator::new(
        config.navigator.clone(),
        headings,
        target,
        StdioSink,
        StdRng::from_entropy(),
    );

    let (tx, rx) = mpsc::channel(16);
    spawn_command_reader(tx);

    tokio::select! {
        result = server.run() => result,
        result = navigator.run(rx) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            Ok(())
        }
    }
}

/// Forwards stdin lines to the navigator; EOF closes the channel.
///
/// Runs on a plain thread so a pending read never holds up runtime shutdown.
fn spawn_command_reader(tx: mpsc::Sender<String>) {
    std::thread::spawn(move || {
        if let Err(e) = forward_lines(io::stdin().lock(), &tx) {
            tracing::warn!(error = %e, "failed to read command");
        }
    });
}

/// Logs to `directions.log` in the cache dir, plus stderr at debug level when verbose.
fn init_logging(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())?;

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(EnvFilter::new("info"));

    let stderr_layer = config.verbose.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_filter(EnvFilter::new("debug"))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}
