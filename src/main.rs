use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use yah3c_lib::config::{Config, PartialConfig};
use yah3c_lib::lifecycle::{DEFAULT_DAEMON_LOG, ProcessLifecycle};
use yah3c_lib::transport::RawTransport;
use yah3c_lib::{CancelToken, ChallengeMode, H3cError, Session};

/// 802.1X / H3C EAP authentication client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file; command-line options override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Network interface to authenticate on.
    #[arg(short, long)]
    interface: Option<String>,

    #[arg(short, long)]
    username: Option<String>,

    #[arg(short, long)]
    password: Option<String>,

    /// MD5-Challenge response algorithm: hashed (md5) or xor.
    #[arg(short, long)]
    mode: Option<ChallengeMode>,

    /// Command run with the interface name after authentication succeeds.
    #[arg(long)]
    dhcp_command: Option<String>,

    /// Detach from the terminal after authentication succeeds.
    #[arg(short, long, overrides_with = "no_daemon")]
    daemon: bool,

    /// Stay in the foreground even if the configuration file enables daemon mode.
    #[arg(long, overrides_with = "daemon")]
    no_daemon: bool,

    /// Where stdout/stderr go once detached.
    #[arg(long, default_value = DEFAULT_DAEMON_LOG)]
    daemon_log: PathBuf,

    /// Write log output to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

impl Cli {
    fn overrides(&self) -> PartialConfig {
        PartialConfig {
            interface: self.interface.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            challenge_mode: self.mode,
            dhcp_command: self.dhcp_command.clone(),
            daemon: match (self.daemon, self.no_daemon) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialize logging: {:?}", e);
        std::process::exit(1);
    }

    match run(cli) {
        Ok(()) => info!("Session ended"),
        Err(e) => {
            match e.downcast_ref::<H3cError>() {
                Some(H3cError::ProtocolFailure { after_logoff: true }) => info!("Logged off"),
                _ => error!("{:#}", e),
            }
            std::process::exit(1);
        }
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(cli.verbose.tracing_level_filter().into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match &cli.log_file {
        Some(path) => {
            let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(".".as_ref());
            let name = path.file_name().context("Log file path has no file name")?;
            let appender = tracing_appender::rolling::never(dir, name);
            builder.with_ansi(false).with_writer(appender).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let file_config = match &cli.config {
        Some(path) => PartialConfig::load(path).context("Failed to load configuration")?,
        None => PartialConfig::default(),
    };
    let config = Config::try_from(file_config.merge(cli.overrides()))?;
    let credentials = config.credentials()?;
    info!(
        interface = %config.interface,
        user = %credentials.display_username(),
        mode = %config.challenge_mode,
        "Starting authentication"
    );

    let cancel = CancelToken::new();
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, cancel.flag()).context("Failed to install signal handler")?;
    }

    let transport = RawTransport::bind(&config.interface)
        .with_context(|| format!("Failed to open raw socket on {}", config.interface))?;
    let local_addr = transport.local_addr();
    let lifecycle = ProcessLifecycle::new(cli.daemon_log);

    let mut session = Session::new(transport, lifecycle, credentials, local_addr, config.session_options());
    session.run(&cancel)?;
    Ok(())
}
