// # freenomd - Free Domain Renewal Daemon
//
// Thin integration layer over freenom-core: session logic, retries and page
// parsing all live in the library.
//
// The freenomd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Logging in and renewing free domains on a fixed interval
// 4. Shutting down cleanly on SIGTERM/SIGINT
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `FREENOM_USERNAME`: Account e-mail (required)
// - `FREENOM_PASSWORD`: Account password (required)
// - `FREENOM_RENEW_DOMAIN`: Only renew this domain (optional, default: all)
// - `FREENOM_RENEW_MONTHS`: Renewal period in months, 1-12 (default: 12)
// - `FREENOM_CHECK_INTERVAL_SECS`: Seconds between runs (default: 86400)
// - `FREENOM_BASE_URL`: Console root (default: https://my.freenom.com/)
// - `FREENOM_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export FREENOM_USERNAME=jane@example.com
// export FREENOM_PASSWORD=secret
// export FREENOM_RENEW_MONTHS=12
//
// freenomd
// ```

use anyhow::{Context, Result};
use freenom_core::{Credentials, SessionConfig, SessionEngine};
use freenom_http::ReqwestTransport;
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (login failure, unexpected failure)
#[derive(Debug, Clone, Copy)]
enum FreenomExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<FreenomExitCode> for ExitCode {
    fn from(code: FreenomExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    credentials: Credentials,
    renew_domain: Option<String>,
    renew_months: u32,
    check_interval_secs: u64,
    base_url: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let username = lookup("FREENOM_USERNAME").unwrap_or_default();
        let password = lookup("FREENOM_PASSWORD").unwrap_or_default();

        Ok(Self {
            credentials: Credentials::new(username.trim(), password),
            renew_domain: lookup("FREENOM_RENEW_DOMAIN")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            renew_months: match lookup("FREENOM_RENEW_MONTHS") {
                Some(s) => s
                    .trim()
                    .parse()
                    .with_context(|| format!("FREENOM_RENEW_MONTHS is not a number: {s}"))?,
                None => 12,
            },
            check_interval_secs: match lookup("FREENOM_CHECK_INTERVAL_SECS") {
                Some(s) => s.trim().parse().with_context(|| {
                    format!("FREENOM_CHECK_INTERVAL_SECS is not a number: {s}")
                })?,
                None => 86_400,
            },
            base_url: lookup("FREENOM_BASE_URL").filter(|s| !s.trim().is_empty()),
            log_level: lookup("FREENOM_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.credentials.username.is_empty() {
            anyhow::bail!(
                "FREENOM_USERNAME is required. \
                Set it via: export FREENOM_USERNAME=you@example.com"
            );
        }

        if self.credentials.password.is_empty() {
            anyhow::bail!(
                "FREENOM_PASSWORD is required. \
                Set it via: export FREENOM_PASSWORD=your_password"
            );
        }

        if !(1..=12).contains(&self.renew_months) {
            anyhow::bail!(
                "FREENOM_RENEW_MONTHS must be between 1 and 12. Got: {}",
                self.renew_months
            );
        }

        if !(60..=7 * 86_400).contains(&self.check_interval_secs) {
            anyhow::bail!(
                "FREENOM_CHECK_INTERVAL_SECS must be between 60 and 604800 seconds. Got: {}",
                self.check_interval_secs
            );
        }

        self.session_config()
            .validate()
            .context("FREENOM_BASE_URL is not valid")?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "FREENOM_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn session_config(&self) -> SessionConfig {
        match &self.base_url {
            Some(url) => SessionConfig::default().with_base_url(url.trim()),
            None => SessionConfig::default(),
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return FreenomExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return FreenomExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return FreenomExitCode::ConfigError.into();
    }

    info!("Starting freenomd daemon");
    info!(
        "Renewing {} for {} month(s), checking every {}s",
        config.renew_domain.as_deref().unwrap_or("all free domains"),
        config.renew_months,
        config.check_interval_secs
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return FreenomExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            FreenomExitCode::RuntimeError
        } else {
            FreenomExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal or a failed login
async fn run_daemon(config: Config) -> Result<()> {
    let session_config = config.session_config();
    let transport =
        ReqwestTransport::new(&session_config).context("Failed to create HTTP transport")?;
    let mut engine = SessionEngine::new(Box::new(transport), session_config)?;
    let interval = Duration::from_secs(config.check_interval_secs);

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = run_once(&mut engine, &config) => result?,
            signal = &mut shutdown => {
                info!("Received shutdown signal: {}", signal?);
                return Ok(());
            }
        }

        info!("Next check in {}s", interval.as_secs());

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            signal = &mut shutdown => {
                info!("Received shutdown signal: {}", signal?);
                info!("Shutting down daemon");
                return Ok(());
            }
        }
    }
}

/// One login + renewal pass
///
/// A failed login ends the daemon; a failed renewal is logged and retried on
/// the next pass.
async fn run_once(engine: &mut SessionEngine, config: &Config) -> Result<()> {
    engine
        .login(&config.credentials.username, &config.credentials.password)
        .await
        .context("Login failed")?;

    match engine
        .renew_free_domains(config.renew_domain.as_deref(), config.renew_months)
        .await
    {
        Ok(outcomes) if outcomes.is_empty() => info!("No domains listed for renewal"),
        Ok(outcomes) => {
            for (domain, outcome) in &outcomes {
                info!("{}: {}", domain, outcome);
            }
        }
        Err(freenom_core::Error::RenewalAborted { completed, source }) => {
            for (domain, outcome) in &completed {
                info!("{}: {}", domain, outcome);
            }
            warn!("Renewal aborted: {}", source);
        }
        Err(e) => warn!("Renewal failed: {}", e),
    }

    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(received)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
