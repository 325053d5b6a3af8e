//! fixdist Node - run one distance session from the command line
//!
//! This binary wires a simulated host to a `DistanceSession`:
//! - a static position source that reports the fix given on the command line
//! - a consent gate that grants or denies location access
//! - a console presenter that prints the outcome
//!
//! Ctrl-C cancels a session that is still waiting.

use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use fixdist_core::GeoPoint;
use fixdist_session::{
    DistanceSession, FixOutcome, PermissionGate, PermissionRequest, PermissionResponse,
    PositionSource, Presenter, ProviderEvent, SessionConfig, SessionState,
};

#[derive(Parser, Debug)]
#[command(name = "fixdist-node")]
#[command(about = "Measure the distance from a position fix to a reference point")]
struct Args {
    /// Longitude of the simulated fix (degrees east)
    #[arg(long, allow_negative_numbers = true, requires = "fix_lat")]
    fix_lon: Option<f64>,

    /// Latitude of the simulated fix (degrees north)
    #[arg(long, allow_negative_numbers = true, requires = "fix_lon")]
    fix_lat: Option<f64>,

    /// Reference longitude, overriding the configuration
    #[arg(long, allow_negative_numbers = true, requires = "ref_lat")]
    ref_lon: Option<f64>,

    /// Reference latitude, overriding the configuration
    #[arg(long, allow_negative_numbers = true, requires = "ref_lon")]
    ref_lat: Option<f64>,

    /// JSON configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Limit on the wait for a fix, e.g. "30s" or "2m"
    #[arg(long)]
    timeout: Option<humantime::Duration>,

    /// Answer the permission request with a denial
    #[arg(long)]
    deny_permission: bool,

    /// Simulate a host without a positioning provider
    #[arg(long, conflicts_with_all = ["fix_lon", "fix_lat"])]
    no_provider: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,
}

/// Position source that reports one fixed position
struct StaticPositionSource {
    fix: Option<GeoPoint>,
}

#[async_trait]
impl PositionSource for StaticPositionSource {
    async fn request_single(&self, provider: &str) -> FixOutcome {
        match self.fix {
            Some(point) => {
                debug!("Provider {} reporting {}", provider, point);
                FixOutcome::Fix(point)
            }
            None => FixOutcome::ProviderUnavailable,
        }
    }

    fn release(&self, provider: &str) {
        debug!("Provider {} released", provider);
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Permission gate with a preset answer
struct ConsentGate {
    grant: bool,
}

#[async_trait]
impl PermissionGate for ConsentGate {
    async fn request(&self, request: &PermissionRequest) -> PermissionResponse {
        info!("Requesting {}", request.permission);
        if self.grant {
            request.grant()
        } else {
            request.deny()
        }
    }
}

/// Prints outcomes to the terminal
struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn show(&self, title: &str, message: &str, is_error: bool) {
        if is_error {
            eprintln!("{}: {}", title, message);
        } else {
            println!("{}: {}", title, message);
        }
    }

    fn state_changed(&self, state: &SessionState) {
        debug!("Session {}", state);
    }
}

/// Configuration file plus command-line overrides
fn build_config(args: &Args) -> anyhow::Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            SessionConfig::load(path)?
        }
        None => SessionConfig::default(),
    };

    if let (Some(lon), Some(lat)) = (args.ref_lon, args.ref_lat) {
        config.reference = GeoPoint::new(lon, lat)?;
    }
    if let Some(timeout) = &args.timeout {
        config.fix_timeout = Some(**timeout);
    }

    config.validate()?;
    Ok(config)
}

/// The simulated fix, if the host has a provider
fn simulated_fix(args: &Args) -> anyhow::Result<Option<GeoPoint>> {
    if args.no_provider {
        return Ok(None);
    }
    match (args.fix_lon, args.fix_lat) {
        (Some(lon), Some(lat)) => Ok(Some(GeoPoint::new(lon, lat)?)),
        _ => anyhow::bail!("--fix-lon and --fix-lat are required unless --no-provider is set"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = build_config(&args)?;
    let fix = simulated_fix(&args)?;
    let provider = config.provider.clone();

    info!("Starting fixdist node v{}", fixdist_session::VERSION);
    info!("Reference point: {}", config.reference);

    let session = DistanceSession::new(
        config,
        Arc::new(ConsentGate {
            grant: !args.deny_permission,
        }),
        Arc::new(StaticPositionSource { fix }),
        Arc::new(ConsolePresenter),
    );

    let event = if fix.is_some() {
        ProviderEvent::Enabled { provider }
    } else {
        ProviderEvent::Disabled { provider }
    };
    session.on_provider_event(&event);

    // Cancel on Ctrl-C
    let handle = session.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() && handle.cancel() {
            warn!("Interrupted, session cancelled");
        }
    });

    let report = session.gesture().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    if report.distance.is_approximate() {
        warn!("Distance is a spherical approximation");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("fixdist-node").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_negative_coordinates() {
        let args = parse(&["--fix-lon", "-0.1276", "--fix-lat", "51.5074"]);
        assert_eq!(args.fix_lon, Some(-0.1276));
        assert_eq!(
            simulated_fix(&args).unwrap(),
            Some(GeoPoint::new(-0.1276, 51.5074).unwrap())
        );
    }

    #[test]
    fn test_fix_coordinates_come_in_pairs() {
        let result = Args::try_parse_from(["fixdist-node", "--fix-lon", "8.42"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_provider_conflicts_with_fix() {
        let result = Args::try_parse_from([
            "fixdist-node",
            "--no-provider",
            "--fix-lon",
            "8.42",
            "--fix-lat",
            "49.0",
        ]);
        assert!(result.is_err());

        let args = parse(&["--no-provider"]);
        assert_eq!(simulated_fix(&args).unwrap(), None);
    }

    #[test]
    fn test_missing_fix_is_an_error() {
        assert!(simulated_fix(&parse(&[])).is_err());
    }

    #[test]
    fn test_config_overrides() {
        let args = parse(&["--ref-lon", "13.405", "--ref-lat", "52.52", "--timeout", "2m"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.reference, GeoPoint::new(13.405, 52.52).unwrap());
        assert_eq!(config.fix_timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_config_rejects_bad_reference() {
        let args = parse(&["--ref-lon", "200", "--ref-lat", "0"]);
        assert!(build_config(&args).is_err());
    }

    #[tokio::test]
    async fn test_simulated_host_session() {
        let session = DistanceSession::new(
            SessionConfig::default(),
            Arc::new(ConsentGate { grant: true }),
            Arc::new(StaticPositionSource {
                fix: Some(GeoPoint::new(13.405, 52.52).unwrap()),
            }),
            Arc::new(ConsolePresenter),
        );

        let report = session.gesture().await.unwrap();
        assert_eq!(report.displayed_km, 525);
    }

    #[tokio::test]
    async fn test_denied_session_fails() {
        let session = DistanceSession::new(
            SessionConfig::default(),
            Arc::new(ConsentGate { grant: false }),
            Arc::new(StaticPositionSource { fix: None }),
            Arc::new(ConsolePresenter),
        );

        assert!(session.gesture().await.is_err());
        assert_eq!(session.gesture().await.unwrap_err().error_code(), "PERMISSION_DENIED");
    }
}
