use std::path::PathBuf;

use label_engine::{ActorId, ConfigError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config_file::{load_label_config, ConfigFileError};
use super::host_session::HostSession;
use super::roster::{AccessRoster, RosterError};

const CONFIG_PATH_ENV_VAR: &str = "LABELS_CONFIG";
const ROSTER_PATH_ENV_VAR: &str = "LABELS_ROSTER";
const OPERATORS_ENV_VAR: &str = "LABELS_OPERATORS";
const DEMO_TICKS_ENV_VAR: &str = "LABELS_DEMO_TICKS";

const DEFAULT_CONFIG_PATH: &str = "labels.json";
const DEFAULT_ROSTER_PATH: &str = "labels_roster.json";
const DEFAULT_OPERATORS: &[ActorId] = &[ActorId(1)];
const DEFAULT_DEMO_TICKS: u64 = 200;

#[derive(Debug, Error)]
pub(crate) enum HostError {
    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("invalid label config: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HostSettings {
    config_path: PathBuf,
    roster_path: PathBuf,
    operators: Vec<ActorId>,
    demo_ticks: u64,
}

impl HostSettings {
    fn from_env() -> Self {
        Self::from_raw(
            std::env::var(CONFIG_PATH_ENV_VAR).ok().as_deref(),
            std::env::var(ROSTER_PATH_ENV_VAR).ok().as_deref(),
            std::env::var(OPERATORS_ENV_VAR).ok().as_deref(),
            std::env::var(DEMO_TICKS_ENV_VAR).ok().as_deref(),
        )
    }

    fn from_raw(
        config: Option<&str>,
        roster: Option<&str>,
        operators: Option<&str>,
        demo_ticks: Option<&str>,
    ) -> Self {
        Self {
            config_path: path_or_default(config, DEFAULT_CONFIG_PATH),
            roster_path: path_or_default(roster, DEFAULT_ROSTER_PATH),
            operators: parse_operators(operators),
            demo_ticks: parse_demo_ticks(demo_ticks),
        }
    }
}

pub(crate) struct AppWiring {
    pub(crate) session: HostSession,
    pub(crate) demo_ticks: u64,
}

pub(crate) fn build_app() -> Result<AppWiring, HostError> {
    init_tracing();
    info!("=== Label Host Startup ===");
    build_wiring(&HostSettings::from_env())
}

/// Loads config and roster from the settings' paths and starts a session on them.
fn build_wiring(settings: &HostSettings) -> Result<AppWiring, HostError> {
    let config = load_label_config(&settings.config_path)?;
    let mut roster = AccessRoster::load(&settings.roster_path)?;
    roster.seed_operators(settings.operators.iter().copied())?;

    let mut session = HostSession::new(config, roster)?;
    session.start();
    info!(
        config = %settings.config_path.display(),
        roster = %settings.roster_path.display(),
        operators = settings.operators.len(),
        demo_ticks = settings.demo_ticks,
        "label_host_configured"
    );

    Ok(AppWiring {
        session,
        demo_ticks: settings.demo_ticks,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn path_or_default(raw: Option<&str>, default: &str) -> PathBuf {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
        .into()
}

/// Comma-separated actor ids. Unset falls back to the demo operator; entries that are not
/// integers are skipped.
fn parse_operators(raw: Option<&str>) -> Vec<ActorId> {
    let Some(raw) = raw else {
        return DEFAULT_OPERATORS.to_vec();
    };
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| entry.parse::<u64>().ok())
        .map(ActorId)
        .collect()
}

fn parse_demo_ticks(raw: Option<&str>) -> u64 {
    match raw.and_then(|value| value.trim().parse::<u64>().ok()) {
        Some(ticks) => ticks,
        None => DEFAULT_DEMO_TICKS,
    }
}
