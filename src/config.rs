//! Configuration loading for random-directions.
//!
//! Everything is read from the environment and every setting has a default, so an
//! empty environment yields a working configuration.

use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;

use crate::error::{DirectionsError, Result};

pub const TARGET_FILE_NAME: &str = "directions.vec";
pub const LOG_FILE_NAME: &str = "directions.log";

/// Slowest accepted `DIRECTIONS_TIME_SPEEDUP`.
pub const MIN_TIME_SPEEDUP: f64 = 1.0e-3;

/// Upper bound for any scheduled delay (one year).
const MAX_SCALED: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Main configuration structure
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Reuse the persisted target on startup (`NORESUME` turns this off)
    pub resume: bool,

    /// Mirror debug diagnostics to stderr (`DEBUG`)
    pub verbose: bool,

    /// Holds the target file and the log file (`DIRECTIONS_CACHE_DIR`)
    pub cache_dir: PathBuf,

    /// Sensor feed listen address (`DIRECTIONS_LISTEN`)
    pub listen_addr: String,

    pub sensors: SensorNames,

    pub navigator: NavigatorConfig,
}

/// Keys the sensor feed uses for each reading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SensorNames {
    /// `DIRECTIONS_GRAVITY_SENSOR`
    pub gravity: String,
    /// `DIRECTIONS_MAGNETOMETER_SENSOR`
    pub magnetometer: String,
}

impl Default for SensorNames {
    fn default() -> Self {
        Self {
            gravity: default_gravity_sensor(),
            magnetometer: default_magnetometer_sensor(),
        }
    }
}

/// An inclusive range of seconds to draw random delays from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SecondsRange {
    pub min: f64,
    pub max: f64,
}

impl SecondsRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A degenerate range that always yields `seconds`.
    pub const fn fixed(seconds: f64) -> Self {
        Self::new(seconds, seconds)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max <= self.min {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

/// Scheduler timing, all in seconds of (unscaled) wall time.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigatorConfig {
    /// Pause between the start announcement and the first action
    pub start_delay: SecondsRange,

    /// Pause between announcing an action and the first poll
    pub action_initial_delay: SecondsRange,

    /// How long an action may be polled before it is considered over
    pub action_timeout: SecondsRange,

    pub poll_interval: f64,

    /// Length of one highway segment
    pub highway_duration: SecondsRange,

    /// Every duration is divided by this (`DIRECTIONS_TIME_SPEEDUP`)
    pub time_speedup: f64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            start_delay: SecondsRange::new(10.0, 30.0),
            action_initial_delay: SecondsRange::new(5.0, 10.0),
            action_timeout: SecondsRange::new(60.0, 150.0),
            poll_interval: 1.0,
            highway_duration: SecondsRange::new(200.0, 600.0),
            time_speedup: 1.0,
        }
    }
}

impl NavigatorConfig {
    /// Converts configured seconds into a real-time duration, saturating at one year.
    pub fn scaled(&self, seconds: f64) -> Duration {
        let secs = (seconds / self.time_speedup).max(0.0);
        Duration::try_from_secs_f64(secs).map_or(MAX_SCALED, |d| d.min(MAX_SCALED))
    }
}

// Default value functions
fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache")
}
fn default_listen_addr() -> String {
    "0.0.0.0:9001".to_string()
}
fn default_gravity_sensor() -> String {
    "Gravity".to_string()
}
fn default_magnetometer_sensor() -> String {
    "Magnetometer".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resume: true,
            verbose: false,
            cache_dir: default_cache_dir(),
            listen_addr: default_listen_addr(),
            sensors: SensorNames::default(),
            navigator: NavigatorConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Flags count as set when present and non-empty.
        let flag = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());

        let mut config = Config {
            resume: !flag("NORESUME"),
            verbose: flag("DEBUG"),
            ..Config::default()
        };

        if let Some(dir) = lookup("DIRECTIONS_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(addr) = lookup("DIRECTIONS_LISTEN") {
            config.listen_addr = addr;
        }
        if let Some(name) = lookup("DIRECTIONS_GRAVITY_SENSOR") {
            config.sensors.gravity = name;
        }
        if let Some(name) = lookup("DIRECTIONS_MAGNETOMETER_SENSOR") {
            config.sensors.magnetometer = name;
        }
        if let Some(raw) = lookup("DIRECTIONS_TIME_SPEEDUP") {
            let speedup: f64 = raw.trim().parse().map_err(|e| {
                DirectionsError::Config(format!("DIRECTIONS_TIME_SPEEDUP={raw:?}: {e}"))
            })?;
            if !speedup.is_finite() || speedup < MIN_TIME_SPEEDUP {
                return Err(DirectionsError::Config(format!(
                    "DIRECTIONS_TIME_SPEEDUP must be finite and at least {MIN_TIME_SPEEDUP}, \
                     got {speedup}"
                )));
            }
            config.navigator.time_speedup = speedup;
        }

        Ok(config)
    }

    pub fn target_path(&self) -> PathBuf {
        self.cache_dir.join(TARGET_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.cache_dir.join(LOG_FILE_NAME)
    }
}
