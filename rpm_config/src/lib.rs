#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the RPM compensation controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; missing keys fall back to the field-tested
//!   dashboard defaults.
use serde::Deserialize;

/// Longest manual-override window accepted from a config file.
pub const MAX_OVERRIDE_WINDOW_MS: u64 = 60_000;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControllerCfg {
    /// Readings within ±this many RPM of the previous one count as consistent.
    pub consistency_tolerance: u32,
    /// A decrease of at least this many RPM between readings triggers compensation.
    pub drop_threshold: u32,
    /// Percent added to the setpoint on every compensation boost.
    pub compensation_increment: u8,
    /// Consecutive consistent readings required before reverting a boost.
    pub consistent_readings_target: u32,
    /// Grace window after an operator speed change (ms).
    pub manual_override_window_ms: u64,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            consistency_tolerance: 30,
            drop_threshold: 50,
            compensation_increment: 10,
            consistent_readings_target: 3,
            manual_override_window_ms: 1500,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TelemetryCfg {
    /// Prefix marking an RPM report, e.g. "RPM" for "RPM1200".
    pub prefix: String,
    /// How long the telemetry pump waits for a line before re-checking shutdown (ms).
    /// Also accepts alias "timeout_ms".
    #[serde(alias = "timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for TelemetryCfg {
    fn default() -> Self {
        Self {
            prefix: "RPM".to_string(),
            read_timeout_ms: 200,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LinkCfg {
    /// Serial device node (e.g. /dev/rfcomm0, /dev/ttyUSB0)
    pub device: Option<String>,
    /// TCP serial bridge address (host:port), used when `device` is absent
    pub tcp: Option<String>,
    /// Optional write timeout for TCP bridges (ms); 0 or absent means blocking writes
    pub write_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Simulated peripheral used by `simulate` and by tests.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimCfg {
    /// RPM produced at 100% speed with no load.
    pub max_rpm: u32,
    /// Peak-to-peak jitter added to every reading.
    pub jitter_rpm: u32,
    /// Most the rotor speed changes per sample while following the setpoint.
    pub slew_rpm: u32,
    /// RPM lost while the scripted load is applied.
    pub load_drop_rpm: u32,
    /// Sample index at which the load is applied.
    pub load_after_samples: u32,
    /// Number of samples the load stays applied (0 = forever).
    pub load_for_samples: u32,
    /// Close the simulated link after this many samples (0 = never).
    pub close_after_samples: u32,
    /// Telemetry period (ms).
    pub sample_period_ms: u64,
    /// Seed for the jitter generator.
    pub seed: u32,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            max_rpm: 3500,
            jitter_rpm: 10,
            slew_rpm: 30,
            load_drop_rpm: 120,
            load_after_samples: 80,
            load_for_samples: 8,
            close_after_samples: 0,
            sample_period_ms: 100,
            seed: 0x00C0_FFEE,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerCfg,
    pub telemetry: TelemetryCfg,
    pub link: LinkCfg,
    pub logging: Logging,
    pub sim: SimCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file. Validation is left to the caller.
pub fn load_path(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Controller
        let c = &self.controller;
        if c.drop_threshold == 0 {
            eyre::bail!("controller.drop_threshold must be >= 1");
        }
        if c.compensation_increment == 0 || c.compensation_increment > 100 {
            eyre::bail!("controller.compensation_increment must be in [1, 100]");
        }
        if c.consistent_readings_target == 0 {
            eyre::bail!("controller.consistent_readings_target must be >= 1");
        }
        if c.manual_override_window_ms > MAX_OVERRIDE_WINDOW_MS {
            eyre::bail!("controller.manual_override_window_ms is unreasonably large (>60s)");
        }

        // Telemetry
        let prefix = &self.telemetry.prefix;
        if prefix.is_empty() {
            eyre::bail!("telemetry.prefix must not be empty");
        }
        if !prefix
            .chars()
            .all(|ch| ch.is_ascii_graphic() && !ch.is_ascii_digit())
        {
            eyre::bail!("telemetry.prefix must be printable ASCII without digits or whitespace");
        }
        if self.telemetry.read_timeout_ms == 0 {
            eyre::bail!("telemetry.read_timeout_ms must be >= 1");
        }

        // Link
        if let Some(dev) = &self.link.device
            && dev.trim().is_empty()
        {
            eyre::bail!("link.device must not be empty when set");
        }
        if let Some(addr) = &self.link.tcp
            && !addr.contains(':')
        {
            eyre::bail!("link.tcp must be host:port");
        }

        // Logging
        if let Some(rot) = &self.logging.rotation
            && !matches!(rot.as_str(), "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Sim
        if self.sim.max_rpm == 0 {
            eyre::bail!("sim.max_rpm must be > 0");
        }
        if self.sim.slew_rpm == 0 {
            eyre::bail!("sim.slew_rpm must be >= 1");
        }
        if self.sim.sample_period_ms == 0 {
            eyre::bail!("sim.sample_period_ms must be >= 1");
        }

        Ok(())
    }
}
