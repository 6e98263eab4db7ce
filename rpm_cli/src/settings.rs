//! Effective configuration: config file, then CLI overrides, then validation.

use std::path::Path;

use rpm_core::ControlError;

use crate::cli::{Cli, DEFAULT_CONFIG, Tuning};

#[derive(Debug, Clone)]
pub struct Settings {
    pub file: rpm_config::Config,
    /// True when no config file was found at the default path.
    pub builtin_defaults: bool,
    pub controller: rpm_core::ControllerCfg,
    pub telemetry: rpm_core::TelemetryCfg,
}

fn config_error(e: &eyre::Report) -> eyre::Report {
    eyre::Report::new(ControlError::Config(e.to_string()))
}

pub fn load(cli: &Cli) -> eyre::Result<Settings> {
    let path = cli.config.as_path();
    let builtin_defaults = path == Path::new(DEFAULT_CONFIG) && !path.exists();
    let mut file = if builtin_defaults {
        rpm_config::Config::default()
    } else {
        rpm_config::load_path(path).map_err(|e| config_error(&e))?
    };
    apply_overrides(&mut file, &cli.tuning);
    file.validate().map_err(|e| config_error(&e))?;

    Ok(Settings {
        controller: (&file.controller).into(),
        telemetry: (&file.telemetry).into(),
        file,
        builtin_defaults,
    })
}

pub fn apply_overrides(cfg: &mut rpm_config::Config, t: &Tuning) {
    let c = &mut cfg.controller;
    if let Some(v) = t.tolerance {
        c.consistency_tolerance = v;
    }
    if let Some(v) = t.drop_threshold {
        c.drop_threshold = v;
    }
    if let Some(v) = t.increment {
        c.compensation_increment = v;
    }
    if let Some(v) = t.target {
        c.consistent_readings_target = v;
    }
    if let Some(v) = t.override_ms {
        c.manual_override_window_ms = v;
    }
    if let Some(p) = &t.prefix {
        cfg.telemetry.prefix.clone_from(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_file_values() {
        let mut cfg = rpm_config::load_toml("[controller]\ndrop_threshold = 80\n").unwrap();
        let t = Tuning {
            drop_threshold: Some(120),
            prefix: Some("RPM=".into()),
            ..Tuning::default()
        };
        apply_overrides(&mut cfg, &t);
        assert_eq!(cfg.controller.drop_threshold, 120);
        assert_eq!(cfg.controller.consistency_tolerance, 30);
        assert_eq!(cfg.telemetry.prefix, "RPM=");
    }
}
