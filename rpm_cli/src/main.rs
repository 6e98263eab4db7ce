#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod logging;
mod operator;
mod output;
mod replay;
mod run;
mod session;
mod settings;
mod simulate;
mod stepper;

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::Parser;
use rpm_core::{Controller, TelemetryParser};

use crate::cli::{Cli, Commands, JSON_MODE, SHUTDOWN};
use crate::output::Printer;
use crate::settings::Settings;

fn main() {
    let cli = Cli::parse();
    // Pretty reports for anything that escapes to the top level
    let _ = color_eyre::install();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        let code = error_fmt::exit_code_for_error(&err);
        tracing::error!(error = %err, code, "exiting with error");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("error: {err}");
            eprintln!("{}", error_fmt::humanize(&err));
        }
        std::process::exit(code);
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let settings = settings::load(&cli)?;
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &settings.file.logging)?;
    if settings.builtin_defaults {
        tracing::debug!(path = %cli.config.display(), "no config file, using built-in defaults");
    }

    if let Err(e) = ctrlc::set_handler(|| SHUTDOWN.store(true, Ordering::Relaxed)) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    let printer = Printer {
        json: cli.json,
        verdicts: false,
        tolerance: settings.controller.consistency_tolerance,
    };

    match cli.cmd {
        Commands::Run { device, tcp } => {
            run::run_live(&settings, device, tcp, printer)?;
        }
        Commands::Simulate {
            speed,
            samples,
            fast,
        } => {
            simulate::run_simulate(&settings, speed, samples, fast, printer)?;
        }
        Commands::Replay {
            file,
            interval_ms,
            verdicts,
        } => {
            let controller = Controller::builder()
                .with_config(settings.controller.clone())
                .build()?;
            let parser = TelemetryParser::new(settings.telemetry.prefix.clone());
            replay::run_replay(
                controller,
                parser,
                &file,
                Duration::from_millis(interval_ms),
                Printer { verdicts, ..printer },
            )?;
        }
        Commands::SelfCheck => self_check(cli.json, &cli.config, &settings),
    }
    Ok(())
}

fn self_check(json: bool, config: &Path, settings: &Settings) {
    let c = &settings.controller;
    let link = &settings.file.link;
    let source = if settings.builtin_defaults {
        "built-in defaults".to_string()
    } else {
        config.display().to_string()
    };
    let override_ms = u64::try_from(c.manual_override_window.as_millis()).unwrap_or(u64::MAX);
    let read_timeout_ms =
        u64::try_from(settings.telemetry.read_timeout.as_millis()).unwrap_or(u64::MAX);

    if json {
        let line = serde_json::json!({
            "kind": "self_check",
            "ok": true,
            "config": source,
            "consistency_tolerance": c.consistency_tolerance,
            "drop_threshold": c.drop_threshold,
            "compensation_increment": c.compensation_increment,
            "consistent_readings_target": c.consistent_readings_target,
            "manual_override_window_ms": override_ms,
            "telemetry_prefix": settings.telemetry.prefix,
            "read_timeout_ms": read_timeout_ms,
            "device": link.device,
            "tcp": link.tcp,
        });
        println!("{line}");
        return;
    }

    println!("OK");
    println!("config: {source}");
    println!("consistency tolerance: ±{} rpm", c.consistency_tolerance);
    println!("drop threshold: {} rpm", c.drop_threshold);
    println!("compensation increment: {}%", c.compensation_increment);
    println!("consistent readings to revert: {}", c.consistent_readings_target);
    println!("manual override window: {override_ms} ms");
    println!(
        "telemetry: prefix {:?}, read timeout {read_timeout_ms} ms",
        settings.telemetry.prefix
    );
    match (&link.device, &link.tcp) {
        (Some(d), _) => println!("link: device {d}"),
        (None, Some(a)) => println!("link: tcp {a}"),
        (None, None) => println!("link: not configured"),
    }
}
