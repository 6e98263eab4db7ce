//! `run`: control a live peripheral over a serial device or TCP bridge.

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use crossbeam_channel as xch;
use eyre::WrapErr;
use rpm_core::{ControlError, Controller};
use rpm_link::{Endpoint, LinkOptions};
use rpm_traits::MonotonicClock;

use crate::operator::{self, OperatorInput};
use crate::output::{Printer, Summary};
use crate::session::{SessionOpts, run_session};
use crate::settings::Settings;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// CLI flags first, then `[link]` from the config file.
pub fn resolve_endpoint(
    settings: &Settings,
    device: Option<PathBuf>,
    tcp: Option<String>,
) -> eyre::Result<Endpoint> {
    if let Some(p) = device {
        return Ok(Endpoint::Device(p));
    }
    if let Some(a) = tcp {
        return Ok(Endpoint::Tcp(a));
    }
    let link = &settings.file.link;
    if let Some(d) = &link.device {
        return Ok(Endpoint::Device(PathBuf::from(d)));
    }
    if let Some(a) = &link.tcp {
        return Ok(Endpoint::Tcp(a.clone()));
    }
    Err(eyre::Report::new(ControlError::Config(
        "no link endpoint: pass --device or --tcp, or set [link] in the config".to_string(),
    )))
}

/// Read operator commands from stdin on a background thread. EOF means quit.
fn spawn_stdin_reader() -> xch::Receiver<OperatorInput> {
    let (tx, rx) = xch::unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match operator::parse(&line) {
                Ok(input) => {
                    let quit = input == OperatorInput::Quit;
                    if tx.send(input).is_err() || quit {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(input = line.trim(), error = %e, "bad operator command");
                    eprintln!("error: {e}");
                }
            }
        }
        let _ = tx.send(OperatorInput::Quit);
    });
    rx
}

pub fn run_live(
    settings: &Settings,
    device: Option<PathBuf>,
    tcp: Option<String>,
    printer: Printer,
) -> eyre::Result<Summary> {
    let endpoint = resolve_endpoint(settings, device, tcp)?;
    let controller = Controller::builder()
        .with_config(settings.controller.clone())
        .build()?;
    let opts = LinkOptions {
        read_timeout: Some(settings.telemetry.read_timeout),
        write_timeout: settings.file.link.write_timeout_ms.map(Duration::from_millis),
        connect_timeout: Some(CONNECT_TIMEOUT),
    };
    let (source, sink) =
        rpm_link::open(&endpoint, opts).wrap_err_with(|| format!("open {endpoint}"))?;
    tracing::info!(%endpoint, "link open");

    let operator = spawn_stdin_reader();
    run_session(
        controller,
        source,
        sink,
        MonotonicClock::new(),
        &operator,
        SessionOpts {
            telemetry: settings.telemetry.clone(),
            initial: Vec::new(),
            detach_pump: matches!(endpoint, Endpoint::Device(_)),
            link_loss_is_error: true,
            printer,
        },
    )
}
