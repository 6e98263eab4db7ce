//! Simulated motor peripheral.
//!
//! Speaks the same line protocol as the real controller board: it accepts
//! `SPEED<n>` and `DIR<m><d>` commands and reports `RPM<n>` once per sample
//! period. The rotor follows the commanded speed at a bounded slew rate; a
//! scripted load subtracts a fixed amount from the measured RPM while active.
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rpm_traits::Clock;

use crate::error::{LinkError, Result};

/// Line sent before the first reading; not telemetry.
pub const BANNER: &str = "READY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimParams {
    pub max_rpm: u32,
    pub jitter_rpm: u32,
    pub slew_rpm: u32,
    pub load_drop_rpm: u32,
    pub load_after_samples: u32,
    /// 0 keeps the load applied forever.
    pub load_for_samples: u32,
    /// 0 never closes the link.
    pub close_after_samples: u32,
    pub sample_period: Duration,
    pub seed: u32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            max_rpm: 3500,
            jitter_rpm: 10,
            slew_rpm: 30,
            load_drop_rpm: 120,
            load_after_samples: 80,
            load_for_samples: 8,
            close_after_samples: 0,
            sample_period: Duration::from_millis(100),
            seed: 0x00C0_FFEE,
        }
    }
}

#[derive(Debug)]
struct MotorState {
    speed: u8,
    directions: [char; 2],
    rotor_rpm: u32,
    samples: u32,
    rng: u32,
    commands: Vec<String>,
    banner_sent: bool,
    closed: bool,
}

impl MotorState {
    fn apply(&mut self, command: &str) {
        let cmd = command.trim();
        self.commands.push(cmd.to_string());
        if let Some(n) = cmd.strip_prefix("SPEED") {
            match n.parse::<u8>() {
                Ok(v) if v <= 100 => self.speed = v,
                _ => tracing::warn!(command = cmd, "sim: bad SPEED argument"),
            }
        } else if let Some(rest) = cmd.strip_prefix("DIR") {
            let mut chars = rest.chars();
            match (chars.next(), chars.next(), chars.next()) {
                (Some(m @ ('1' | '2')), Some(d @ ('F' | 'R' | 'S')), None) => {
                    let idx = usize::from(m == '2');
                    self.directions[idx] = d;
                }
                _ => tracing::warn!(command = cmd, "sim: bad DIR argument"),
            }
        } else {
            tracing::warn!(command = cmd, "sim: unknown command");
        }
    }

    // xorshift32
    fn next_rand(&mut self) -> u32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        x
    }

    fn sample(&mut self, p: &SimParams) -> u32 {
        let target = u32::try_from(u64::from(self.speed) * u64::from(p.max_rpm) / 100)
            .unwrap_or(u32::MAX);
        if self.rotor_rpm < target {
            self.rotor_rpm = self.rotor_rpm.saturating_add(p.slew_rpm).min(target);
        } else {
            self.rotor_rpm = self.rotor_rpm.saturating_sub(p.slew_rpm).max(target);
        }

        let index = self.samples;
        self.samples = self.samples.saturating_add(1);
        let loaded = index >= p.load_after_samples
            && (p.load_for_samples == 0
                || index < p.load_after_samples.saturating_add(p.load_for_samples));
        let mut rpm = self.rotor_rpm;
        if loaded {
            rpm = rpm.saturating_sub(p.load_drop_rpm);
        }
        if p.jitter_rpm > 0 && rpm > 0 {
            let j = match p.jitter_rpm.checked_add(1) {
                Some(m) => self.next_rand() % m,
                None => self.next_rand(),
            };
            rpm = rpm.saturating_add(j).saturating_sub(p.jitter_rpm / 2);
        }
        if p.close_after_samples > 0 && self.samples >= p.close_after_samples {
            self.closed = true;
        }
        rpm
    }
}

/// Shared handle to one simulated board.
///
/// Clones observe the same motor. Use [`SimulatedMotor::ports`] to obtain the
/// two link halves.
#[derive(Debug, Clone)]
pub struct SimulatedMotor {
    state: Arc<Mutex<MotorState>>,
    params: SimParams,
}

impl SimulatedMotor {
    pub fn new(params: SimParams) -> Self {
        let state = MotorState {
            speed: 0,
            directions: ['S', 'S'],
            rotor_rpm: 0,
            samples: 0,
            // xorshift has a fixed point at zero
            rng: params.seed.max(1),
            commands: Vec::new(),
            banner_sent: false,
            closed: false,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            params,
        }
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    fn lock(&self) -> Result<MutexGuard<'_, MotorState>> {
        self.state
            .lock()
            .map_err(|_| LinkError::Io(std::io::Error::other("simulated motor state poisoned")))
    }

    /// Link halves. The telemetry port paces itself on `clock`.
    pub fn ports<C: Clock>(&self, clock: C) -> (SimTelemetryPort<C>, SimCommandPort) {
        (
            SimTelemetryPort {
                motor: self.clone(),
                clock,
            },
            SimCommandPort {
                motor: self.clone(),
            },
        )
    }

    /// Last commanded speed in percent.
    pub fn speed(&self) -> u8 {
        self.lock().map(|s| s.speed).unwrap_or(0)
    }

    /// Current direction letter (`F`, `R`, `S`) for motor 1 or 2.
    pub fn direction(&self, motor: u8) -> Option<char> {
        let idx = match motor {
            1 => 0,
            2 => 1,
            _ => return None,
        };
        self.lock().ok().map(|s| s.directions[idx])
    }

    /// Every command received, newline stripped.
    pub fn commands(&self) -> Vec<String> {
        self.lock().map(|s| s.commands.clone()).unwrap_or_default()
    }

    pub fn samples(&self) -> u32 {
        self.lock().map(|s| s.samples).unwrap_or(0)
    }

    /// Drop the link; both ports fail from now on.
    pub fn disconnect(&self) {
        if let Ok(mut s) = self.lock() {
            s.closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().map(|s| s.closed).unwrap_or(true)
    }
}

/// Telemetry half of a simulated link.
pub struct SimTelemetryPort<C: Clock> {
    motor: SimulatedMotor,
    clock: C,
}

impl<C: Clock> SimTelemetryPort<C> {
    /// Produce the next line, sleeping one sample period first.
    pub fn next_line(&mut self) -> Result<String> {
        {
            let mut s = self.motor.lock()?;
            if s.closed {
                return Err(LinkError::Closed);
            }
            if !s.banner_sent {
                s.banner_sent = true;
                return Ok(BANNER.to_string());
            }
        }
        self.clock.sleep(self.motor.params.sample_period);
        let mut s = self.motor.lock()?;
        if s.closed {
            return Err(LinkError::Closed);
        }
        let rpm = s.sample(&self.motor.params);
        tracing::trace!(rpm, speed = s.speed, "sim sample");
        Ok(format!("RPM{rpm}"))
    }
}

impl<C: Clock> rpm_traits::LineSource for SimTelemetryPort<C> {
    fn read_line(
        &mut self,
        _timeout: Duration,
    ) -> std::result::Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        self.next_line().map(Some).map_err(Into::into)
    }
}

/// Command half of a simulated link.
pub struct SimCommandPort {
    motor: SimulatedMotor,
}

impl SimCommandPort {
    pub fn write_command(&mut self, command: &str) -> Result<()> {
        let mut s = self.motor.lock()?;
        if s.closed {
            return Err(LinkError::Closed);
        }
        s.apply(command);
        Ok(())
    }
}

impl rpm_traits::CommandSink for SimCommandPort {
    fn send(
        &mut self,
        command: &str,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write_command(command).map_err(Into::into)
    }
}
