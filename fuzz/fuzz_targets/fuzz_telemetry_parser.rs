#![no_main]
use libfuzzer_sys::fuzz_target;
use std::time::Instant;

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    let now = Instant::now();
    if let Some(rpm) = rpm_core::telemetry::parse_rpm("RPM", &line) {
        // Whatever parses must render back to the same number.
        let body = line.strip_prefix("RPM").map(str::trim);
        assert_eq!(body.and_then(|b| b.parse::<u32>().ok()), Some(rpm));
    }

    // Arbitrary lines never panic the controller.
    let mut ctl = rpm_core::Controller::builder()
        .build()
        .expect("default config builds");
    ctl.handle(rpm_core::Event::Connected, now);
    if let Some(sample) = rpm_core::telemetry::parse_line("RPM", &line, now) {
        ctl.handle(rpm_core::Event::Telemetry(sample), now);
    }
});
