#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    let Ok(cfg) = rpm_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        // A validated file must always build a controller.
        let ctl_cfg: rpm_core::ControllerCfg = (&cfg.controller).into();
        assert!(rpm_core::Controller::builder().with_config(ctl_cfg).build().is_ok());
    }
});
