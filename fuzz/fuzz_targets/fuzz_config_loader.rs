#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = clockwall_config::load_toml(data) {
        if cfg.validate().is_ok() {
            let s = cfg.display.to_settings();
            assert!((-12.0..=14.0).contains(&s.utc_offset_hours));
        }
    }
});
