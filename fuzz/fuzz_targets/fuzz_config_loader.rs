#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // TOML parsing of Config must never panic; parse and validation errors are fine.
    if let Ok(cfg) = toml::from_str::<cgmcal_config::Config>(data) {
        let _ = cfg.validate();
    }
});
