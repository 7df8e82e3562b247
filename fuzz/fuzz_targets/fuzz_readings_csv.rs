#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes: header/row/order errors are expected, panics are not.
    let _ = cgmcal_config::read_readings(data);
    let _ = cgmcal_config::read_checks(data);
});
