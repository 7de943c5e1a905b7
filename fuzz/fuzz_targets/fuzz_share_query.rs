#![no_main]
use clockwall_config::Settings;
use clockwall_config::share::{apply_query, to_query};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let mut s = Settings::default();
    apply_query(&mut s, data);
    // Whatever the input, the result stays in range and re-encodes.
    assert!((-12.0..=14.0).contains(&s.utc_offset_hours));
    let snapped = s.clone().sanitized().utc_offset_hours;
    assert_eq!((snapped * 2.0).fract(), 0.0);

    let mut back = Settings::default();
    apply_query(&mut back, &to_query(&s));
    assert_eq!(back.utc_offset_hours, s.utc_offset_hours);
    assert_eq!(back.twelve_hour, s.twelve_hour);
});
