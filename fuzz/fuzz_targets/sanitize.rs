#![no_main]

use libfuzzer_sys::fuzz_target;
use logfilter_filter::sanitize::sanitize;

fuzz_target!(|data: &[u8]| {
    // Repair must always yield valid UTF-8 and be stable on a second pass.
    if let Some(line) = sanitize(data.to_vec(), true, true) {
        assert!(std::str::from_utf8(&line).is_ok());
        if !line.is_empty() {
            assert_eq!(sanitize(line.clone(), true, true), Some(line));
        }
    }

    // Without repair the bytes pass through untouched.
    if !data.is_empty() {
        assert_eq!(sanitize(data.to_vec(), true, false).as_deref(), Some(data));
    }
});
