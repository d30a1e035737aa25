//! Fuzz target for the AFL summary excerpt.

#![no_main]

use fuzzkit::triage::stats::excerpt_summary;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Some(excerpt) = excerpt_summary(&text) {
        assert!(excerpt.ends_with('\n'));
    }
});
