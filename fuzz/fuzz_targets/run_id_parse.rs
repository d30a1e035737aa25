//! Fuzz target for run id extraction from ids and URLs.

#![no_main]

use fuzzkit::triage::resolve::parse_run_id;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(id) = parse_run_id(text) {
        assert!(!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()));
    }
});
