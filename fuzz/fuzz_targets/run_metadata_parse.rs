//! Fuzz target for CI run metadata parsing.
//!
//! This fuzzer feeds arbitrary text to the `gh run view --json` decoder,
//! checking for panics, crashes, or hangs.
//!
//! Run with:
//!   cargo +nightly fuzz run run_metadata_parse

#![no_main]

use fuzzkit::triage::ci::{validate_run, RunMetadata};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(meta) = RunMetadata::from_json_str("0", text) {
        let _ = validate_run(&meta, "Fuzzing");
    }
});
