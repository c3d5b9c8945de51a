#![no_main]

//! Fuzz target for Index::from_json()
//!
//! Snapshots are read from disk at startup; a corrupt file must surface as
//! `InvalidIndex`, never as a panic.
//!
//! Run with: cargo +nightly fuzz run fuzz_index_snapshot

use libfuzzer_sys::fuzz_target;
use vistazo_core::Index;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(index) = Index::from_json(json) {
            // Whatever parses must serialize again.
            let _ = index.to_json();
        }
    }
});
