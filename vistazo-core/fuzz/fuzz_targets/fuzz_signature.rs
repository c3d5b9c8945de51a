#![no_main]

//! Fuzz target for SignatureExtractor::signature_from_bytes()
//!
//! Query images arrive from untrusted uploads. Decoding, resampling, hashing
//! and color extraction must reject or handle any input without panicking.
//!
//! Run with: cargo +nightly fuzz run fuzz_signature

use libfuzzer_sys::fuzz_target;
use vistazo_core::{DominantColorStrategy, SignatureExtractor};

fuzz_target!(|data: &[u8]| {
    for strategy in [
        DominantColorStrategy::bin_voting(),
        DominantColorStrategy::central_cluster(),
    ] {
        let _ = SignatureExtractor::new(strategy).signature_from_bytes("fuzz", data);
    }
});
