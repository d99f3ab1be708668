#![no_main]

use esfera::config::parse_config;
use libfuzzer_sys::fuzz_target;

/// Fuzz target for YAML configuration parsing
///
/// Arbitrary input must produce a config or an error, never a panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(yaml) = std::str::from_utf8(data) {
        let _ = parse_config(yaml);
    }
});
