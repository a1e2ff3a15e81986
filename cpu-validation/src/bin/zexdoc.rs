//! Runs the zexdoc Z80 conformance suite against the core and prints its
//! output. Exits non-zero if the suite didn't reach "CPU TESTS OK".
//!
//! ```text
//! cargo run -p sms-cpu-validation --bin zexdoc -- path/to/zexdoc.sms
//! ```
//! With no argument, defaults to `tests/fixtures/zexdoc.sms` relative to
//! this crate (spec.md §6), which is not checked into the repo.

use std::path::PathBuf;

use sms_cpu_validation::run_zexdoc;

const MAX_INSTRUCTIONS: u64 = 200_000_000;

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/zexdoc.sms"));

    let program = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("couldn't read {}: {err}", path.display());
            std::process::exit(2);
        }
    };

    let output = run_zexdoc(&program, MAX_INSTRUCTIONS);
    print!("{output}");

    if !output.contains("CPU TESTS OK") {
        std::process::exit(1);
    }
}
