#![no_main]

//! Save file loader fuzzer.
//!
//! Arbitrary bytes go through the loader. Rejections are fine; anything the
//! loader accepts must be a consistent game.

use libfuzzer_sys::fuzz_target;
use std::io::Write;
use watopoly::game::check_invariants;
use watopoly::save::load_game;

fuzz_target!(|data: &[u8]| {
    let Ok(mut file) = tempfile::NamedTempFile::new() else {
        return;
    };
    if file.write_all(data).is_err() {
        return;
    }
    if file.flush().is_err() {
        return;
    }

    if let Ok(state) = load_game(file.path(), 7) {
        let violations = check_invariants(&state);
        assert!(
            violations.is_empty(),
            "Loader accepted an inconsistent game: {violations:?}"
        );
    }
});
