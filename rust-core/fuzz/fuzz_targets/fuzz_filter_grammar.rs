// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for the filter expression grammar.
// Run with: cargo +nightly fuzz run fuzz_filter_grammar
//
// Feeds arbitrary strings to the `OPERATOR(args)` parser. Malformed input
// must come back as a GrammarError, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if input.len() <= 4096 {
            if let Ok(parsed) = dynquery_compiler::grammar::parse(input) {
                // Arguments are borrowed slices of the input.
                assert!(parsed.args.iter().all(|arg| input.contains(arg)));
            }
        }
    }
});
