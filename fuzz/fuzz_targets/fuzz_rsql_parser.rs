//! Fuzz target for the RSQL parser.
//!
//! Arbitrary input must yield either a tree or a `ParseError` whose position
//! lies inside the input. Never a panic.

#![no_main]

use fleetql_core::Parser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(query) = std::str::from_utf8(data) {
        if let Err(err) = Parser::parse(query) {
            assert!(err.position <= query.len());
        }
    }
});
