//! Fuzz target for the XML-RPC response decoder
//!
//! Server replies are untrusted input.
//!
//! # Strategy
//!
//! - Raw bytes interpreted as UTF-8 documents
//! - Deeply nested `<array>`/`<struct>` trees against the depth limit
//!
//! # Invariants
//!
//! - NEVER panic, whatever the document
//! - Nesting beyond `MAX_DEPTH` MUST be rejected

#![no_main]

use libfuzzer_sys::fuzz_target;
use mollom_proto::xmlrpc::{decode_call, decode_response, encode_response, MAX_DEPTH};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(response) = decode_response(input) {
        let _ = decode_response(&encode_response(&response));
    }
    let _ = decode_call(input);

    let depth = (data.len() % (MAX_DEPTH * 2)) + 1;
    let nested = format!(
        "<methodResponse><params><param>{}<value><int>1</int></value>{}</param></params>\
         </methodResponse>",
        "<value><array><data>".repeat(depth),
        "</data></array></value>".repeat(depth),
    );
    // methodResponse/params/param, three elements per level, then value/int
    if 3 + depth * 3 + 2 > MAX_DEPTH {
        assert!(decode_response(&nested).is_err(), "depth {depth} accepted");
    }
});
