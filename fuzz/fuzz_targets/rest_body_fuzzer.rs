//! Fuzz target for REST body handling
//!
//! # Invariants
//!
//! - NEVER panic on any body
//! - `fault_in_body` only reports codes the protocol defines
//! - Without `listCount`, a listing's count is the number of items it holds

#![no_main]

use libfuzzer_sys::fuzz_target;
use mollom_proto::{rest, FaultKind};
use serde_json::Value as Json;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    if let Some((code, _)) = rest::fault_in_body(body) {
        assert!(FaultKind::from_code(code).is_known(), "unknown fault code {code}");
    }

    let Ok(doc) = rest::parse(body) else {
        return;
    };
    let _ = rest::extract(&doc, "content");
    if let Ok(page) = rest::decode_list::<Json>(&doc) {
        if doc.get("listCount").is_none() {
            assert_eq!(page.count, page.items.len() as u64);
        }
    }
});
