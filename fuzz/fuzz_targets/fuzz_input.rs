// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use photoview::metadata::{container, iptc, xmp};
use std::io::Cursor;
use photoview::KeywordExpression;

#[derive(Arbitrary, Debug)]
enum Edit {
    Literal(String, bool),
    Clause,
    DeleteLastClause,
    Clear,
}

#[derive(Arbitrary, Debug)]
struct Input {
    file_bytes: Vec<u8>,
    edits: Vec<Edit>,
    keywords: Vec<String>,
}

fuzz_target!(|input: Input| {
    if let Ok(blocks) = container::read_blocks(&mut Cursor::new(&input.file_bytes)) {
        if let Some(records) = blocks.iptc {
            let _ = iptc::parse_records(&records);
        }
    }
    if let Some(resources) = iptc::find_resource(&input.file_bytes) {
        let _ = iptc::parse_records(resources);
    }

    if let Ok(Some(data)) = xmp::read_embedded(&input.file_bytes) {
        if let Some(rating) = data.rating {
            let _ = rating.clamp(0, 5);
        }
    }

    let mut expr = KeywordExpression::new();
    for edit in input.edits {
        match edit {
            Edit::Literal(symbol, negated) => expr.add_literal(symbol, negated),
            Edit::Clause => expr.add_clause(),
            Edit::DeleteLastClause => expr.delete_last_clause(),
            Edit::Clear => expr.clear(),
        }
    }
    assert!(expr.clause_count() >= 1);

    let accepted = expr.evaluate(input.keywords.as_slice());
    if expr.is_trivial() {
        assert!(accepted);
    }
    assert!(expr.to_string().ends_with('\n'));
});
