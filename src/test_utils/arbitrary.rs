use proptest::prelude::*;

use crate::search::Document;

/// Words drawn from a small vocabulary so generated texts share terms.
pub fn arb_word() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(vec![
            "peptide", "capsid", "liver", "delivery", "protein", "vector", "gene",
            "the", "and", "of", "engineering", "stability",
        ])
        .prop_map(str::to_string),
        1 => "[a-zA-Z]{1,10}",
    ]
}

pub fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_word(), 0..12).prop_map(|words| words.join(" "))
}

pub fn arb_document() -> impl Strategy<Value = Document> {
    ("[a-z0-9]{1,8}", arb_text()).prop_map(|(id, text)| Document::new(id, text))
}

pub fn arb_corpus() -> impl Strategy<Value = Vec<Document>> {
    prop::collection::vec(arb_document(), 0..12)
}
