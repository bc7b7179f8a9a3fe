use std::collections::HashSet;

use proptest::prelude::*;

use portfolio_search::search::similarity::l2_norm;
use portfolio_search::search::tags::STOP_WORDS;
use portfolio_search::search::{DIMS, extract_tags, hash_ngrams};

proptest! {
    #[test]
    fn embeddings_are_unit_or_zero(text in "\\PC{0,40}") {
        let embedding = hash_ngrams(&text);
        prop_assert_eq!(embedding.len(), DIMS);
        let norm = l2_norm(&embedding);
        if text.to_lowercase().chars().count() >= 4 {
            prop_assert!((norm - 1.0).abs() < 1e-4);
        } else {
            prop_assert_eq!(norm, 0.0);
        }
    }

    #[test]
    fn tags_are_long_unique_and_bounded(text in "[a-zA-Z ,.]{0,200}", max in 0usize..12) {
        let tags = extract_tags(&text, max);
        prop_assert!(tags.len() <= max);
        let unique: HashSet<&String> = tags.iter().collect();
        prop_assert_eq!(unique.len(), tags.len());
        for tag in &tags {
            prop_assert!(tag.len() > 4);
            prop_assert!(!STOP_WORDS.contains(&tag.as_str()));
            prop_assert!(tag.chars().all(|c| c.is_ascii_lowercase()));
        }
    }
}
