use std::collections::HashSet;

use proptest::prelude::*;

use portfolio_search::search::tokenizer::index_terms;
use portfolio_search::search::{Document, VectorStore, cosine};

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            prop::sample::select(vec!["peptide", "capsid", "liver", "gene", "vector", "of"])
                .prop_map(str::to_string),
            "[a-z]{1,9}",
        ],
        0..10,
    )
    .prop_map(|words| words.join(" "))
}

fn arb_docs() -> impl Strategy<Value = Vec<Document>> {
    prop::collection::vec(arb_text(), 0..10).prop_map(|texts| {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Document::new(i.to_string(), text))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn vocabulary_grows_by_new_terms_only(first in arb_docs(), second in arb_docs()) {
        let mut store = VectorStore::default();
        store.add_documents(first);
        let before: HashSet<String> = (0..store.vocab_len())
            .filter_map(|i| store.vocabulary().term(i).map(str::to_string))
            .collect();

        let new_terms: HashSet<String> = second
            .iter()
            .flat_map(|doc| index_terms(&doc.text))
            .filter(|term| !before.contains(term))
            .collect();

        store.add_documents(second);
        prop_assert_eq!(store.vocab_len(), before.len() + new_terms.len());
    }

    #[test]
    fn hybrid_results_are_sorted(docs in arb_docs(), query in arb_text(), alpha in 0.0f32..=1.0) {
        let mut store = VectorStore::default();
        store.add_documents(docs);
        let results = store.hybrid_search(&query, 10, alpha);
        for pair in results.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
        for result in &results {
            let expected = alpha * result.tfidf_score + (1.0 - alpha) * result.sem_score;
            prop_assert!((result.score - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn alpha_one_ranks_like_lexical_search(docs in arb_docs(), query in arb_text()) {
        let mut store = VectorStore::default();
        store.add_documents(docs);
        let lexical: Vec<String> = store.search(&query, 10).into_iter().map(|r| r.id).collect();
        let hybrid: Vec<String> = store
            .hybrid_search(&query, 10, 1.0)
            .into_iter()
            .map(|r| r.id)
            .collect();
        prop_assert_eq!(lexical, hybrid);
    }

    #[test]
    fn cosine_is_symmetric_and_bounded(
        a in prop::collection::vec(0.0f32..10.0, 0..16),
        b in prop::collection::vec(0.0f32..10.0, 0..16),
    ) {
        let ab = cosine(&a, &b);
        let ba = cosine(&b, &a);
        prop_assert!((ab - ba).abs() < 1e-5);
        prop_assert!((-1e-5..=1.0 + 1e-5).contains(&ab));
    }
}
