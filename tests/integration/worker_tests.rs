use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use portfolio_search::search::{Document, SemanticHasher};
use portfolio_search::test_utils::fixtures::{NGRAM_HASH_WAT, StaticSource, sample_documents};
use portfolio_search::worker::{
    Envelope, SearchWorker, WorkerRequest, WorkerResponse, WorkerSettings, decode_request,
};

fn spawn_worker() -> portfolio_search::WorkerHandle {
    SearchWorker::new(
        Arc::new(SemanticHasher::fallback_only()),
        WorkerSettings::default(),
    )
    .spawn()
}

#[tokio::test]
async fn full_session_over_the_handle() {
    let mut worker = spawn_worker();

    let response = worker
        .request(WorkerRequest::Search {
            query: "peptide".into(),
            top: None,
        })
        .await
        .unwrap();
    assert_eq!(
        response,
        WorkerResponse::Error {
            error: "not_initialized".into()
        }
    );

    let response = worker
        .request(WorkerRequest::Init {
            documents: sample_documents(),
        })
        .await
        .unwrap();
    assert_eq!(response, WorkerResponse::Inited { count: 6 });

    let WorkerResponse::SearchResult { query, results } = worker
        .request(WorkerRequest::Search {
            query: "peptide".into(),
            top: Some(2),
        })
        .await
        .unwrap()
    else {
        panic!("expected searchResult");
    };
    assert_eq!(query, "peptide");
    assert_eq!(results.len(), 2);
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert!(ids.contains(&"pub-1"));
    assert!(ids.contains(&"pub-6"));

    let WorkerResponse::HybridResult { results, .. } = worker
        .request(WorkerRequest::Hybrid {
            query: "nanoparticle delivery".into(),
            top: None,
            alpha: Some(0.6),
        })
        .await
        .unwrap()
    else {
        panic!("expected hybridResult");
    };
    assert_eq!(results.len(), 5);
    assert_eq!(results[0].id, "pub-3");

    worker.shutdown().await;
}

#[tokio::test]
async fn decoded_messages_round_trip_through_the_worker() {
    let mut worker = spawn_worker();

    let init = decode_request(
        r#"{"id":"i","type":"init","documents":[{"id":"a","text":"protein stability optimization","meta":{"venue":"Nature"}},{"id":"b","text":"nanoparticle delivery system"}]}"#,
    )
    .unwrap();
    let reply = worker.call(init).await.unwrap();
    assert_eq!(reply.id, Some(json!("i")));

    let hybrid = decode_request(r#"{"id":"h","type":"hybrid","query":"delivery","top":1}"#).unwrap();
    let reply = worker.call(hybrid).await.unwrap();
    let encoded = serde_json::to_value(&reply).unwrap();
    assert_eq!(encoded["id"], "h");
    assert_eq!(encoded["type"], "hybridResult");
    assert_eq!(encoded["results"].as_array().unwrap().len(), 1);
    assert_eq!(encoded["results"][0]["id"], "b");
    assert!(encoded["results"][0].get("tfidfScore").is_some());

    let search = decode_request(r#"{"type":"search","query":"stability"}"#).unwrap();
    let reply = worker.call(search).await.unwrap();
    let encoded = serde_json::to_value(&reply).unwrap();
    assert_eq!(encoded["results"][0]["meta"]["venue"], "Nature");

    worker.shutdown().await;
}

#[tokio::test]
async fn concurrent_posters_are_matched_by_id() {
    let mut worker = spawn_worker();
    worker
        .request(WorkerRequest::Init {
            documents: sample_documents(),
        })
        .await
        .unwrap();

    let queries = ["peptide", "capsid", "liver", "protein", "gene", "delivery"];
    let mut posters = Vec::new();
    for (n, query) in queries.iter().enumerate() {
        let sender = worker.sender();
        let request = WorkerRequest::Search {
            query: (*query).to_string(),
            top: Some(1),
        };
        posters.push(tokio::spawn(async move {
            sender
                .send(Envelope::new(request).with_id(n))
                .await
                .unwrap();
        }));
    }
    for poster in posters {
        poster.await.unwrap();
    }

    let mut by_id = HashMap::new();
    for _ in 0..queries.len() {
        let reply = worker.next_response().await.unwrap();
        let WorkerResponse::SearchResult { query, .. } = reply.body else {
            panic!("expected searchResult");
        };
        by_id.insert(reply.id.unwrap().as_u64().unwrap(), query);
    }
    for (n, query) in queries.iter().enumerate() {
        assert_eq!(by_id[&(n as u64)], *query);
    }

    worker.shutdown().await;
}

#[tokio::test]
async fn repeated_init_appends() {
    let mut worker = spawn_worker();
    worker
        .request(WorkerRequest::Init {
            documents: vec![Document::new("1", "peptide engineering")],
        })
        .await
        .unwrap();
    let response = worker
        .request(WorkerRequest::Init {
            documents: vec![Document::new("2", "liver targeting")],
        })
        .await
        .unwrap();
    assert_eq!(response, WorkerResponse::Inited { count: 1 });

    let WorkerResponse::SearchResult { results, .. } = worker
        .request(WorkerRequest::Search {
            query: "liver".into(),
            top: Some(5),
        })
        .await
        .unwrap()
    else {
        panic!("expected searchResult");
    };
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "2");

    worker.shutdown().await;
}

#[tokio::test]
async fn hybrid_waits_for_native_when_configured() {
    let source = StaticSource::new(NGRAM_HASH_WAT).with_delay(Duration::from_millis(20));
    let hasher = Arc::new(SemanticHasher::new(Box::new(source)));
    let settings = WorkerSettings {
        native_wait: Duration::from_secs(5),
        ..WorkerSettings::default()
    };
    let mut worker = SearchWorker::new(Arc::clone(&hasher), settings).spawn();

    worker
        .request(WorkerRequest::Init {
            documents: sample_documents(),
        })
        .await
        .unwrap();
    let response = worker
        .request(WorkerRequest::Hybrid {
            query: "capsid".into(),
            top: None,
            alpha: None,
        })
        .await
        .unwrap();

    assert!(matches!(response, WorkerResponse::HybridResult { .. }));
    assert!(hasher.has_native());

    worker.shutdown().await;
}

#[tokio::test]
async fn tags_work_before_init() {
    let mut worker = spawn_worker();
    let response = worker
        .request(WorkerRequest::Tags {
            text: "Capsid engineering for liver delivery. Capsid variants improve liver delivery; capsid screens.".into(),
            max: Some(3),
        })
        .await
        .unwrap();
    assert_eq!(
        response,
        WorkerResponse::TagsResult {
            tags: vec!["capsid".into(), "liver".into(), "delivery".into()]
        }
    );
    worker.shutdown().await;
}
