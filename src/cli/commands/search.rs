//! psearch search - Search a corpus file
//!
//! Hybrid (TF-IDF blended with n-gram similarity) by default; `--lexical`
//! ranks by TF-IDF cosine only.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::error::{Result, SearchError};
use crate::search::{HybridResult, ScoredResult, SemanticHasher, VectorStore};

use super::{print_json, read_corpus};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// JSON file holding an array of {id, text, meta?} documents
    #[arg(long, short)]
    pub corpus: PathBuf,

    /// Maximum number of results (default: search.default_top)
    #[arg(long, short)]
    pub top: Option<usize>,

    /// Lexical weight in [0, 1] (default: search.alpha)
    #[arg(long, short)]
    pub alpha: Option<f32>,

    /// TF-IDF ranking only
    #[arg(long, conflicts_with = "alpha")]
    pub lexical: bool,
}

pub async fn run(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let top = args
        .top
        .filter(|t| *t > 0)
        .unwrap_or(ctx.config.search.default_top);
    let alpha = args.alpha.unwrap_or(ctx.config.search.alpha);
    if !(0.0..=1.0).contains(&alpha) {
        return Err(SearchError::InvalidRequest(format!(
            "alpha must be within [0, 1], got {alpha}"
        )));
    }

    let documents = read_corpus(&args.corpus)?;
    let hasher = Arc::new(SemanticHasher::from_config(&ctx.config.native));
    let mut store = VectorStore::new(hasher);
    store.add_documents(documents);

    if args.lexical {
        let results = store.search(&args.query, top);
        if ctx.json {
            return print_json(&json!({ "query": args.query, "results": results }));
        }
        print_lexical(&args.query, &results);
    } else {
        let results = store
            .hybrid_search_ready(&args.query, top, alpha, ctx.config.native.wait)
            .await;
        if ctx.json {
            return print_json(&json!({
                "query": args.query,
                "alpha": alpha,
                "native": store.hasher().has_native(),
                "results": results,
            }));
        }
        print_hybrid(&args.query, &results);
    }
    Ok(())
}

fn print_lexical(query: &str, results: &[ScoredResult]) {
    if results.is_empty() {
        println!("{} no documents indexed", "!".yellow());
        return;
    }
    println!("{} {}", "Results for".bold(), query.cyan());
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{:>3}. {} {}",
            rank + 1,
            result.id.bold(),
            format!("{:.4}", result.score).dimmed()
        );
    }
}

fn print_hybrid(query: &str, results: &[HybridResult]) {
    if results.is_empty() {
        println!("{} no documents indexed", "!".yellow());
        return;
    }
    println!("{} {}", "Results for".bold(), query.cyan());
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{:>3}. {} {} {}",
            rank + 1,
            result.id.bold(),
            format!("{:.4}", result.score).green(),
            format!(
                "(tfidf {:.4}, semantic {:.4})",
                result.tfidf_score, result.sem_score
            )
            .dimmed()
        );
    }
}
