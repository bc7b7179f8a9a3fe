//! psearch hash - Print the n-gram embedding of a text

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::error::Result;
use crate::search::SemanticHasher;
use crate::search::similarity::l2_norm;

use super::print_json;

#[derive(Args, Debug)]
pub struct HashArgs {
    /// Text to embed
    pub text: String,

    /// Load the native hasher first, waiting up to this many milliseconds
    #[arg(long, value_name = "WAIT_MS")]
    pub native: Option<u64>,
}

pub async fn run(ctx: &AppContext, args: &HashArgs) -> Result<()> {
    let hasher = match args.native {
        Some(wait_ms) => {
            let hasher = Arc::new(SemanticHasher::from_config(&ctx.config.native));
            hasher
                .load_native_within(Duration::from_millis(wait_ms))
                .await;
            hasher
        }
        None => Arc::new(SemanticHasher::fallback_only()),
    };

    let embedding = hasher.semantic_vector(&args.text);
    let norm = l2_norm(&embedding);

    if ctx.json {
        return print_json(&json!({
            "native": hasher.has_native(),
            "dims": embedding.len(),
            "norm": norm,
            "embedding": embedding,
        }));
    }

    let source = if hasher.has_native() { "native" } else { "pure" };
    println!(
        "{} {} dims, norm {:.4}",
        source.bold(),
        embedding.len(),
        norm
    );
    for (bin, value) in embedding.iter().enumerate().filter(|(_, v)| **v != 0.0) {
        println!("  {bin:>3} {}", format!("{value:.4}").dimmed());
    }
    Ok(())
}
