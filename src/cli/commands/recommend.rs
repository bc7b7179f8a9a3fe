//! psearch recommend - Related papers by shared keywords

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::error::{Result, SearchError};
use crate::search::{Paper, recommend};

use super::print_json;

#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// Id of the paper to find neighbours for
    pub target: String,

    /// JSON file holding an array of {id, title, abstract?, year?, keywords?}
    #[arg(long, short)]
    pub papers: PathBuf,

    /// Maximum number of results (default: search.default_top)
    #[arg(long, short)]
    pub top: Option<usize>,
}

pub fn run(ctx: &AppContext, args: &RecommendArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.papers)?;
    let papers: Vec<Paper> = serde_json::from_str(&raw).map_err(|err| {
        SearchError::InvalidRequest(format!("papers {}: {err}", args.papers.display()))
    })?;
    let top = args
        .top
        .filter(|t| *t > 0)
        .unwrap_or(ctx.config.search.default_top);

    let recommendations = recommend(&papers, &args.target, top);

    if ctx.json {
        return print_json(&json!({
            "target": args.target,
            "recommendations": recommendations,
        }));
    }
    if recommendations.is_empty() {
        println!("{} no recommendations for {}", "!".yellow(), args.target);
        return Ok(());
    }
    for (rank, rec) in recommendations.iter().enumerate() {
        println!(
            "{:>3}. {} {} {}",
            rank + 1,
            rec.id.bold(),
            format!("{:.4}", rec.score).green(),
            rec.reasons.join(", ").dimmed()
        );
    }
    Ok(())
}
