//! psearch tags - Extract keyword tags from text

use std::io::Read;

use clap::Args;
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::error::Result;
use crate::search::extract_tags;

use super::print_json;

#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Text to tag; read from stdin when omitted
    pub text: Option<String>,

    /// Maximum number of tags (default: tags.default_max)
    #[arg(long, short)]
    pub max: Option<usize>,
}

pub fn run(ctx: &AppContext, args: &TagsArgs) -> Result<()> {
    let text = match &args.text {
        Some(text) => text.clone(),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let max = args
        .max
        .filter(|m| *m > 0)
        .unwrap_or(ctx.config.tags.default_max);

    let tags = extract_tags(&text, max);

    if ctx.json {
        return print_json(&json!({ "tags": tags }));
    }
    if tags.is_empty() {
        println!("{} no tags found", "!".yellow());
    } else {
        println!("{}", tags.join(", ").cyan());
    }
    Ok(())
}
