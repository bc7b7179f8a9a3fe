//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use std::path::Path;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::{Result, SearchError};
use crate::search::Document;

pub mod hash;
pub mod recommend;
pub mod search;
pub mod serve;
pub mod tags;

/// Dispatch a command to its handler
pub async fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Serve(args) => serve::run(ctx, args).await,
        Commands::Search(args) => search::run(ctx, args).await,
        Commands::Tags(args) => tags::run(ctx, args),
        Commands::Hash(args) => hash::run(ctx, args).await,
        Commands::Recommend(args) => recommend::run(ctx, args),
    }
}

/// Read a corpus file: a JSON array of `{id, text, meta?}` objects.
pub fn read_corpus(path: &Path) -> Result<Vec<Document>> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| {
        SearchError::InvalidRequest(format!("corpus {}: {err}", path.display()))
    })
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn corpus_file_is_parsed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(
            &path,
            r#"[{"id":"1","text":"peptide"},{"id":"2","text":"liver","meta":{"year":2021}}]"#,
        )
        .unwrap();
        let docs = read_corpus(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].meta.as_ref().unwrap()["year"], 2021);
    }

    #[test]
    fn malformed_corpus_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{}").unwrap();
        let err = read_corpus(&path).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn missing_corpus_is_io_error() {
        let err = read_corpus(Path::new("/nonexistent/corpus.json")).unwrap_err();
        assert!(matches!(err, SearchError::Io(_)));
    }
}
