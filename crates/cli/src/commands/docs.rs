//! `supportdesk docs` — Browse the documentation the assistant answers from.

use std::path::Path;
use supportdesk_agent::{load_documents, scoring_weights};
use supportdesk_retrieval::RelevanceScorer;

use super::load_config;

pub fn run(
    config_path: Option<&Path>,
    query: Option<String>,
    top_k: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let docs = load_documents(&config.retrieval)?;

    let Some(query) = query else {
        println!("Documentation ({} entries)", docs.len());
        println!("==========================");
        for doc in docs.docs() {
            println!();
            println!("  {}", doc.title);
            println!("    keywords: {}", doc.keywords.join(", "));
        }
        return Ok(());
    };

    let scorer = RelevanceScorer::new(top_k.unwrap_or(config.retrieval.top_k))
        .with_weights(scoring_weights(&config.retrieval.weights));
    let ranked = scorer.rank(&query, docs.docs());

    println!("Matches for: \"{query}\"");
    println!();

    if ranked.is_empty() {
        println!("  No matching documentation.");
        return Ok(());
    }

    for (i, hit) in ranked.iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, hit.score, hit.doc.title);
        println!("     {}", hit.doc.content);
    }

    Ok(())
}
