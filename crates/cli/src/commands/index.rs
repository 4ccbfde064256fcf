//! `compass index`: Build a retrieval index from a folder of documents.

use compass_retrieval::IndexBuilder;
use std::path::PathBuf;

pub async fn run(docs_dir: PathBuf, out: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(None)?;
    let out_dir = out.unwrap_or_else(|| config.retrieval.persist_dir.clone());

    let router = compass_providers::router::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;

    println!("🧭 Indexing {}", docs_dir.display());
    println!("   Embedding model: {}", config.retrieval.embed_model);

    let report = IndexBuilder::new(provider, config.retrieval.embed_model.clone())
        .build(&docs_dir, &out_dir)
        .await?;

    println!(
        "✅ Indexed {} document(s) into {} chunk(s)",
        report.documents, report.chunks
    );
    println!("   Written to: {}", report.index_path.display());

    Ok(())
}
