use anyhow::Context;
use persona_rag::{safe_truncate_ellipsis, Passage, RagConfig, Retriever};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env().add_directive("persona_rag=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let kb_path = args
        .next()
        .context("usage: kb-probe <passages.json> <query>...")?;
    let queries: Vec<String> = args.collect();
    if queries.is_empty() {
        anyhow::bail!("usage: kb-probe <passages.json> <query>...");
    }

    let raw = std::fs::read_to_string(&kb_path)
        .with_context(|| format!("failed to read {kb_path}"))?;
    let passages: Vec<Passage> =
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {kb_path}"))?;

    let config = RagConfig::from_env();
    let k = config.default_k;
    let retriever = Retriever::lexical(config);
    retriever.add_passages(passages).await?;

    println!("Indexed {} passages: {:?}", retriever.len(), retriever.category_stats());

    for query in &queries {
        let retrieval = retriever.retrieve(query, k, 0.0).await?;
        println!("\nQuery: {query}");
        println!("Confidence: {}", retrieval.confidence);
        for (i, result) in retrieval.results.iter().enumerate() {
            println!(
                "  {}. [{:.3}] ({}/{}) {}",
                i + 1,
                result.score,
                result.metadata.kind,
                result.metadata.category,
                safe_truncate_ellipsis(&result.content, 120)
            );
        }
    }

    Ok(())
}
