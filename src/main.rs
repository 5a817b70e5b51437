use anyhow::{Context, Result};
use clap::Parser;

use docrag::{
    CommandConverter, Config, Embedder, EmbedderKind, OllamaEmbedder, OllamaGenerator, Pipeline,
};

fn main() -> Result<()> {
    // a missing .env is fine, flags and defaults still apply
    let _ = dotenvy::dotenv();
    env_logger::init();

    let config = Config::parse();
    config.validate().context("invalid configuration")?;
    log::debug!("{config:?}");

    match config.embedder {
        EmbedderKind::Ollama => {
            let embedder =
                OllamaEmbedder::new(&config.model_endpoint, config.embedding_model.clone())
                    .context("failed to build embedding client")?;
            answer(&config, embedder)
        }
        EmbedderKind::Local => answer_locally(&config),
    }
}

#[cfg(feature = "local-embeddings")]
fn answer_locally(config: &Config) -> Result<()> {
    let embedder = docrag::FastEmbedder::new().context("failed to load local embedding model")?;
    answer(config, embedder)
}

#[cfg(not(feature = "local-embeddings"))]
fn answer_locally(_config: &Config) -> Result<()> {
    anyhow::bail!("built without the local-embeddings feature")
}

fn answer(config: &Config, embedder: impl Embedder) -> Result<()> {
    let converter = CommandConverter::from_command_line(&config.converter)
        .context("failed to parse converter command")?;
    let generator = OllamaGenerator::new(&config.model_endpoint, config.generative_model.clone())
        .context("failed to build generation client")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    Pipeline::new(converter, embedder, generator)
        .run(config, &mut out)
        .with_context(|| format!("failed to answer from {}", config.document_path.display()))?;
    Ok(())
}
