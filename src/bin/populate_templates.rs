//! Seeds the default meme templates into the configured database.
//!
//! Run once after deployment: `cargo run --bin populate_templates`.

use meme_generator_api::{config::Config, errors::AppError, seed, startup};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "meme_generator_api=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let store = startup::open_store(&config)?;

    let created = seed::populate_templates(&store).await?;
    tracing::info!(created, "Successfully populated meme templates.");
    Ok(())
}
