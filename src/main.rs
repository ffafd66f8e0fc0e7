//! Tour Planner server entry point.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use tour_planner::adapters::ai::{GeminiConfig, GeminiProvider, GroqConfig, GroqProvider};
use tour_planner::adapters::http::{api_router, PlanHandlers};
use tour_planner::adapters::storage::InMemoryPlanRepository;
use tour_planner::application::handlers::plan::{
    CreatePlanHandler, DeletePlanHandler, ListPlansHandler,
};
use tour_planner::application::{
    ChainedPlanGenerator, EnsembleBudgetEstimator, GeneratorSettings, PlanPipeline,
    StructuredModelClient,
};
use tour_planner::config::{AiConfig, AppConfig, LogFormat};
use tour_planner::ports::{PlanRepository, ProviderId};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let client = Arc::new(build_client(&config.ai)?);

    let generator = ChainedPlanGenerator::new(
        client.clone(),
        GeneratorSettings {
            provider: config.ai.chain_provider_id(),
            planning_model: config.ai.planning_model.clone(),
            generation_model: config.ai.generation_model.clone(),
            text_policy: config.ai.plan_text_policy,
        },
    );

    let mut estimator = EnsembleBudgetEstimator::new(client, config.ai.ensemble_members()?)
        .with_currency(config.ai.currency.clone())
        .with_quorum(config.ai.quorum_policy()?);
    if let Some(timeout) = config.ai.member_timeout() {
        estimator = estimator.with_member_timeout(timeout);
    }

    let pipeline = Arc::new(PlanPipeline::new(generator, estimator));
    let repository: Arc<dyn PlanRepository> = Arc::new(InMemoryPlanRepository::new());

    let handlers = PlanHandlers::new(
        Arc::new(CreatePlanHandler::new(pipeline, repository.clone())),
        Arc::new(ListPlansHandler::new(repository.clone())),
        Arc::new(DeletePlanHandler::new(repository)),
    );

    let app = api_router(handlers, &config.server);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        chain_provider = %config.ai.chain_provider,
        ensemble = %config.ai.ensemble_models,
        quorum = %config.ai.quorum,
        "Tour planner listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// RUST_LOG wins over the configured level.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    match config.server.log_format() {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).pretty().init(),
    }
}

/// Registers a provider for every configured API key.
fn build_client(ai: &AiConfig) -> Result<StructuredModelClient, Box<dyn std::error::Error>> {
    let mut client = StructuredModelClient::new();

    if let Some(key) = &ai.gemini_api_key {
        let provider = GeminiProvider::new(
            GeminiConfig::new(key.expose_secret().clone())
                .with_base_url(ai.gemini_base_url.clone())
                .with_timeout(ai.timeout())
                .with_max_retries(ai.max_retries),
        )?;
        client = client.with_provider(ProviderId::gemini(), Arc::new(provider));
    }

    if let Some(key) = &ai.groq_api_key {
        let provider = GroqProvider::new(
            GroqConfig::new(key.expose_secret().clone())
                .with_base_url(ai.groq_base_url.clone())
                .with_timeout(ai.timeout())
                .with_max_retries(ai.max_retries),
        )?;
        client = client.with_provider(ProviderId::groq(), Arc::new(provider));
    }

    Ok(client)
}
