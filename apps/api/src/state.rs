use crate::config::Config;
use crate::history::store::HistoryStore;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum
/// extractors. No other cross-request mutable state exists; requests stay
/// independent and the LLM provider is called without any serialization.
#[derive(Clone)]
pub struct AppState {
    pub history: HistoryStore,
    pub llm: LlmClient,
    pub config: Config,
}
