//! Application wiring.
//!
//! Builds adapters, handlers and the HTTP router from `AppConfig`. The binary
//! and the integration tests share these functions.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use secrecy::Secret;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::assistant::{OpenAIAssistantClient, OpenAIAssistantConfig};
use crate::adapters::http::{relay_router, RelayAppState};
use crate::adapters::storage::{FileContactStore, InMemorySessionStore};
use crate::application::{AssistantResolver, PollPolicy, ProvisionSettings, RelayMessageHandler};
use crate::config::{AppConfig, AssistantConfig, ServerConfig, StorageConfig};
use crate::domain::foundation::{AssistantId, ValidationError};
use crate::ports::{AssistantApi, AssistantApiError, ContactStore};

/// Creates the OpenAI client described by `config`.
pub fn assistant_client(config: &AssistantConfig) -> Result<OpenAIAssistantClient, AssistantApiError> {
    let api_key = config
        .api_key
        .clone()
        .unwrap_or_else(|| Secret::new(String::new()));

    OpenAIAssistantClient::new(
        OpenAIAssistantConfig::from_secret(api_key)
            .with_base_url(&config.base_url)
            .with_timeout(config.timeout()),
    )
}

/// Creates the file-backed contact ledger described by `config`.
pub fn contact_store(config: &StorageConfig) -> FileContactStore {
    FileContactStore::new(config.contacts_path()).with_mode(config.ledger_mode)
}

/// Builds the relay handler and assistant resolver over the given ports.
///
/// Sessions live in memory, bounded by the relay's idle TTL and capacity.
pub fn build_state(
    config: &AppConfig,
    api: Arc<dyn AssistantApi>,
    contacts: Arc<dyn ContactStore>,
) -> Result<RelayAppState, ValidationError> {
    let settings = ProvisionSettings::from_config(&config.assistant, &config.storage);
    let mut resolver = AssistantResolver::new(api.clone(), settings);
    if let Some(id) = config.assistant.fixed_assistant_id() {
        resolver = resolver.with_fixed_assistant(AssistantId::new(id)?);
    }
    let resolver = Arc::new(resolver);

    let relay = RelayMessageHandler::new(
        api,
        contacts,
        Arc::new(
            InMemorySessionStore::new()
                .with_idle_ttl(config.relay.session_idle_ttl())
                .with_capacity(config.relay.max_sessions),
        ),
        resolver.clone(),
        PollPolicy::from(&config.relay),
    )
    .with_resume_before_send(config.relay.resume_before_send);

    Ok(RelayAppState::new(Arc::new(relay), resolver))
}

/// Relay routes with request tracing and CORS applied.
pub fn router(config: &ServerConfig, state: RelayAppState) -> Router {
    relay_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(config)),
    )
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
