//! Web chat interface: an embedded chat page backed by a small JSON API.

use crate::config::AppConfig;
use crate::core::conversation::{ConversationStore, ConversationTurn};
use crate::core::error::{LlmError, StoreError};
use crate::core::interface::Interface;
use crate::core::session::ChatSession;
use crate::core::settings::{Settings, SettingsManager};
use crate::types::{PromptFragment, Usage, UserPrompt};
use anyhow::Result;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

const CHAT_PAGE: &str = include_str!("chat.html");

type SharedSession = Arc<Mutex<ChatSession>>;

#[derive(Clone)]
pub struct WebState {
    config: Arc<AppConfig>,
    store: Arc<dyn ConversationStore>,
    sessions: Arc<Mutex<HashMap<Uuid, SharedSession>>>,
}

impl WebState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            config,
            store,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn session(&self, id: Uuid) -> Result<SharedSession, WebError> {
        self.sessions
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(WebError::ConversationNotFound(id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Conversation {0} not found")]
    ConversationNotFound(Uuid),

    #[error("Image fragments are not accepted over HTTP")]
    ImageNotAllowed,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::Llm(LlmError::Configuration(_))
            | WebError::Llm(LlmError::Preprocessing(_))
            | WebError::ImageNotAllowed => StatusCode::BAD_REQUEST,
            WebError::Llm(LlmError::ProviderApi { .. }) => StatusCode::BAD_GATEWAY,
            WebError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebError::ConversationNotFound(_) => StatusCode::NOT_FOUND,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub default_model: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// A string or a list of `{"text": ..}` fragments
    pub prompt: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: Uuid,
    pub response: String,
    pub usage: Usage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationView {
    pub conversation_id: Uuid,
    pub model_name: String,
    pub system_prompt: String,
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportResponse {
    pub key: String,
}

pub fn create_router(state: WebState, max_payload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/models", get(list_models))
        .route("/api/settings", get(get_settings).post(save_settings))
        .route("/api/chat", post(chat))
        .route(
            "/api/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/api/conversations/{id}/export", post(export_conversation))
        .layer(DefaultBodyLimit::max(max_payload_bytes))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

async fn list_models(State(state): State<WebState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.config.model_names(),
        default_model: state.config.default_model.clone(),
    })
}

async fn get_settings(State(state): State<WebState>) -> Result<Json<Settings>, WebError> {
    let mut settings = SettingsManager::load(&state.config.settings_file)?;
    if !state.config.model_names().contains(&settings.model) {
        settings.model = state.config.default_model.clone();
    }
    Ok(Json(settings))
}

async fn save_settings(
    State(state): State<WebState>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, WebError> {
    state.config.model_options(&settings.model)?;
    SettingsManager::save(&state.config.settings_file, &settings)?;
    info!("Saved settings (model: {})", settings.model);
    Ok(Json(settings))
}

async fn chat(
    State(state): State<WebState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, WebError> {
    let prompt = UserPrompt::try_from(request.prompt).map_err(LlmError::from)?;
    // Image paths would be read from the server's filesystem.
    if prompt
        .fragments()
        .iter()
        .any(|fragment| matches!(fragment, PromptFragment::Image(_)))
    {
        return Err(WebError::ImageNotAllowed);
    }

    let (conversation_id, session) = match request.conversation_id {
        Some(id) => (id, state.session(id).await?),
        None => {
            let model = request
                .model
                .clone()
                .unwrap_or_else(|| state.config.default_model.clone());
            let system_prompt = request
                .system_prompt
                .clone()
                .unwrap_or_else(|| state.config.system_prompt.clone());
            let session = Arc::new(Mutex::new(ChatSession::new(
                &state.config,
                &model,
                &system_prompt,
            )?));
            let id = Uuid::new_v4();
            state.sessions.lock().await.insert(id, session.clone());
            info!("Started conversation {} with {}", id, model);
            (id, session)
        }
    };

    let mut session = session.lock().await;
    if let Some(model) = &request.model {
        session.switch_model(&state.config, model)?;
    }
    if let Some(system_prompt) = &request.system_prompt {
        session.set_system_prompt(system_prompt);
    }

    let (response, usage) = session.send(&prompt).await?;
    Ok(Json(ChatResponse {
        conversation_id,
        response,
        usage,
    }))
}

async fn get_conversation(
    State(state): State<WebState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationView>, WebError> {
    let session = state.session(id).await?;
    let session = session.lock().await;
    Ok(Json(ConversationView {
        conversation_id: id,
        model_name: session.model_name().to_string(),
        system_prompt: session.system_prompt().to_string(),
        turns: session.conversation().turns().to_vec(),
    }))
}

async fn delete_conversation(
    State(state): State<WebState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, WebError> {
    state
        .sessions
        .lock()
        .await
        .remove(&id)
        .ok_or(WebError::ConversationNotFound(id))?;
    info!("Closed conversation {}", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn export_conversation(
    State(state): State<WebState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExportResponse>, WebError> {
    let export = state.session(id).await?.lock().await.export();
    let key = state.store.put(&export).await?;
    Ok(Json(ExportResponse { key }))
}

pub struct WebInterface {
    config: Arc<AppConfig>,
    state: WebState,
    listener: Option<TcpListener>,
}

impl WebInterface {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            state: WebState::new(config.clone(), store),
            config,
            listener: None,
        }
    }
}

#[async_trait::async_trait]
impl Interface for WebInterface {
    async fn init(&mut self) -> Result<()> {
        let address = format!("{}:{}", self.config.web.host, self.config.web.port);
        let listener = TcpListener::bind(&address).await?;
        info!("Web interface listening on http://{}", listener.local_addr()?);
        self.listener = Some(listener);
        Ok(())
    }

    async fn run(&mut self) -> Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("web interface used before init"))?;
        let router = create_router(self.state.clone(), self.config.web.max_payload_bytes);

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for shutdown signal: {}", e);
                }
            })
            .await?;
        Ok(())
    }

    async fn cleanup(&mut self) -> Result<()> {
        info!("Web interface stopped");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "web"
    }
}
