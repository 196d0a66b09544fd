use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, trace, warn};

use crate::config::AppConfig;
use crate::db::Database;
use crate::error::{ChatError, Result};
use crate::inference::{InferenceGateway, InferenceRequest};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{ChatMessage, Document, Member, MessageField, Page, PageRequest, RequestOrigin};
use crate::permission::can_delete;
use crate::schema::aigc_chat_messages as cols;
use crate::store::MessageStore;
use crate::validation::{truncate_chars, InputValidator};

/// Request-handling knobs taken from the application config
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub page_size: u32,
    pub require_login: bool,
    pub qa_path: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ChatSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_size: config.pagination.page_size,
            require_login: config.auth.require_login,
            qa_path: config.inference.qa_path.clone(),
        }
    }
}

/// Listing returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct MessageListing {
    pub doc_id: i64,
    pub page: Page<ChatMessage>,
}

/// Orchestrates the message store and the inference gateway per request
pub struct ChatService {
    store: MessageStore,
    gateway: Arc<dyn InferenceGateway>,
    settings: ChatSettings,
    metrics: MetricsCollector,
}

impl ChatService {
    pub fn new(db: Database, gateway: Arc<dyn InferenceGateway>, settings: ChatSettings) -> Self {
        Self {
            store: MessageStore::new(db),
            gateway,
            settings,
            metrics: MetricsCollector::default(),
        }
    }

    pub const fn store(&self) -> &MessageStore {
        &self.store
    }

    pub const fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub const fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Page through a document's messages
    pub fn list_messages(
        &self,
        document_id: i64,
        page: PageRequest,
        viewer: Option<&Member>,
    ) -> Result<MessageListing> {
        let page_size = self.settings.page_size;
        let messages = self
            .store
            .query_by_document(document_id, page, page_size, viewer)?;
        Ok(MessageListing {
            doc_id: document_id,
            page: Page::from_messages(messages, page_size),
        })
    }

    /// Ask a question about a document.
    ///
    /// `api` overrides the question-answering sub-path.
    pub async fn chat(
        &self,
        document_id: i64,
        prompt: &str,
        api: Option<&str>,
        viewer: Option<&Member>,
        origin: &RequestOrigin,
    ) -> Result<ChatMessage> {
        let path = match api.filter(|p| !p.is_empty()) {
            Some(path) => {
                InputValidator::validate_api_path(path)?;
                path
            }
            None => self.settings.qa_path.as_str(),
        };
        info!(document_id, prompt, "Chat prompt received");

        self.require_login(viewer)?;
        let document = self.load_document(document_id)?;
        let request = InferenceRequest::Question {
            input: document.markdown.clone(),
            question: prompt.to_string(),
        };
        self.converse(&document, prompt, path, &request, viewer, origin)
            .await
    }

    /// Run a named analysis over a document; `api` is both the sub-path and the stored content
    pub async fn analyze(
        &self,
        document_id: i64,
        api: &str,
        viewer: Option<&Member>,
        origin: &RequestOrigin,
    ) -> Result<ChatMessage> {
        InputValidator::validate_api_path(api)?;
        info!(document_id, api, "Document analysis requested");

        self.require_login(viewer)?;
        let document = self.load_document(document_id)?;
        let request = InferenceRequest::Analyze {
            data: document.markdown.clone(),
        };
        self.converse(&document, api, api, &request, viewer, origin)
            .await
    }

    /// Delete a message when the viewer authored it or moderates its book
    pub fn delete_message(&self, message_id: i64, viewer: Option<&Member>) -> Result<()> {
        let message = self.store.find_by_id(message_id)?;
        let document = self.load_document(message.document_id)?;

        let role = viewer.and_then(|member| {
            self.store
                .database()
                .resolve_role(document.book_id, member.member_id)
        });
        if !can_delete(&message, viewer.map(|member| member.member_id), role) {
            return Err(ChatError::denied("No permission to delete this message"));
        }

        if self.store.delete(message_id)? {
            self.metrics.record_message_deleted();
            info!(message_id, "Chat message deleted");
        }
        Ok(())
    }

    fn require_login(&self, viewer: Option<&Member>) -> Result<()> {
        if self.settings.require_login && viewer.is_none() {
            return Err(ChatError::denied("Please log in before chatting"));
        }
        Ok(())
    }

    fn load_document(&self, document_id: i64) -> Result<Document> {
        self.store
            .database()
            .find_document(document_id)?
            .ok_or_else(|| ChatError::not_found("Document does not exist"))
    }

    /// Store the user's side first, then attach whatever the service answers.
    async fn converse(
        &self,
        document: &Document,
        content: &str,
        path: &str,
        request: &InferenceRequest,
        viewer: Option<&Member>,
        origin: &RequestOrigin,
    ) -> Result<ChatMessage> {
        let mut message = build_message(document, content, viewer, origin);
        if let Err(e) = self.store.insert(&mut message) {
            error!(document_id = document.document_id, error = %e, "Failed to insert chat message");
            return Err(e);
        }
        self.metrics.record_message_created();

        let timer = OperationTimer::new("inference");
        let outcome = self.gateway.invoke(path, request).await;
        self.metrics
            .record_inference(request.shape(), timer.elapsed(), outcome.is_ok());

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                error!(
                    message_id = message.message_id,
                    error = %e,
                    "Failed to call inference server; message kept without response"
                );
                return Err(e);
            }
        };
        trace!(message_id = message.message_id, %response, "Inference result");

        let stored = truncate_chars(&response, cols::RESPONSE_MAX);
        if stored.len() < response.len() {
            warn!(message_id = message.message_id, "Inference response exceeds column size");
        }
        message.response = stored.to_string();
        self.store
            .update_partial(&message, &[MessageField::Response])?;
        Ok(message)
    }
}

fn build_message(
    document: &Document,
    content: &str,
    viewer: Option<&Member>,
    origin: &RequestOrigin,
) -> ChatMessage {
    let mut message = ChatMessage::new(document.document_id, content);
    if let Some(member) = viewer {
        message.author = member.display_name().to_string();
        message.member_id = member.member_id;
    }
    message.ip_address.clone_from(&origin.ip_address);
    message.user_agent.clone_from(&origin.user_agent);
    message
}
