use crate::gateway::{GatewayError, TranslationGateway};
use crate::history::{ChatRecord, ChatRecordInput, HistoryStore};
use crate::language;
use crate::prompt::build_translation_prompt;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const EMPTY_TEXT_MESSAGE: &str = "Please enter some text to translate.";
pub const MISSING_OWNER_MESSAGE: &str = "A signed-in user is required.";
pub const PERSISTENCE_MESSAGE: &str =
    "Your translation is ready, but it could not be saved to your chat history. Please try again later.";

/// One submission from a signed-in user.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub owner_id: String,
    pub source_text: String,
    /// `None` means the default language
    pub target_language: Option<String>,
}

/// A completed, persisted translation.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub chat: ChatRecord,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("source text is empty")]
    EmptySourceText,

    #[error("owner id is missing")]
    MissingOwner,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The provider answered but the record could not be written.
    /// The translation is kept so the caller can still show it.
    #[error("failed to save translation to history: {error:#}")]
    Persistence {
        translation: String,
        error: anyhow::Error,
    },
}

impl GenerateError {
    /// Rejected before any outbound call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GenerateError::EmptySourceText | GenerateError::MissingOwner
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            GenerateError::EmptySourceText => EMPTY_TEXT_MESSAGE.to_string(),
            GenerateError::MissingOwner => MISSING_OWNER_MESSAGE.to_string(),
            GenerateError::Gateway(e) => e.user_message(),
            GenerateError::Persistence { .. } => PERSISTENCE_MESSAGE.to_string(),
        }
    }

    /// Translation that was computed before the failure, if any.
    pub fn translation(&self) -> Option<&str> {
        match self {
            GenerateError::Persistence { translation, .. } => Some(translation),
            _ => None,
        }
    }
}

/// Runs validate → prompt → translate → persist for one request.
///
/// Requests share nothing but the store; each call is independent.
#[derive(Clone)]
pub struct Orchestrator {
    gateway: Arc<dyn TranslationGateway>,
    store: Arc<dyn HistoryStore>,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn TranslationGateway>, store: Arc<dyn HistoryStore>) -> Self {
        Self { gateway, store }
    }

    pub async fn generate(&self, request: GenerateRequest) -> Result<Generation, GenerateError> {
        if request.source_text.is_empty() {
            return Err(GenerateError::EmptySourceText);
        }
        if request.owner_id.trim().is_empty() {
            return Err(GenerateError::MissingOwner);
        }

        let target_language = language::resolve(request.target_language.as_deref());
        if !language::is_supported(&target_language) {
            info!("Passing unlisted target language through: {:?}", target_language);
        }

        let prompt = build_translation_prompt(&request.source_text, &target_language);

        info!(
            "Translating {} chars to {} for {} via {}",
            request.source_text.chars().count(),
            target_language,
            request.owner_id,
            self.gateway.model()
        );

        let text = self.gateway.translate(&prompt).await.map_err(|e| {
            warn!("Translation failed for {}: {}", request.owner_id, e);
            GenerateError::Gateway(e)
        })?;

        let input = ChatRecordInput::new(&request.owner_id, &request.source_text, &text);
        let chat = match self.store.create(input).await {
            Ok(chat) => chat,
            Err(e) => {
                error!(
                    "Translation for {} succeeded but saving it failed: {:#}",
                    request.owner_id, e
                );
                return Err(GenerateError::Persistence {
                    translation: text,
                    error: e,
                });
            }
        };

        info!("✓ Saved chat {} for {}", chat.id, chat.owner_id);
        Ok(Generation { text, chat })
    }

    /// Chat history of `owner_id`, newest first.
    pub async fn history(&self, owner_id: &str) -> anyhow::Result<Vec<ChatRecord>> {
        self.store.list_by_owner(owner_id).await
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }
}
