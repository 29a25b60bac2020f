// ABOUTME: Provider descriptor - identity of an OpenAI-compatible completion endpoint.
// ABOUTME: Owned by configuration and read-only to the orchestrator.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::transport::Endpoint;

/// Environment variable consulted by [`Provider::from_env`].
pub const API_KEY_ENV: &str = "QUIRE_API_KEY";

const COMPLETIONS_PATH: &str = "/chat/completions";

/// A language-model provider endpoint.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub model: String,
}

impl Provider {
    /// Create a provider with the required fields. The name defaults to the id.
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            base_url: base_url.into(),
            token: String::new(),
            model: String::new(),
        }
    }

    /// Create a provider whose token comes from the QUIRE_API_KEY environment variable.
    pub fn from_env(
        id: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let token =
            std::env::var(API_KEY_ENV).map_err(|_| ConfigError::MissingEnv(API_KEY_ENV))?;
        Ok(Self::new(id, base_url).token(token).model(model))
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Set the model requested from this provider.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Name for labels; falls back to the id when no name is configured.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// The chat-completions endpoint for this provider.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(completions_url(&self.base_url), self.token.clone())
    }
}

// Tokens must never reach logs.
impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("model", &self.model)
            .finish()
    }
}

/// `{base_url}/chat/completions`, tolerating trailing slashes and base URLs
/// that already name the completions path.
fn completions_url(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.ends_with(COMPLETIONS_PATH) {
        base.to_string()
    } else {
        format!("{}{}", base, COMPLETIONS_PATH)
    }
}

/// Find a provider by id. Blank ids never match.
pub fn find_provider<'a>(providers: &'a [Provider], id: Option<&str>) -> Option<&'a Provider> {
    let id = id.map(str::trim).filter(|id| !id.is_empty())?;
    providers.iter().find(|p| p.id == id)
}
