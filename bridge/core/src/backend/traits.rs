//! Generation Backend Traits
//!
//! A [`TokenGenerator`] produces a response by calling
//! [`GenerationHooks::on_token`] for every token, the way callback-based LLM
//! clients do. It does not call `on_start`, `on_end` or `on_error` itself;
//! [`run_generation`](crate::hooks::run_generation) brackets each call so a
//! run always terminates exactly once.

use async_trait::async_trait;

use crate::hooks::GenerationHooks;

/// Parameters for one generation request
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    /// The prompt/message to send
    pub prompt: String,
    /// Model to use (backend-specific identifier)
    pub model: String,
    /// Maximum tokens in response (0 = backend default)
    pub max_tokens: u32,
    /// Temperature (0.0-1.0, higher = more creative)
    pub temperature: f32,
    /// System prompt (optional, prepended to the prompt)
    pub system: Option<String>,
    /// Conversation context (previous messages)
    pub context: Option<String>,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: String::new(),
            max_tokens: 0,
            temperature: 0.7,
            system: None,
            context: None,
        }
    }
}

impl GenerationRequest {
    /// Create a new request with prompt and model
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    /// Set system prompt
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set context
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Full prompt text: system, then context, then the prompt itself
    #[must_use]
    pub fn full_prompt(&self) -> String {
        let mut full_prompt = String::new();

        if let Some(ref system) = self.system {
            full_prompt.push_str(system);
            full_prompt.push_str("\n\n");
        }

        if let Some(ref context) = self.context {
            full_prompt.push_str(context);
            full_prompt.push('\n');
        }

        full_prompt.push_str(&self.prompt);
        full_prompt
    }
}

/// A callback-driven token producer
#[async_trait]
pub trait TokenGenerator: Send + Sync {
    /// Backend name for logs (e.g., "Ollama")
    fn name(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Generate a response, reporting each token through `hooks.on_token`
    ///
    /// Returns the complete response text.
    async fn generate(
        &self,
        request: &GenerationRequest,
        hooks: &dyn GenerationHooks,
    ) -> anyhow::Result<String>;
}
