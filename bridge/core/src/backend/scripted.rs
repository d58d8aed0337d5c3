//! Scripted Generator
//!
//! Replays a fixed list of tokens through the hooks, optionally paced and
//! optionally failing part-way. Useful for tests and for exercising a reader
//! loop without a model server.

use std::time::Duration;

use async_trait::async_trait;

use super::traits::{GenerationRequest, TokenGenerator};
use crate::hooks::GenerationHooks;

/// Generator that emits a predetermined token sequence
#[derive(Clone, Debug, Default)]
pub struct ScriptedGenerator {
    tokens: Vec<String>,
    failure: Option<(usize, String)>,
    token_interval: Option<Duration>,
}

impl ScriptedGenerator {
    /// Create a generator that emits `tokens` in order
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Split `text` into word tokens, each keeping its trailing whitespace
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split_inclusive(char::is_whitespace))
    }

    /// Fail with `message` once `count` tokens have been emitted
    #[must_use]
    pub fn fail_after(mut self, count: usize, message: impl Into<String>) -> Self {
        self.failure = Some((count, message.into()));
        self
    }

    /// Emit one token per `interval`
    #[must_use]
    pub fn with_token_interval(mut self, interval: Duration) -> Self {
        self.token_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    /// The scripted tokens
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    fn failure_at(&self, index: usize) -> Option<&str> {
        match &self.failure {
            Some((count, message)) if *count == index => Some(message),
            _ => None,
        }
    }
}

#[async_trait]
impl TokenGenerator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
        hooks: &dyn GenerationHooks,
    ) -> anyhow::Result<String> {
        let mut pacing = self.token_interval.map(tokio::time::interval);
        let mut text = String::new();

        for (index, token) in self.tokens.iter().enumerate() {
            if let Some(message) = self.failure_at(index) {
                anyhow::bail!("{message}");
            }
            if let Some(interval) = pacing.as_mut() {
                interval.tick().await;
            }
            hooks.on_token(token);
            text.push_str(token);
        }

        if let Some((count, message)) = &self.failure {
            if *count >= self.tokens.len() {
                anyhow::bail!("{message}");
            }
        }

        Ok(text)
    }
}
