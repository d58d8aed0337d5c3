//! Generation Lifecycle Hooks
//!
//! Callback interface a generation backend drives while producing output.
//! [`TokenBridge`] implements it, so any backend written against
//! [`GenerationHooks`] can feed a pull-based reader.
//!
//! [`run_generation`] wraps one backend call so that `on_start` fires first
//! and exactly one of `on_end` / `on_error` fires last, whatever the backend
//! does in between.

use std::sync::Arc;

use crate::backend::{GenerationRequest, TokenGenerator};
use crate::streaming::TokenBridge;

/// Callbacks invoked by a generation backend
///
/// Implementations must not block: hooks run on the backend's own task.
pub trait GenerationHooks: Send + Sync {
    /// A generation run is about to produce its first token
    fn on_start(&self);

    /// A new token was generated
    fn on_token(&self, token: &str);

    /// The run completed successfully
    fn on_end(&self);

    /// The run failed
    fn on_error(&self, error: &anyhow::Error);
}

impl GenerationHooks for TokenBridge {
    fn on_start(&self) {
        self.start();
    }

    fn on_token(&self, token: &str) {
        self.push(token);
    }

    fn on_end(&self) {
        self.finish();
    }

    fn on_error(&self, error: &anyhow::Error) {
        // Alternate formatting keeps the context chain in the message.
        self.fail(format!("{error:#}"));
    }
}

impl<T: GenerationHooks + ?Sized> GenerationHooks for Arc<T> {
    fn on_start(&self) {
        (**self).on_start();
    }

    fn on_token(&self, token: &str) {
        (**self).on_token(token);
    }

    fn on_end(&self) {
        (**self).on_end();
    }

    fn on_error(&self, error: &anyhow::Error) {
        (**self).on_error(error);
    }
}

/// Run one generation, bracketing it with lifecycle hooks
///
/// Returns the backend's full response text. On failure the error is both
/// reported through `on_error` and returned to the caller.
///
/// # Errors
///
/// Returns whatever error the generator produced.
pub async fn run_generation<G>(
    generator: &G,
    request: &GenerationRequest,
    hooks: &dyn GenerationHooks,
) -> anyhow::Result<String>
where
    G: TokenGenerator + ?Sized,
{
    hooks.on_start();
    match generator.generate(request, hooks).await {
        Ok(text) => {
            hooks.on_end();
            Ok(text)
        }
        Err(e) => {
            tracing::warn!(backend = generator.name(), error = %e, "generation failed");
            hooks.on_error(&e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedGenerator;
    use crate::streaming::{Pulled, StreamEnd};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    /// Records every hook call in order
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl GenerationHooks for Recorder {
        fn on_start(&self) {
            self.calls.lock().push("start".to_string());
        }

        fn on_token(&self, token: &str) {
            self.calls.lock().push(format!("token:{token}"));
        }

        fn on_end(&self) {
            self.calls.lock().push("end".to_string());
        }

        fn on_error(&self, error: &anyhow::Error) {
            self.calls.lock().push(format!("error:{error}"));
        }
    }

    #[tokio::test]
    async fn test_run_generation_success_order() {
        let recorder = Recorder::default();
        let generator = ScriptedGenerator::new(["a", "b"]);

        let text = run_generation(&generator, &GenerationRequest::new("hi", "test"), &recorder)
            .await
            .unwrap();

        assert_eq!(text, "ab");
        assert_eq!(
            *recorder.calls.lock(),
            vec!["start", "token:a", "token:b", "end"]
        );
    }

    #[tokio::test]
    async fn test_run_generation_failure_ends_once() {
        let recorder = Recorder::default();
        let generator = ScriptedGenerator::new(["a", "b", "c"]).fail_after(1, "backend gone");

        let result =
            run_generation(&generator, &GenerationRequest::new("hi", "test"), &recorder).await;

        assert!(result.is_err());
        assert_eq!(
            *recorder.calls.lock(),
            vec!["start", "token:a", "error:backend gone"]
        );
    }

    #[tokio::test]
    async fn test_bridge_as_hooks() {
        let bridge = Arc::new(TokenBridge::new());
        let generator = ScriptedGenerator::new(["x"]).fail_after(1, "late failure");

        let _ = run_generation(&generator, &GenerationRequest::new("hi", "test"), &bridge).await;

        assert_eq!(bridge.pull(), Pulled::Token("x".to_string()));
        assert_eq!(
            bridge.pull(),
            Pulled::End(StreamEnd::Failed("late failure".to_string()))
        );
    }
}
