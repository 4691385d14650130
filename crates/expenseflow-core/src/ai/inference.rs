//! Routed inference client
//!
//! Combines a backend, the model router and the prompt library. Stages ask
//! for a prompt by id; the client picks the model and timeout for the
//! prompt's task and turns an elapsed timeout into [`Error::Timeout`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model_router::{ModelRouter, TaskCategory};
use crate::prompts::{Prompt, PromptId, PromptLibrary};

use super::types::GenerateRequest;
use super::{AIBackend, AIClient};

pub struct InferenceClient {
    backend: Option<AIClient>,
    router: Arc<ModelRouter>,
    prompts: PromptLibrary,
}

impl InferenceClient {
    /// Build a client; every prompt is loaded now so rendering can't fail later
    pub fn new(
        backend: Option<AIClient>,
        router: Arc<ModelRouter>,
        prompts: PromptLibrary,
    ) -> Result<Self> {
        Ok(Self {
            backend,
            router,
            prompts: prompts.preload()?,
        })
    }

    /// Client with no backend: every call fails with `BackendUnavailable`
    pub fn disabled(router: Arc<ModelRouter>) -> Result<Self> {
        Self::new(None, router, PromptLibrary::embedded_only())
    }

    pub fn backend(&self) -> Option<&AIClient> {
        self.backend.as_ref()
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    pub fn prompt(&self, id: PromptId) -> Result<&Prompt> {
        self.prompts
            .cached(id)
            .ok_or_else(|| Error::NotFound(format!("prompt {}", id.as_str())))
    }

    /// Run one request for a task on the routed model
    pub async fn generate(&self, task: TaskCategory, request: GenerateRequest) -> Result<String> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| Error::BackendUnavailable("no inference backend configured".into()))?;

        let backend_id = self.router.backend_for_task(task);
        let config = self.router.backend_config(backend_id);
        let request = match request.temperature {
            Some(_) => request,
            None => request.with_temperature(config.temperature),
        };

        debug!(
            task = %task,
            backend = %backend_id,
            model = %config.model,
            "Inference call"
        );

        match tokio::time::timeout(config.timeout, backend.generate(&request, &config.model)).await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                operation: format!("{} inference", task),
                after: config.timeout,
            }),
        }
    }

    /// Render a prompt and run it for the prompt's task
    pub async fn generate_prompt(
        &self,
        id: PromptId,
        vars: &HashMap<&str, &str>,
    ) -> Result<String> {
        let prompt = self.prompt(id)?;
        let mut request = GenerateRequest::new(prompt.render_user(vars))
            .with_temperature(prompt.metadata.temperature);
        request.system = prompt.render_system(vars);

        self.generate(prompt.metadata.task(), request).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ai::MockBackend;
    use crate::model_router::{BackendConfig, RouterConfig};

    fn router(timeout: Duration) -> Arc<ModelRouter> {
        let config = RouterConfig {
            fast: BackendConfig {
                model: "small".to_string(),
                timeout,
                temperature: Some(0.2),
            },
            accurate: BackendConfig {
                model: "large".to_string(),
                timeout,
                temperature: Some(0.9),
            },
            ..Default::default()
        };
        Arc::new(ModelRouter::with_config(config))
    }

    fn client(mock: MockBackend, timeout: Duration) -> InferenceClient {
        InferenceClient::new(
            Some(AIClient::Mock(mock)),
            router(timeout),
            PromptLibrary::embedded_only(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_prompts_route_to_their_models() {
        let mock = MockBackend::new();
        let client = client(mock.clone(), Duration::from_secs(5));

        let mut vars = HashMap::new();
        vars.insert("text", "kahve");
        client
            .generate_prompt(PromptId::ParseExpense, &vars)
            .await
            .unwrap();

        let vars = HashMap::new();
        client
            .generate_prompt(PromptId::RecommendStrategy, &vars)
            .await
            .unwrap();

        assert_eq!(mock.models_used(), vec!["small", "large"]);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_error() {
        let mock = MockBackend::new().with_delay(Duration::from_millis(500));
        let client = client(mock, Duration::from_millis(20));

        let err = client
            .generate(TaskCategory::Extract, GenerateRequest::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(err.is_backend_failure());
    }

    #[tokio::test]
    async fn test_disabled_client() {
        let client = InferenceClient::disabled(router(Duration::from_secs(1))).unwrap();
        let err = client
            .generate(TaskCategory::Recommend, GenerateRequest::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable(_)));
    }
}
