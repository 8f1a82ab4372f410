//! Answer composition.
//!
//! Runs one question through search, the retrieval gate, prompt selection
//! and a single completion call.

use crate::rag::gate::RetrievalGate;
use crate::rag::types::AnswerResponse;
use crate::store::DocumentStore;
use rag_core::{AppError, AppResult};
use rag_llm::{LlmClient, LlmRequest};
use rag_prompt::{
    build_prompt, load_prompt, PromptDefinition, KNOWLEDGE_BASE_PROMPT_ID,
    TRAINING_DATA_PROMPT_ID,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Default number of candidates requested per question.
pub const DEFAULT_TOP_K: usize = 5;

/// The two prompt definitions an answer can be built from.
#[derive(Debug, Clone)]
pub struct AnswerPrompts {
    /// Used when the gate passes; receives `fact` and `question`
    pub knowledge_base: PromptDefinition,

    /// Used otherwise; receives `question` only
    pub training_data: PromptDefinition,
}

impl AnswerPrompts {
    /// Load both prompts, preferring overrides in `prompts_dir`.
    pub fn load(prompts_dir: Option<&Path>) -> AppResult<Self> {
        let knowledge_base = load_prompt(prompts_dir, KNOWLEDGE_BASE_PROMPT_ID)?;
        if !knowledge_base.context.include_knowledge_base {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' must set context.includeKnowledgeBase",
                KNOWLEDGE_BASE_PROMPT_ID
            )));
        }

        let training_data = load_prompt(prompts_dir, TRAINING_DATA_PROMPT_ID)?;
        if training_data.context.include_knowledge_base {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' must not include the knowledge base",
                TRAINING_DATA_PROMPT_ID
            )));
        }

        Ok(Self {
            knowledge_base,
            training_data,
        })
    }
}

/// Answers questions against a document store and a completion service.
///
/// Built once at startup and shared across requests.
pub struct AnswerComposer {
    store: Arc<dyn DocumentStore>,
    llm: Arc<dyn LlmClient>,
    prompts: AnswerPrompts,
    gate: RetrievalGate,
    top_k: usize,
    model: String,
}

impl AnswerComposer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        llm: Arc<dyn LlmClient>,
        prompts: AnswerPrompts,
        gate: RetrievalGate,
        model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            llm,
            prompts,
            gate,
            top_k: DEFAULT_TOP_K,
            model: model.into(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Answer one question.
    ///
    /// A failed search is logged and treated as no knowledge. A failed
    /// completion is returned as `AppError::Llm`.
    pub async fn answer(&self, question: &str) -> AppResult<AnswerResponse> {
        let hits = match self.store.search(question, self.top_k).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::error!("Document search failed, answering without knowledge: {}", e);
                Vec::new()
            }
        };

        let decision = self.gate.evaluate(&hits);

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());

        let grounding = decision.grounding();
        let built = match grounding {
            Some(best) => build_prompt(
                &self.prompts.knowledge_base,
                variables,
                Some(best.text.clone()),
            )?,
            None => build_prompt(&self.prompts.training_data, variables, None)?,
        };

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = self.llm.complete(&request).await.map_err(|e| {
            tracing::error!(provider = self.llm.provider_name(), "Completion failed: {}", e);
            match e {
                AppError::Llm(_) => e,
                other => AppError::Llm(other.to_string()),
            }
        })?;

        let answer = match grounding {
            Some(best) => {
                AnswerResponse::from_knowledge_base(response.content, &best.text, best.distance)
            }
            None => AnswerResponse::from_training_data(response.content),
        };

        tracing::info!(source = %answer.source, "Answered question");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::types::AnswerSource;
    use crate::types::{KnowledgeItem, SearchHit};
    use rag_llm::{LlmResponse, LlmUsage};
    use std::sync::Mutex;

    const ANTIGRAVITY: &str = "Google Antigravity is an AI-powered IDE developed by Google.";

    struct StubStore {
        result: Result<Vec<SearchHit>, String>,
    }

    impl StubStore {
        fn with_hits(hits: Vec<SearchHit>) -> Arc<Self> {
            Arc::new(Self { result: Ok(hits) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                result: Err("disk on fire".to_string()),
            })
        }
    }

    #[async_trait::async_trait]
    impl DocumentStore for StubStore {
        fn backend_name(&self) -> &str {
            "stub"
        }

        async fn add(&self, _item: &KnowledgeItem) -> AppResult<()> {
            Ok(())
        }

        async fn upsert(&self, _item: &KnowledgeItem) -> AppResult<()> {
            Ok(())
        }

        async fn search(&self, _query: &str, _top_k: usize) -> AppResult<Vec<SearchHit>> {
            self.result.clone().map_err(AppError::Knowledge)
        }

        async fn count(&self) -> AppResult<u64> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct StubLlm {
        fail: bool,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl StubLlm {
        fn last_request(&self) -> LlmRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for StubLlm {
        fn provider_name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(AppError::Llm("upstream 429".to_string()));
            }
            Ok(LlmResponse {
                content: "stub answer".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::new(1, 1),
                done: true,
            })
        }
    }

    fn composer(store: Arc<dyn DocumentStore>, llm: Arc<StubLlm>) -> AnswerComposer {
        AnswerComposer::new(
            store,
            llm,
            AnswerPrompts::load(None).unwrap(),
            RetrievalGate::default(),
            "test-model",
        )
    }

    #[tokio::test]
    async fn test_grounded_answer() {
        let llm = Arc::new(StubLlm::default());
        let store = StubStore::with_hits(vec![
            SearchHit::new("1", "Unrelated text", 1.3),
            SearchHit::new("2", ANTIGRAVITY, 0.1),
        ]);

        let response = composer(store, llm.clone())
            .answer("What is Google Antigravity?")
            .await
            .unwrap();

        assert_eq!(response.source, AnswerSource::KnowledgeBase);
        assert_eq!(response.matched_fact.as_deref(), Some(ANTIGRAVITY));
        assert_eq!(response.distance, Some(0.1));
        assert_eq!(response.answer, "stub answer");

        let request = llm.last_request();
        assert!(request.prompt.contains(ANTIGRAVITY));
        assert!(request.prompt.contains("What is Google Antigravity?"));
        assert!(request.system.unwrap().contains("authoritative"));
        assert_eq!(request.model, "test-model");
    }

    #[tokio::test]
    async fn test_empty_store_uses_training_data() {
        let llm = Arc::new(StubLlm::default());
        let response = composer(StubStore::with_hits(Vec::new()), llm.clone())
            .answer("What is the capital of France?")
            .await
            .unwrap();

        assert_eq!(response.source, AnswerSource::TrainingData);
        assert!(response.distance.is_none());
        assert!(response.matched_fact.is_none());

        let request = llm.last_request();
        assert_eq!(request.prompt, "What is the capital of France?");
        assert!(request.system.unwrap().contains("I don't know"));
    }

    #[tokio::test]
    async fn test_question_is_sent_verbatim() {
        let llm = Arc::new(StubLlm::default());
        composer(StubStore::with_hits(Vec::new()), llm.clone())
            .answer("Is it raining?\n\n")
            .await
            .unwrap();

        assert_eq!(llm.last_request().prompt, "Is it raining?\n\n");
    }

    #[tokio::test]
    async fn test_distant_fact_is_not_used() {
        let llm = Arc::new(StubLlm::default());
        let store = StubStore::with_hits(vec![SearchHit::new("1", ANTIGRAVITY, 0.9)]);

        let response = composer(store, llm.clone()).answer("Who won?").await.unwrap();

        assert_eq!(response.source, AnswerSource::TrainingData);
        assert!(!llm.last_request().prompt.contains(ANTIGRAVITY));
    }

    #[tokio::test]
    async fn test_search_failure_degrades_to_training_data() {
        let llm = Arc::new(StubLlm::default());
        let response = composer(StubStore::failing(), llm)
            .answer("anything")
            .await
            .unwrap();

        assert_eq!(response.source, AnswerSource::TrainingData);
    }

    #[tokio::test]
    async fn test_completion_failure_is_llm_error() {
        let llm = Arc::new(StubLlm {
            fail: true,
            ..StubLlm::default()
        });
        let store = StubStore::with_hits(vec![SearchHit::new("1", ANTIGRAVITY, 0.1)]);

        let result = composer(store, llm).answer("What is Google Antigravity?").await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_top_k_is_forwarded() {
        struct TopKStore(Mutex<Option<usize>>);

        #[async_trait::async_trait]
        impl DocumentStore for TopKStore {
            fn backend_name(&self) -> &str {
                "topk"
            }
            async fn add(&self, _item: &KnowledgeItem) -> AppResult<()> {
                Ok(())
            }
            async fn upsert(&self, _item: &KnowledgeItem) -> AppResult<()> {
                Ok(())
            }
            async fn search(&self, _query: &str, top_k: usize) -> AppResult<Vec<SearchHit>> {
                *self.0.lock().unwrap() = Some(top_k);
                Ok(Vec::new())
            }
            async fn count(&self) -> AppResult<u64> {
                Ok(0)
            }
        }

        let store = Arc::new(TopKStore(Mutex::new(None)));
        composer(store.clone(), Arc::new(StubLlm::default()))
            .with_top_k(3)
            .answer("q")
            .await
            .unwrap();

        assert_eq!(*store.0.lock().unwrap(), Some(3));
    }

    #[test]
    fn test_prompts_reject_swapped_override() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("answer.knowledge_base.yml"),
            "id: answer.knowledge_base\ntitle: Broken\napiVersion: \"1.0\"\ntemplate: \"{{question}}\"\n",
        )
        .unwrap();

        assert!(matches!(
            AnswerPrompts::load(Some(dir.path())),
            Err(AppError::Prompt(_))
        ));
    }
}
