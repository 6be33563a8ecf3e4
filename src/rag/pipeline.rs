// End-to-end RAG pipeline: retrieve -> build context -> prompt -> generate
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::errors::Result;
use crate::rag::context::{AssembledContext, ContextBuilder, PromptTemplate};
use crate::rag::passage::Passage;
use crate::rag::retrieval::HybridRetriever;
use crate::streaming::OllamaClient;

/// Text completion backend
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer, passing tokens to `on_token` as they arrive
    async fn generate(&self, prompt: String, on_token: &mut (dyn for<'a> FnMut(&'a str) + Send)) -> Result<String>;
}

#[async_trait]
impl AnswerGenerator for OllamaClient {
    async fn generate(&self, prompt: String, on_token: &mut (dyn for<'a> FnMut(&'a str) + Send)) -> Result<String> {
        self.generate_with(prompt, |token| on_token(token)).await
    }
}

/// Answer to one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub question: String,
    /// Passages handed to the model, in ranking order
    pub passages: Vec<Passage>,
    pub context: AssembledContext,
    pub answer: String,
}

/// End-to-end RAG pipeline
pub struct RagPipeline {
    retriever: HybridRetriever,
    generator: Arc<dyn AnswerGenerator>,
    context_builder: ContextBuilder,
    template: PromptTemplate,
    top_k: usize,
}

impl RagPipeline {
    pub fn new(retriever: HybridRetriever, generator: Arc<dyn AnswerGenerator>, top_k: usize) -> Self {
        Self {
            retriever,
            generator,
            context_builder: ContextBuilder::new(),
            template: PromptTemplate::academic(),
            top_k,
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Answer a question without streaming output
    pub async fn answer(&self, question: &str) -> Result<RagAnswer> {
        self.answer_streaming(question, &mut |_| {}).await
    }

    /// Answer a question, streaming generated tokens to `on_token`
    pub async fn answer_streaming(
        &self,
        question: &str,
        on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<RagAnswer> {
        let passages = self.retrieve(question).await?;
        self.answer_from(question, passages, on_token).await
    }

    /// Top `top_k` passages for a question, best first
    pub async fn retrieve(&self, question: &str) -> Result<Vec<Passage>> {
        Ok(self.retriever.retrieve(question, self.top_k).await?)
    }

    /// Generate the answer from passages already retrieved
    pub async fn answer_from(
        &self,
        question: &str,
        passages: Vec<Passage>,
        on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<RagAnswer> {
        let context = self.context_builder.build(&passages);
        debug!(
            passages = context.document_count,
            tokens = context.estimated_tokens,
            "context assembled"
        );

        let prompt = self.template.render(&context.text, question);
        let answer = self.generator.generate(prompt, on_token).await?;

        Ok(RagAnswer {
            question: question.to_string(),
            passages,
            context,
            answer,
        })
    }

    pub fn retriever(&self) -> &HybridRetriever {
        &self.retriever
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, ProviderError, RetrievalError};
    use crate::rag::retrieval::SimilaritySearch;
    use std::sync::Mutex;

    struct StaticSearch(Vec<Passage>);

    #[async_trait]
    impl SimilaritySearch for StaticSearch {
        async fn search(&self, _query: &str) -> std::result::Result<Vec<Passage>, ProviderError> {
            Ok(self.0.clone())
        }
    }

    struct DownSearch;

    #[async_trait]
    impl SimilaritySearch for DownSearch {
        async fn search(&self, _query: &str) -> std::result::Result<Vec<Passage>, ProviderError> {
            Err(ProviderError::msg("connection refused"))
        }
    }

    /// Records the prompt and answers with a fixed text, token by token
    #[derive(Default)]
    struct EchoGenerator {
        prompt: Mutex<Option<String>>,
    }

    #[async_trait]
    impl AnswerGenerator for EchoGenerator {
        async fn generate(&self, prompt: String, on_token: &mut (dyn for<'a> FnMut(&'a str) + Send)) -> Result<String> {
            *self.prompt.lock().unwrap() = Some(prompt);
            on_token("Cuatro ");
            on_token("créditos.");
            Ok("Cuatro créditos.".to_string())
        }
    }

    #[tokio::test]
    async fn test_prompt_contains_reranked_context() {
        let search = StaticSearch(vec![
            Passage::new("1", "Cálculo I, créditos 3", "calculo.pdf"),
            Passage::new("2", "Investigación Operativa, créditos 4", "io.pdf"),
        ]);
        let generator = Arc::new(EchoGenerator::default());
        let pipeline = RagPipeline::new(HybridRetriever::new(Arc::new(search)), generator.clone(), 1);

        let result = pipeline.answer("créditos de investigación operativa").await.unwrap();

        assert_eq!(result.passages.len(), 1);
        assert_eq!(result.passages[0].id, "2");
        assert_eq!(result.context.sources, vec!["io.pdf"]);
        assert_eq!(result.answer, "Cuatro créditos.");

        let prompt = generator.prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Investigación Operativa, créditos 4"));
        assert!(!prompt.contains("Cálculo I"));
    }

    #[tokio::test]
    async fn test_streaming_forwards_tokens() {
        let search = StaticSearch(vec![Passage::new("1", "texto", "a.pdf")]);
        let pipeline = RagPipeline::new(
            HybridRetriever::new(Arc::new(search)),
            Arc::new(EchoGenerator::default()),
            3,
        );

        let mut streamed = String::new();
        pipeline
            .answer_streaming("pregunta", &mut |t| streamed.push_str(t))
            .await
            .unwrap();
        assert_eq!(streamed, "Cuatro créditos.");
    }

    /// Emits tokens that live only for the duration of each call
    struct OwnedTokenGenerator;

    #[async_trait]
    impl AnswerGenerator for OwnedTokenGenerator {
        async fn generate(&self, _prompt: String, on_token: &mut (dyn for<'a> FnMut(&'a str) + Send)) -> Result<String> {
            let mut answer = String::new();
            for part in ["Ética ", "y ", "Deontología"] {
                let token = part.to_string();
                on_token(&token);
                answer.push_str(&token);
            }
            Ok(answer)
        }
    }

    #[tokio::test]
    async fn test_streaming_accepts_short_lived_tokens() {
        let search = StaticSearch(vec![Passage::new("1", "Ética y Deontología, ciclo VIII", "etica.pdf")]);
        let pipeline = RagPipeline::new(HybridRetriever::new(Arc::new(search)), Arc::new(OwnedTokenGenerator), 3);

        let mut tokens: Vec<String> = Vec::new();
        let result = pipeline
            .answer_streaming("ciclo de ética", &mut |t| tokens.push(t.to_string()))
            .await
            .unwrap();

        assert_eq!(tokens, vec!["Ética ", "y ", "Deontología"]);
        assert_eq!(result.answer, "Ética y Deontología");
    }

    #[tokio::test]
    async fn test_retrieval_failure_skips_generation() {
        let generator = Arc::new(EchoGenerator::default());
        let pipeline = RagPipeline::new(HybridRetriever::new(Arc::new(DownSearch)), generator.clone(), 3);

        let err = pipeline.answer("redes").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Retrieval(RetrievalError::RetrievalUnavailable { .. })
        ));
        assert!(generator.prompt.lock().unwrap().is_none());
    }
}
