//! Integration tests for hybrid retrieval
//!
//! Exercises the public retrieval API against an in-memory similarity search,
//! without Ollama or Qdrant running.

use async_trait::async_trait;
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use silabo_rag::{
    rag::{RankTier, SpecificTermVocabulary},
    HybridRetriever, KeywordExtractor, Passage, ProviderError, RetrievalError, SimilaritySearch,
};

/// Returns a fixed candidate list and counts calls
struct InMemorySearch {
    passages: Vec<Passage>,
    calls: AtomicUsize,
}

impl InMemorySearch {
    fn new(contents: &[&str]) -> Self {
        Self::from_contents(contents.iter().map(|c| c.to_string()).collect())
    }

    fn from_contents(contents: Vec<String>) -> Self {
        let passages = contents
            .into_iter()
            .enumerate()
            .map(|(i, content)| Passage::new(i.to_string(), content, format!("silabus/doc{}.pdf", i)))
            .collect();
        Self {
            passages,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SimilaritySearch for InMemorySearch {
    async fn search(&self, _query: &str) -> Result<Vec<Passage>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.passages.clone())
    }
}

struct TimedOutSearch;

#[async_trait]
impl SimilaritySearch for TimedOutSearch {
    async fn search(&self, _query: &str) -> Result<Vec<Passage>, ProviderError> {
        Err(ProviderError::msg("qdrant search timed out"))
    }
}

fn ids(passages: &[Passage]) -> Vec<&str> {
    passages.iter().map(|p| p.id.as_str()).collect()
}

#[tokio::test]
async fn test_course_name_query_promotes_exact_course() {
    let search = Arc::new(InMemorySearch::new(&[
        "Matemática Discreta. Créditos: 4. Evaluación continua.",
        "Estadística aplicada. Créditos: 3.",
        "Programación I. Sumilla del curso.",
        "INVESTIGACIÓN OPERATIVA. Programación lineal y método simplex.",
        "Física General. Laboratorio semanal.",
    ]));
    let retriever = HybridRetriever::new(search.clone());

    let result = retriever.retrieve("investigación operativa", 3).await.unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result[0].id, "3");
    assert_eq!(search.calls.load(Ordering::SeqCst), 1);

    let ranked = retriever.retrieve_ranked("investigación operativa", 3).await.unwrap();
    assert_eq!(ranked[0].tier, RankTier::SpecificTerm);
    assert!(ranked[0].final_score() >= 1000.0);
    assert_eq!(ranked[0].semantic_rank, 3);
}

#[tokio::test]
async fn test_semantic_order_blended_with_keywords() {
    // A: 1 of 5 keywords -> 1.0 + 0.1, B: 0.5, C: 0.33
    let search = Arc::new(InMemorySearch::new(&[
        "El curso usa laboratorios",
        "Sumilla general",
        "Bibliografía básica",
    ]));
    let retriever = HybridRetriever::new(search);

    let ranked = retriever
        .retrieve_ranked("cuántos laboratorios tiene álgebra lineal", 2)
        .await
        .unwrap();

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].passage.id, "0");
    assert_eq!(ranked[1].passage.id, "1");
    assert!((ranked[0].final_score() - 1.1).abs() < 1e-9);
    assert!((ranked[1].final_score() - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_query_without_keywords_keeps_provider_order() {
    let search = Arc::new(InMemorySearch::new(&["c", "b", "a", "ética"]));
    let retriever = HybridRetriever::new(search);

    let result = retriever.retrieve("¿y tú?", 2).await.unwrap();
    assert_eq!(ids(&result), vec!["0", "1"]);
}

#[tokio::test]
async fn test_custom_vocabulary_from_config_terms() {
    let terms = vec!["Termodinámica".to_string()];
    let search = Arc::new(InMemorySearch::new(&["Física I", "Química", "Termodinámica aplicada"]));
    let retriever = HybridRetriever::with_vocabulary(search, SpecificTermVocabulary::new(&terms));

    let ranked = retriever.retrieve_ranked("sílabo de termodinámica", 3).await.unwrap();
    assert_eq!(ranked[0].passage.id, "2");
    assert_eq!(ranked[0].tier, RankTier::SpecificTerm);
}

#[tokio::test]
async fn test_provider_failure_is_retrieval_unavailable() {
    let retriever = HybridRetriever::new(Arc::new(TimedOutSearch));

    let err = retriever.retrieve("redes", 5).await.unwrap_err();
    match err {
        RetrievalError::RetrievalUnavailable { source } => {
            assert_eq!(source.message(), "qdrant search timed out");
        }
        other => panic!("expected RetrievalUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_requests_skip_provider() {
    let search = Arc::new(InMemorySearch::new(&["redes"]));
    let retriever = HybridRetriever::new(search.clone());

    assert!(matches!(
        retriever.retrieve("redes", 0).await,
        Err(RetrievalError::InvalidRequest(_))
    ));
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_blank_query_returns_first_candidates() {
    let search = Arc::new(InMemorySearch::new(&["c", "b", "a"]));
    let retriever = HybridRetriever::new(search.clone());

    let result = retriever.retrieve("   ", 2).await.unwrap();
    assert_eq!(ids(&result), vec!["0", "1"]);
    assert_eq!(retriever.retrieve("", 5).await.unwrap().len(), 3);
    assert_eq!(search.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_empty_candidates() {
    let retriever = HybridRetriever::new(Arc::new(InMemorySearch::new(&[])));
    assert!(retriever.retrieve("gestión de calidad", 4).await.unwrap().is_empty());
}

const WORDS: &[&str] = &[
    "investigación",
    "Operativa",
    "ética",
    "redes",
    "cálculo",
    "créditos",
    "evaluación",
    "semana",
    "física",
    "datos",
    "de",
    "la",
];

/// Candidate contents, a query and k, all drawn from a small Spanish vocabulary
#[derive(Debug, Clone)]
struct Scenario {
    contents: Vec<String>,
    query: String,
    k: usize,
}

fn phrase(g: &mut Gen, max_words: usize) -> String {
    let n = 1 + usize::arbitrary(g) % max_words;
    (0..n)
        .map(|_| *g.choose(WORDS).unwrap_or(&"de"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Arbitrary for Scenario {
    fn arbitrary(g: &mut Gen) -> Self {
        let count = usize::arbitrary(g) % 9;
        Scenario {
            contents: (0..count).map(|_| phrase(g, 6)).collect(),
            query: phrase(g, 4),
            k: 1 + usize::arbitrary(g) % 10,
        }
    }
}

fn run(scenario: &Scenario, k: usize) -> Vec<silabo_rag::rag::RankedPassage> {
    let retriever = HybridRetriever::new(Arc::new(InMemorySearch::from_contents(scenario.contents.clone())));
    tokio_test::block_on(retriever.retrieve_ranked(&scenario.query, k)).unwrap()
}

#[quickcheck]
fn prop_truncation(scenario: Scenario) -> bool {
    run(&scenario, scenario.k).len() == scenario.k.min(scenario.contents.len())
}

#[quickcheck]
fn prop_specific_hits_rank_first(scenario: Scenario) -> bool {
    let vocabulary = SpecificTermVocabulary::default();
    let keywords = KeywordExtractor::new().extract(&scenario.query);
    let is_hit = |content: &str| {
        let lower = content.to_lowercase();
        keywords.iter().any(|kw| vocabulary.contains(kw) && lower.contains(kw.as_str()))
    };

    let ranked = run(&scenario, scenario.contents.len().max(1));
    let hits: Vec<bool> = ranked.iter().map(|r| is_hit(&r.passage.content)).collect();

    // once a non-hit appears no hit may follow
    hits.windows(2).all(|w| w[0] || !w[1])
}

#[quickcheck]
fn prop_equal_scores_keep_provider_order(scenario: Scenario) -> bool {
    let ranked = run(&scenario, scenario.contents.len().max(1));
    ranked.windows(2).all(|w| {
        w[0].final_score() != w[1].final_score() || w[0].semantic_rank < w[1].semantic_rank
    })
}

#[quickcheck]
fn prop_short_word_query_keeps_provider_order(scenario: Scenario) -> bool {
    let scenario = Scenario {
        query: "¿de la? y".to_string(),
        ..scenario
    };
    let ranked = run(&scenario, scenario.k);
    ranked.iter().enumerate().all(|(i, r)| r.semantic_rank == i)
}
