//! Doctor command for system diagnostics
//!
//! Checks everything a question needs: Ollama up, models pulled, syllabi on
//! disk and the Qdrant collection populated.

use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::index::PassageIndex;
use crate::streaming::OllamaClient;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

/// Doctor diagnostics system
pub struct Doctor<'a> {
    ollama: &'a OllamaClient,
    index: &'a PassageIndex,
    syllabus_dir: PathBuf,
}

impl<'a> Doctor<'a> {
    pub fn new(ollama: &'a OllamaClient, index: &'a PassageIndex, syllabus_dir: impl Into<PathBuf>) -> Self {
        Self {
            ollama,
            index,
            syllabus_dir: syllabus_dir.into(),
        }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let mut checks = Vec::new();

        let ollama = self.check_ollama_api().await;
        let ollama_up = ollama.status == HealthStatus::Pass;
        checks.push(ollama);

        if ollama_up {
            checks.push(self.check_models().await);
        } else {
            checks.push(HealthCheck::new(
                "Models",
                HealthStatus::Warn("skipped, Ollama unreachable".to_string()),
            ));
        }

        checks.push(check_syllabus_dir(&self.syllabus_dir));
        checks.push(self.check_index().await);

        checks
    }

    async fn check_ollama_api(&self) -> HealthCheck {
        let status = match self.ollama.health_check().await {
            Ok(true) => HealthStatus::Pass,
            Ok(false) => HealthStatus::Fail(format!("Ollama not reachable at {}", self.ollama.base_url())),
            Err(e) => HealthStatus::Fail(format!("Error checking Ollama: {}", e)),
        };
        HealthCheck::new("Ollama API", status)
    }

    async fn check_models(&self) -> HealthCheck {
        let status = match self.ollama.list_models().await {
            Ok(installed) => {
                model_status(&installed, &[self.ollama.model(), self.ollama.embedding_model()])
            }
            Err(e) => HealthStatus::Fail(format!("Cannot list models: {}", e)),
        };
        HealthCheck::new("Models", status)
    }

    async fn check_index(&self) -> HealthCheck {
        let status = match self.index.count().await {
            Ok(0) => HealthStatus::Warn(format!(
                "collection '{}' is empty, run `silabo-rag ingest`",
                self.index.collection()
            )),
            Ok(_) => HealthStatus::Pass,
            Err(e) => HealthStatus::Fail(format!("Qdrant unavailable: {:#}", e)),
        };
        HealthCheck::new("Qdrant index", status)
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n🔍 silabo-rag diagnostics\n");
        println!("{:<20} Status", "Check");
        println!("{}", "=".repeat(50));

        for check in checks {
            let line = match &check.status {
                HealthStatus::Pass => format!("✅ {}", "PASS".green()),
                HealthStatus::Warn(msg) => format!("⚠️  {}", format!("WARN: {}", msg).yellow()),
                HealthStatus::Fail(msg) => format!("❌ {}", format!("FAIL: {}", msg).red()),
            };
            println!("{:<20} {}", check.name, line);
        }

        println!();
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

/// Installed names carry a tag (`llama3.1:latest`); a bare wanted name
/// matches any tag
fn model_status(installed: &[String], wanted: &[&str]) -> HealthStatus {
    let mut missing: Vec<&str> = wanted
        .iter()
        .copied()
        .filter(|want| {
            !installed
                .iter()
                .any(|have| have == want || have.split(':').next() == Some(want))
        })
        .collect();
    missing.dedup();

    if missing.is_empty() {
        HealthStatus::Pass
    } else {
        HealthStatus::Fail(format!("missing models: {} (ollama pull <model>)", missing.join(", ")))
    }
}

fn check_syllabus_dir(dir: &Path) -> HealthCheck {
    let status = match std::fs::read_dir(dir) {
        Ok(entries) => {
            let pdfs = entries
                .filter_map(|e| e.ok())
                .filter(|e| {
                    e.path()
                        .extension()
                        .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"))
                })
                .count();
            if pdfs == 0 {
                HealthStatus::Warn(format!("no PDF files in {}", dir.display()))
            } else {
                HealthStatus::Pass
            }
        }
        Err(_) => HealthStatus::Warn(format!("{} not found", dir.display())),
    };
    HealthCheck::new("Syllabus dir", status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_health_status_equality() {
        assert_eq!(HealthStatus::Pass, HealthStatus::Pass);
        assert_eq!(
            HealthStatus::Warn("test".to_string()),
            HealthStatus::Warn("test".to_string())
        );
        assert_ne!(HealthStatus::Pass, HealthStatus::Fail("test".to_string()));
    }

    #[test]
    fn test_overall_status_pass_with_warnings() {
        let checks = vec![
            HealthCheck::new("Test 1", HealthStatus::Pass),
            HealthCheck::new("Test 2", HealthStatus::Warn("warning".to_string())),
        ];
        assert!(Doctor::overall_status(&checks));
    }

    #[test]
    fn test_overall_status_fail() {
        let checks = vec![
            HealthCheck::new("Test 1", HealthStatus::Pass),
            HealthCheck::new("Test 2", HealthStatus::Fail("error".to_string())),
        ];
        assert!(!Doctor::overall_status(&checks));
    }

    #[test]
    fn test_model_status_matches_tags() {
        let installed = vec!["llama3.1:latest".to_string(), "nomic-embed-text:v1.5".to_string()];
        assert_eq!(model_status(&installed, &["llama3.1", "llama3.1"]), HealthStatus::Pass);
        assert_eq!(
            model_status(&installed, &["llama3.1:latest", "nomic-embed-text"]),
            HealthStatus::Pass
        );
    }

    #[test]
    fn test_model_status_reports_missing() {
        let installed = vec!["mistral:latest".to_string()];
        match model_status(&installed, &["llama3.1", "llama3.1"]) {
            HealthStatus::Fail(msg) => assert!(msg.contains("missing models: llama3.1 (")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_syllabus_dir_checks() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(check_syllabus_dir(temp.path()).status, HealthStatus::Warn(_)));

        std::fs::write(temp.path().join("redes.PDF"), b"%PDF-1.4").unwrap();
        assert_eq!(check_syllabus_dir(temp.path()).status, HealthStatus::Pass);

        let missing = temp.path().join("nope");
        assert!(matches!(check_syllabus_dir(&missing).status, HealthStatus::Warn(_)));
    }
}
