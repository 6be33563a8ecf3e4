//! Terminal output for the CLI: banner, retrieved chunks, ranked results,
//! progress bars

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::rag::passage::Passage;
use crate::rag::reranking::{RankTier, RankedPassage};

const RULE_WIDTH: usize = 60;

/// Show welcome banner
pub fn show_banner(version: &str, model: &str, passages: u64) {
    let rule = "=".repeat(RULE_WIDTH);
    println!("\n{}", rule.cyan());
    println!("{}", format!("  🎓 Asistente de Sílabos {}", version).bold().cyan());
    println!(
        "{}",
        format!("  Modelo: {} | Fragmentos indexados: {}", model, passages).dimmed()
    );
    println!("{}\n", rule.cyan());
    println!("Escribe tu pregunta ({} para terminar)\n", "salir".green());
}

/// Header line of one retrieved chunk, 1-based
pub fn chunk_header(position: usize, passage: &Passage) -> String {
    format!("[CHUNK {}] Fuente: {}", position, passage.source_label())
}

/// Print the passages handed to the model
pub fn show_chunks(passages: &[Passage]) {
    println!("\n{}", "📚 Fragmentos recuperados:".bold());
    for (i, passage) in passages.iter().enumerate() {
        println!("\n{}", chunk_header(i + 1, passage).yellow());
        println!("{}", passage.content.trim());
    }
    println!("{}", "─".repeat(RULE_WIDTH).dimmed());
}

/// Score breakdown of one ranked passage
pub fn ranked_line(ranked: &RankedPassage) -> String {
    let tier = match ranked.tier {
        RankTier::SpecificTerm => "término",
        RankTier::Semantic => "semántico",
    };
    format!(
        "score {:.3} (kw {:.2}, sem #{}, {})",
        ranked.final_score(),
        ranked.keyword_score,
        ranked.semantic_rank + 1,
        tier
    )
}

/// Print re-ranked search results as chunks with their scores
pub fn show_ranked(ranked: &[RankedPassage]) {
    if ranked.is_empty() {
        println!("{}", "Sin resultados.".yellow());
        return;
    }

    for (i, item) in ranked.iter().enumerate() {
        let header = chunk_header(i + 1, &item.passage);
        match item.tier {
            RankTier::SpecificTerm => println!("\n{}  {}", header.green(), ranked_line(item).dimmed()),
            RankTier::Semantic => println!("\n{}  {}", header.yellow(), ranked_line(item).dimmed()),
        }
        println!("{}", item.passage.content.trim());
    }
}

/// Print the distinct sources an answer was built from
pub fn show_sources(sources: &[String]) {
    if sources.is_empty() {
        return;
    }
    println!("\n{} {}", "📄 Fuentes:".bold(), sources.join(", "));
}

pub fn show_answer_header() {
    println!("\n{}", "💬 Respuesta:".bold().cyan());
}

pub fn show_error(message: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), message);
}

pub fn show_success(message: &str) {
    println!("{} {}", "✅".green(), message);
}

/// Progress bar for passage indexing
pub fn ingest_progress(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.cyan} Indexando [{bar:40.cyan/blue}] {pos}/{len} fragmentos ({eta})")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}
