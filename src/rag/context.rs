// Context assembly and prompt rendering for syllabus questions
use serde::{Deserialize, Serialize};

use crate::rag::passage::Passage;

/// Assembled context for prompt augmentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledContext {
    /// Passage contents separated by blank lines
    pub text: String,
    pub document_count: usize,
    /// Rough token estimate (~4 chars per token)
    pub estimated_tokens: usize,
    /// Distinct source file names in first-seen order
    pub sources: Vec<String>,
}

/// Joins retrieved passages into the context block of the prompt
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder;

impl ContextBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build context from passages in ranking order
    pub fn build(&self, passages: &[Passage]) -> AssembledContext {
        let text = passages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut sources: Vec<String> = Vec::new();
        for passage in passages {
            let label = passage.source_label();
            if !sources.iter().any(|s| s == label) {
                sources.push(label.to_string());
            }
        }

        AssembledContext {
            estimated_tokens: text.chars().count() / 4,
            text,
            document_count: passages.len(),
            sources,
        }
    }
}

const ACADEMIC_PROMPT: &str = "\
Eres un asistente académico experto. Tu ÚNICA fuente de información es el contexto de sílabos proporcionado abajo.

INSTRUCCIONES:
1. Lee con cuidado el contexto (secciones de sílabos reales).
2. Busca la información sobre el curso o tema solicitado.
3. Extrae directamente del contexto, cuando exista:
   - Nombre exacto del curso y ciclo académico
   - Datos generales (créditos, horas, prerrequisitos)
   - Descripción, objetivos y resultados de aprendizaje
   - Metodología
   - Sistema de evaluación y fórmula del promedio final
   - Contenido programado por semanas
   - Bibliografía (básica y complementaria)
4. Si la pregunta es sobre un curso específico, busca su nombre en el contexto y extrae todos los detalles disponibles.
5. Responde SIEMPRE basándote en el contexto:
   - NO inventes información
   - Si algo no está en el contexto, dilo explícitamente
   - Cita la fuente (nombre del sílabo de origen)
6. Formato: claro y estructurado, con secciones (Datos generales, Evaluación, Contenido, etc.).

CONTEXTO DE LOS SÍLABOS:
─────────────────────────────────────────────────
{context}
─────────────────────────────────────────────────

PREGUNTA DEL USUARIO:
─────────────────────────────────────────────────
{question}
─────────────────────────────────────────────────

RESPUESTA (basada ÚNICAMENTE en el contexto anterior):
─────────────────────────────────────────────────";

/// Prompt with `{context}` and `{question}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Grounded syllabus assistant prompt
    pub fn academic() -> Self {
        Self::new(ACADEMIC_PROMPT)
    }

    /// Fill in the placeholders. Context and question are inserted verbatim;
    /// placeholder-like text inside them is left alone.
    pub fn render(&self, context: &str, question: &str) -> String {
        match self.template.split_once("{context}") {
            Some((before, after)) => format!(
                "{}{}{}",
                before.replace("{question}", question),
                context,
                after.replace("{question}", question)
            ),
            None => self.template.replace("{question}", question),
        }
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::academic()
    }
}
