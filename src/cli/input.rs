//! Question input for the chat loop, using rustyline
//!
//! Line editing plus persistent history in `~/.silabo-rag/history`.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// Words that end the chat, compared case-insensitively
pub const EXIT_WORDS: &[&str] = &["salir", "quit", "exit", "q"];

/// What the user typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Question(String),
    /// Blank line
    Empty,
    /// Exit word, Ctrl-C or Ctrl-D
    Exit,
}

impl ChatInput {
    /// Classify a raw input line
    pub fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            ChatInput::Empty
        } else if EXIT_WORDS.iter().any(|w| trimmed.eq_ignore_ascii_case(w)) {
            ChatInput::Exit
        } else {
            ChatInput::Question(trimmed.to_string())
        }
    }
}

/// Readline wrapper with optional persistent history
pub struct InputHandler {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
    prompt: String,
}

impl InputHandler {
    /// Create new input handler
    pub fn new() -> Result<Self> {
        Ok(InputHandler {
            editor: DefaultEditor::new()?,
            history_path: None,
            prompt: "❓ Pregunta: ".to_string(),
        })
    }

    /// Create input handler with persistent history
    pub fn with_history(history_file: PathBuf) -> Result<Self> {
        let mut handler = Self::new()?;

        if history_file.exists() {
            let _ = handler.editor.load_history(&history_file);
        }
        handler.history_path = Some(history_file);

        Ok(handler)
    }

    /// Default history location
    pub fn default_history_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".silabo-rag").join("history"))
    }

    /// Set custom prompt
    pub fn set_prompt(&mut self, prompt: String) {
        self.prompt = prompt;
    }

    /// Read and classify one line
    pub fn read(&mut self) -> Result<ChatInput> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                let input = ChatInput::classify(&line);
                if let ChatInput::Question(ref q) = input {
                    let _ = self.editor.add_history_entry(q.as_str());
                }
                Ok(input)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(ChatInput::Exit),
            Err(err) => Err(anyhow::anyhow!("Readline error: {}", err)),
        }
    }

    /// Save history to disk
    pub fn save_history(&mut self) -> Result<()> {
        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            self.editor.save_history(path)?;
        }
        Ok(())
    }
}
