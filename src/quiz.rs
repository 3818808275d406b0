//! Quiz loading.
//!
//! Quizzes live under the quiz directory of the content root, one
//! subdirectory per quiz type, one JSON file per question:
//!
//! ```text
//! Quiz/
//! ├── arrays/
//! │   ├── 001.json
//! │   └── 002.json
//! └── sorting/
//!     └── 001.json
//! ```
//!
//! Questions are returned in file name order. Files that aren't `.json` are
//! ignored; a `.json` file that doesn't parse as a question is logged and
//! skipped so one bad file doesn't hide the rest of the quiz.

use crate::ordering;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Invalid quiz type: {0:?}")]
    InvalidType(String),
    #[error("Error reading quiz directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// One quiz question as stored on disk.
///
/// `answer` is kept as raw JSON: question files use both the option text and
/// its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub answer: Option<serde_json::Value>,
    pub explanation: Option<String>,
}

impl Default for Question {
    fn default() -> Self {
        Self {
            question: String::new(),
            options: Vec::new(),
            answer: None,
            explanation: None,
        }
    }
}

impl Question {
    /// Index of the correct option, whether `answer` is an index or the
    /// option text.
    pub fn answer_index(&self) -> Option<usize> {
        match self.answer.as_ref()? {
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .filter(|&i| i < self.options.len()),
            serde_json::Value::String(s) => self.options.iter().position(|o| o == s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuizLoader {
    base: PathBuf,
}

impl QuizLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Available quiz types: subdirectories of the base, in site order.
    ///
    /// A missing base directory means no quizzes.
    pub fn types(&self) -> Vec<String> {
        let Ok(read) = fs::read_dir(&self.base) else {
            debug!(base = %self.base.display(), "no quiz directory");
            return Vec::new();
        };
        let mut types: Vec<String> = read
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        types.sort_by(|a, b| ordering::compare_names(a, b));
        types
    }

    /// Load every question of `quiz_type`.
    ///
    /// The type must be a single plain directory name. An unreadable or
    /// missing type directory is an error.
    pub fn load(&self, quiz_type: &str) -> Result<Vec<Question>, QuizError> {
        if !is_plain_name(quiz_type) {
            return Err(QuizError::InvalidType(quiz_type.to_string()));
        }
        let dir = self.base.join(quiz_type);

        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        let mut questions = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|source| QuizError::Directory {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            match read_question(path) {
                Ok(q) => questions.push(q),
                Err(err) => warn!(file = %path.display(), error = %err, "skipping quiz question"),
            }
        }
        debug!(quiz = quiz_type, count = questions.len(), "loaded quiz");
        Ok(questions)
    }
}

fn read_question(path: &Path) -> Result<Question, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('.')
}
