use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::book::{Book, Difficulty};

/// Outcome of one book's backfill within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BatchResult {
    pub book_id: Uuid,
    pub title: String,
    pub difficulties_generated: Vec<Difficulty>,
    pub errors: Vec<String>,
}

impl BatchResult {
    pub fn for_book(book: &Book) -> Self {
        Self {
            book_id: book.id,
            title: book.title.clone(),
            difficulties_generated: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record_success(&mut self, difficulty: Difficulty) {
        self.difficulties_generated.push(difficulty);
    }

    pub fn record_failure(&mut self, difficulty: Difficulty, message: impl std::fmt::Display) {
        self.errors.push(format!("{}: {}", difficulty, message));
    }

    pub fn has_new_quizzes(&self) -> bool {
        !self.difficulties_generated.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub books_processed: usize,
    pub quizzes_generated: usize,
    pub books_with_new_quizzes: usize,
    pub books_with_errors: usize,
    pub results: Vec<BatchResult>,
}

impl BatchSummary {
    pub fn from_results(results: Vec<BatchResult>) -> Self {
        Self {
            books_processed: results.len(),
            quizzes_generated: results.iter().map(|r| r.difficulties_generated.len()).sum(),
            books_with_new_quizzes: results.iter().filter(|r| r.has_new_quizzes()).count(),
            books_with_errors: results.iter().filter(|r| r.has_errors()).count(),
            results,
        }
    }
}

/// What a backfill run amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillOutcome {
    /// No book has approved content.
    NoContent,
    /// Approved books exist but all scanned ones have every difficulty.
    FullyCovered,
    Completed(BatchSummary),
}
