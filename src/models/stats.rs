use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::book::Difficulty;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_quizzes: i64,
    pub total_books: i64,
    /// Quizzes completed since midnight UTC.
    pub active_today: i64,
}

/// Completed quizzes for one (day, difficulty) pair, as counted in storage.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ActivityCount {
    pub day: NaiveDate,
    pub difficulty: String,
    pub quizzes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct DailyActivity {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub easy: i64,
    pub medium: i64,
    pub hard: i64,
}

impl DailyActivity {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            easy: 0,
            medium: 0,
            hard: 0,
        }
    }

    /// Folds per-difficulty counts into one entry per day, oldest first.
    /// Days without any completed quiz are absent.
    pub fn from_counts(counts: impl IntoIterator<Item = ActivityCount>) -> Vec<Self> {
        let mut days: BTreeMap<NaiveDate, Self> = BTreeMap::new();
        for count in counts {
            let Ok(difficulty) = count.difficulty.parse::<Difficulty>() else {
                tracing::debug!(difficulty = %count.difficulty, "Skipping activity with unrecognized difficulty");
                continue;
            };
            let entry = days
                .entry(count.day)
                .or_insert_with(|| Self::empty(count.day));
            match difficulty {
                Difficulty::Easy => entry.easy += count.quizzes,
                Difficulty::Medium => entry.medium += count.quizzes,
                Difficulty::Hard => entry.hard += count.quizzes,
            }
        }
        days.into_values().collect()
    }
}
