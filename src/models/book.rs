use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
}

/// Quiz difficulty levels. Declaration order is the order in which missing
/// levels are generated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Levels absent from `existing`, in generation order.
    pub fn missing_from(existing: &[Difficulty]) -> Vec<Difficulty> {
        Self::ALL
            .into_iter()
            .filter(|d| !existing.contains(d))
            .collect()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown difficulty: {0}")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(UnknownDifficulty(other.to_string())),
        }
    }
}

/// A book with approved content that still lacks at least one difficulty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub book: Book,
    pub missing: Vec<Difficulty>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keeps_generation_order() {
        assert_eq!(
            Difficulty::missing_from(&[Difficulty::Medium]),
            vec![Difficulty::Easy, Difficulty::Hard]
        );
        assert_eq!(
            Difficulty::missing_from(&[Difficulty::Hard, Difficulty::Hard, Difficulty::Easy]),
            vec![Difficulty::Medium]
        );
        assert!(Difficulty::missing_from(&Difficulty::ALL).is_empty());
        assert_eq!(Difficulty::missing_from(&[]), Difficulty::ALL.to_vec());
    }

    #[test]
    fn parses_stored_values() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Difficulty::Medium).unwrap(), "\"medium\"");
    }
}
