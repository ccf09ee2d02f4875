use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Question difficulty. Serialized in upper case on the wire, matching the
/// values the frontend sends back verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDifficulty(pub String);

impl fmt::Display for InvalidDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "difficulty must be one of EASY, MEDIUM, HARD (got '{}')", self.0)
    }
}

impl std::error::Error for InvalidDifficulty {}

impl FromStr for Difficulty {
    type Err = InvalidDifficulty;

    // Case-sensitive: the original API only accepted the upper-case spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EASY" => Ok(Difficulty::Easy),
            "MEDIUM" => Ok(Difficulty::Medium),
            "HARD" => Ok(Difficulty::Hard),
            other => Err(InvalidDifficulty(other.to_string())),
        }
    }
}
