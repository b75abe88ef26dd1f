//! Relevance codes recorded by the annotator
//!
//! Four codes, one of which (`NotPresent`) is assigned automatically when a
//! host has no occurrences on a platform. Older ledgers stored `-1` for that
//! case; migration v1 rewrites those rows to `4`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::platform::Platform;
use crate::{Error, Result};

/// Ordinal relevance judgment for one platform on one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelevanceCode {
    /// Videos relate to the article content
    Relevant,
    /// Not relevant, placed outside the article body (e.g. sidebar)
    Placement,
    /// Not relevant, user-generated (comments, forum posts)
    UserGenerated,
    /// The host has no occurrences on this platform
    NotPresent,
}

/// Legacy value some ledgers used for an absent platform
pub const LEGACY_ABSENT_CODE: i64 = -1;

impl RelevanceCode {
    /// Integer stored in `labeled_hosts`
    pub fn as_i64(self) -> i64 {
        match self {
            RelevanceCode::Relevant => 1,
            RelevanceCode::Placement => 2,
            RelevanceCode::UserGenerated => 3,
            RelevanceCode::NotPresent => 4,
        }
    }

    /// Decode a stored value
    pub fn from_i64(value: i64) -> Result<Self> {
        match value {
            1 => Ok(RelevanceCode::Relevant),
            2 => Ok(RelevanceCode::Placement),
            3 => Ok(RelevanceCode::UserGenerated),
            4 => Ok(RelevanceCode::NotPresent),
            other => Err(Error::InvalidInput(format!("stored relevance code {} outside 1..=4", other))),
        }
    }

    /// Validate annotator input
    ///
    /// Only the three judgment codes are accepted; `4` is reserved for
    /// platforms that were never shown to the annotator.
    pub fn parse_input(input: &str) -> Result<Self> {
        match input.trim() {
            "1" => Ok(RelevanceCode::Relevant),
            "2" => Ok(RelevanceCode::Placement),
            "3" => Ok(RelevanceCode::UserGenerated),
            other => Err(Error::InvalidRelevanceCode(other.to_string())),
        }
    }

    /// Prompt text offered for a platform present on the host
    pub fn prompt_for(platform: Platform) -> String {
        format!(
            "Are the host's {} {} relevant? (1: yes, 2: No (e.g. in sidebar), 3: No (user-created), q: quit) ",
            platform.as_str().to_uppercase(),
            platform.content_noun()
        )
    }
}

impl fmt::Display for RelevanceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RelevanceCode::Relevant => "relevant",
            RelevanceCode::Placement => "not relevant (placement)",
            RelevanceCode::UserGenerated => "not relevant (user-generated)",
            RelevanceCode::NotPresent => "not present",
        };
        write!(f, "{} ({})", self.as_i64(), label)
    }
}

/// One relevance code per platform, indexed by [`Platform::index`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCodes([RelevanceCode; 3]);

impl LabelCodes {
    /// All platforms marked not present
    pub fn all_absent() -> Self {
        Self([RelevanceCode::NotPresent; 3])
    }

    pub fn get(&self, platform: Platform) -> RelevanceCode {
        self.0[platform.index()]
    }

    pub fn set(&mut self, platform: Platform, code: RelevanceCode) {
        self.0[platform.index()] = code;
    }

    /// Builder-style variant of [`LabelCodes::set`]
    pub fn with(mut self, platform: Platform, code: RelevanceCode) -> Self {
        self.set(platform, code);
        self
    }
}

impl Default for LabelCodes {
    fn default() -> Self {
        Self::all_absent()
    }
}
