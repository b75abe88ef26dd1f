//! Tracked video platforms
//!
//! The set is closed: occurrences naming any other platform are not
//! representable and are dropped by the occurrence reader.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// One of the three platforms whose embedded videos are tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Short-form social network (tweets with embedded video)
    Twitter,
    /// Social media platform
    Facebook,
    /// Video platform
    Youtube,
}

impl Platform {
    /// All platforms in display order (table columns, prompt order)
    pub const ALL: [Platform; 3] = [Platform::Twitter, Platform::Facebook, Platform::Youtube];

    /// Name stored in `found_videos.platform` and used as column prefix
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
            Platform::Youtube => "youtube",
        }
    }

    /// Position in [`Platform::ALL`], used to index per-platform arrays
    pub fn index(self) -> usize {
        match self {
            Platform::Twitter => 0,
            Platform::Facebook => 1,
            Platform::Youtube => 2,
        }
    }

    /// Noun used when asking the annotator about this platform
    pub fn content_noun(self) -> &'static str {
        match self {
            Platform::Twitter => "tweets",
            Platform::Facebook | Platform::Youtube => "videos",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitter" => Ok(Platform::Twitter),
            "facebook" => Ok(Platform::Facebook),
            "youtube" => Ok(Platform::Youtube),
            other => Err(Error::InvalidInput(format!("unknown platform '{}'", other))),
        }
    }
}
