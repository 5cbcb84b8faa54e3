//! Labels of the resources and groups that make up a workspace.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::slug::Identity;

pub const BANNER_TAG: &str = "BANNER";

pub const DEFAULT_STANDARD_TEXTS: [&str; 5] =
    ["brief", "discussion", "ressources", "livrables", "retours"];

pub const DEFAULT_BANNER_EMOJIS: [&str; 7] = ["🔴", "🟠", "🟡", "🟢", "🔵", "🟣", "🟤"];

const BANNER_RULE: &str = "═════";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceNaming {
    /// Text resources created for every workspace, besides the banner.
    pub standard_texts: Vec<String>,
    pub group_prefix: String,
    pub voice_prefix: String,
    pub banner_emojis: Vec<String>,
}

impl Default for WorkspaceNaming {
    fn default() -> Self {
        Self {
            standard_texts: DEFAULT_STANDARD_TEXTS.iter().map(|s| s.to_string()).collect(),
            group_prefix: "PROJET — ".to_string(),
            voice_prefix: "vocal – réunion・p-".to_string(),
            banner_emojis: DEFAULT_BANNER_EMOJIS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl WorkspaceNaming {
    pub fn group_label(&self, display_name: &str) -> String {
        format!("{}{}", self.group_prefix, display_name)
    }

    pub fn voice_label(&self, identity: &Identity) -> String {
        format!("{}{}", self.voice_prefix, identity)
    }

    pub fn banner_label(&self, display_name: &str, emoji: &str) -> String {
        format!("{emoji} {BANNER_RULE} {display_name} {BANNER_RULE} {emoji}")
    }

    pub fn pick_emoji<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        if self.banner_emojis.is_empty() {
            return DEFAULT_BANNER_EMOJIS[0];
        }
        &self.banner_emojis[rng.random_range(0..self.banner_emojis.len())]
    }

    /// Role tag stamped into a standard text resource's metadata.
    ///
    /// Separator characters become `_` so the tag decodes as one token.
    pub fn role_tag(text_label: &str) -> String {
        text_label
            .split(|c: char| c == '|' || c.is_whitespace())
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join("_")
            .to_uppercase()
    }

    /// Every role tag a workspace's text resources may carry.
    pub fn known_roles(&self) -> Vec<String> {
        std::iter::once(BANNER_TAG.to_string())
            .chain(self.standard_texts.iter().map(|t| Self::role_tag(t)))
            .collect()
    }

    /// Banner plus standard text resources.
    pub fn text_count(&self) -> usize {
        1 + self.standard_texts.len()
    }
}
