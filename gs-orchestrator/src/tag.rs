//! Workspace markers stamped into a text resource's metadata field.
//!
//! Format: `WORKSPACE:<identity> | GROUP:<group id> | <ROLE>`, the last two
//! segments optional. Decoding is token-based and tolerant of surrounding
//! free text. Markers written by the earlier bot (`PROJECT:` / `ROLE:`)
//! decode the same way; encoding always uses the current markers.

use gs_platform::Snowflake;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::slug::Identity;

pub const WORKSPACE_MARKER: &str = "WORKSPACE:";
pub const GROUP_MARKER: &str = "GROUP:";
pub const SEGMENT_SEPARATOR: &str = " | ";

const LEGACY_WORKSPACE_MARKER: &str = "PROJECT:";

/// Group ids are 17 to 20 digit snowflakes.
static GROUP_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:GROUP|ROLE):(\d{17,20})\b")
        .expect("Group id regex should compile - this is a static pattern")
});

/// Decoded metadata of a workspace text resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceTag {
    pub identity: Identity,
    pub group_id: Option<Snowflake>,
    pub role: Option<String>,
}

impl WorkspaceTag {
    pub fn encode(&self) -> String {
        encode(&self.identity, self.group_id, self.role.as_deref())
    }
}

pub fn encode(identity: &Identity, group_id: Option<Snowflake>, role: Option<&str>) -> String {
    let mut parts = vec![format!("{WORKSPACE_MARKER}{identity}")];
    if let Some(group_id) = group_id {
        parts.push(format!("{GROUP_MARKER}{group_id}"));
    }
    if let Some(role) = role.filter(|r| !r.is_empty()) {
        parts.push(role.to_string());
    }
    parts.join(SEGMENT_SEPARATOR)
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c == '|' || c.is_whitespace())
        .filter(|t| !t.is_empty())
}

fn workspace_of(token: &str) -> Option<&str> {
    token
        .strip_prefix(WORKSPACE_MARKER)
        .or_else(|| token.strip_prefix(LEGACY_WORKSPACE_MARKER))
        .filter(|id| !id.is_empty())
}

/// Encoder/decoder aware of the role tags a workspace may carry.
#[derive(Debug, Clone)]
pub struct TagCodec {
    known_roles: Vec<String>,
}

impl TagCodec {
    pub fn new<I, S>(known_roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_roles: known_roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn encode(
        &self,
        identity: &Identity,
        group_id: Option<Snowflake>,
        role: Option<&str>,
    ) -> String {
        encode(identity, group_id, role)
    }

    /// Whether `text` marks a resource of the workspace `identity`.
    ///
    /// Matches whole marker tokens only, so `atlas` never matches a
    /// resource of `atlas-migration`.
    pub fn has_workspace(&self, text: &str, identity: &Identity) -> bool {
        if identity.is_empty() {
            return false;
        }
        tokens(text).any(|t| workspace_of(t) == Some(identity.as_str()))
    }

    pub fn extract_identity(&self, text: &str) -> Option<Identity> {
        tokens(text).find_map(workspace_of).map(Identity::derive)
    }

    pub fn extract_group_id(&self, text: &str) -> Option<Snowflake> {
        GROUP_ID_REGEX
            .captures_iter(text)
            .find_map(|caps| caps.get(1)?.as_str().parse().ok())
    }

    pub fn extract_tag(&self, text: &str) -> Option<String> {
        tokens(text)
            .find(|t| self.known_roles.iter().any(|role| role == t))
            .map(str::to_string)
    }

    /// Full structured decode; `None` when no workspace marker is present.
    pub fn parse(&self, text: &str) -> Option<WorkspaceTag> {
        let identity = self.extract_identity(text)?;
        Some(WorkspaceTag {
            identity,
            group_id: self.extract_group_id(text),
            role: self.extract_tag(text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::WorkspaceNaming;
    use proptest::prelude::*;

    fn codec() -> TagCodec {
        TagCodec::new(WorkspaceNaming::default().known_roles())
    }

    const GROUP: Snowflake = Snowflake(123_456_789_012_345_678);

    #[test]
    fn test_encode_layouts() {
        let id = Identity::derive("Atlas");
        assert_eq!(encode(&id, None, None), "WORKSPACE:atlas");
        assert_eq!(
            encode(&id, Some(GROUP), Some("BRIEF")),
            "WORKSPACE:atlas | GROUP:123456789012345678 | BRIEF"
        );
        assert_eq!(encode(&id, None, Some("BANNER")), "WORKSPACE:atlas | BANNER");
        assert_eq!(encode(&id, None, Some("")), "WORKSPACE:atlas");
    }

    #[test]
    fn test_has_workspace_is_exact() {
        let codec = codec();
        let text = encode(&Identity::derive("Atlas Migration"), Some(GROUP), None);

        assert!(codec.has_workspace(&text, &Identity::derive("Atlas Migration")));
        assert!(!codec.has_workspace(&text, &Identity::derive("Atlas")));
        assert!(!codec.has_workspace(&text, &Identity::derive("")));
    }

    #[test]
    fn test_tolerates_extra_content() {
        let codec = codec();
        let text = "Weekly sync notes. WORKSPACE:atlas | GROUP:123456789012345678 | RETOURS | pinned";

        assert!(codec.has_workspace(text, &Identity::derive("atlas")));
        assert_eq!(codec.extract_group_id(text), Some(GROUP));
        assert_eq!(codec.extract_tag(text).as_deref(), Some("RETOURS"));
    }

    #[test]
    fn test_legacy_markers_decode() {
        let codec = codec();
        let text = "PROJECT:atlas | ROLE:123456789012345678 | LIVRABLES";

        let tag = codec.parse(text).unwrap();
        assert_eq!(tag.identity.as_str(), "atlas");
        assert_eq!(tag.group_id, Some(GROUP));
        assert_eq!(tag.role.as_deref(), Some("LIVRABLES"));

        // Re-encoding upgrades to the current markers.
        assert_eq!(
            tag.encode(),
            "WORKSPACE:atlas | GROUP:123456789012345678 | LIVRABLES"
        );
    }

    #[test]
    fn test_absent_metadata_is_unknown_not_error() {
        let codec = codec();
        assert!(codec.parse("").is_none());
        assert!(codec.parse("just a topic").is_none());
        assert_eq!(codec.extract_group_id("GROUP:12345"), None);
        assert_eq!(codec.extract_group_id("GROUP:123456789012345678901"), None);
        assert_eq!(codec.extract_tag("WORKSPACE:x | SOMETHING"), None);
    }

    #[test]
    fn test_overflowing_group_id_is_skipped() {
        let codec = codec();
        let text = "WORKSPACE:atlas | GROUP:99999999999999999999 | GROUP:123456789012345678";
        assert_eq!(codec.extract_group_id(text), Some(GROUP));
        assert_eq!(codec.extract_group_id("GROUP:99999999999999999999"), None);
    }

    #[test]
    fn test_multi_word_role_round_trips() {
        let naming = WorkspaceNaming {
            standard_texts: vec!["brief".to_string(), "notes de réunion".to_string()],
            ..WorkspaceNaming::default()
        };
        let codec = TagCodec::new(naming.known_roles());
        let role = WorkspaceNaming::role_tag("notes de réunion");

        let text = codec.encode(&Identity::derive("Atlas"), Some(GROUP), Some(&role));

        assert_eq!(codec.extract_tag(&text), Some(role));
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            name in "[A-Za-z][A-Za-z0-9 ]{0,30}",
            group in 10_000_000_000_000_000u64..=u64::MAX,
            role_idx in 0usize..6,
        ) {
            let codec = codec();
            let identity = Identity::derive(&name);
            let roles = WorkspaceNaming::default().known_roles();
            let role = roles[role_idx].clone();

            let text = codec.encode(&identity, Some(Snowflake(group)), Some(&role));

            prop_assert_eq!(codec.extract_group_id(&text), Some(Snowflake(group)));
            prop_assert!(codec.has_workspace(&text, &identity));
            prop_assert_eq!(codec.extract_tag(&text), Some(role));
        }
    }
}
