use serde::{Deserialize, Serialize};

/// Product identifier exactly as the source system supplied it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// Matching key shared by both markets. The domestic system and the
/// cross-border sheet format identifiers differently ("A-100" vs "a100"),
/// so all cross-source matching goes through this canonical form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalProductId(String);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalizationRule {
    /// Keep ASCII letters and digits only, uppercased. Default.
    #[default]
    AlphanumericUpper,
    /// Trim surrounding whitespace and uppercase, keeping separators.
    TrimUpper,
}

impl ProductId {
    pub fn canonicalize(&self, rule: CanonicalizationRule) -> CanonicalProductId {
        let canonical = match rule {
            CanonicalizationRule::AlphanumericUpper => self
                .0
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|c| c.to_ascii_uppercase())
                .collect(),
            CanonicalizationRule::TrimUpper => self.0.trim().to_uppercase(),
        };
        CanonicalProductId(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CanonicalProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for CanonicalProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
