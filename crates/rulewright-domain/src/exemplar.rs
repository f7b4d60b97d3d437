//! Exemplar module - previously compiled (rule text, document) pairs

use std::fmt;

/// Unique identifier for an exemplar based on UUIDv7
///
/// UUIDv7 keeps identifiers chronologically sortable, so the append order
/// of the example index is recoverable from the ids alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExemplarId(u128);

impl ExemplarId {
    /// Generate a new UUIDv7-based ExemplarId
    ///
    /// # Examples
    ///
    /// ```
    /// use rulewright_domain::ExemplarId;
    ///
    /// let id = ExemplarId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an ExemplarId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an ExemplarId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUIDv7 string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Get the timestamp component (milliseconds since Unix epoch)
    pub fn timestamp(&self) -> u64 {
        (self.0 >> 80) as u64
    }
}

impl Default for ExemplarId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExemplarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// A stored (rule text, compiled document) pair
///
/// Immutable once stored. Created by successful compilations or loaded
/// as seed examples; never deleted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exemplar {
    /// Unique identifier
    pub id: ExemplarId,

    /// Natural-language rule text the document was compiled from
    pub rule_text: String,

    /// The validated decision-table document
    pub compiled_document: String,

    /// When the exemplar was created (milliseconds since Unix epoch)
    pub created_at: u64,
}

impl Exemplar {
    /// Create a new exemplar with a fresh id
    pub fn new(rule_text: impl Into<String>, compiled_document: impl Into<String>) -> Self {
        let id = ExemplarId::new();
        Self {
            id,
            rule_text: rule_text.into(),
            compiled_document: compiled_document.into(),
            created_at: id.timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exemplar_id_ordering() {
        let id1 = ExemplarId::from_value(1000);
        let id2 = ExemplarId::from_value(2000);
        assert!(id1 < id2);
    }

    #[test]
    fn test_exemplar_id_string_roundtrip() {
        let id = ExemplarId::new();
        let parsed = ExemplarId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(ExemplarId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_new_exemplar_timestamp_matches_id() {
        let exemplar = Exemplar::new("if size is small then assign 5", "{}");
        assert_eq!(exemplar.created_at, exemplar.id.timestamp());
        assert_eq!(exemplar.rule_text, "if size is small then assign 5");
    }
}
