//! Skeleton fragments: static scaffolding interleaved with slot markers

use crate::error::TemplateError;
use crate::slot::{escape_json, FragmentKind, SlotKind, SlotType, SlotValues, TemplateSlot};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

/// Piece of a parsed fragment
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Scaffolding preserved verbatim (static slots already resolved)
    Static(String),
    /// A dynamic slot
    Slot {
        /// Slot name
        name: String,
        /// Expected value type
        value_type: SlotType,
        /// Whether the marker sits inside a JSON string literal
        quoted: bool,
    },
}

/// One parsed skeleton fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    kind: FragmentKind,
    segments: Vec<Segment>,
}

impl Fragment {
    /// Parse `source`, resolving static slots and typing dynamic ones
    pub(crate) fn parse(
        kind: FragmentKind,
        source: &str,
        marker: &Regex,
        catalog: &BTreeMap<String, TemplateSlot>,
    ) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut pending = String::new();
        let mut seen = HashSet::new();
        let mut cursor = 0;

        for captures in marker.captures_iter(source) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let name = name.as_str();
            let quoted =
                source[..whole.start()].ends_with('"') && source[whole.end()..].starts_with('"');

            pending.push_str(&source[cursor..whole.start()]);
            cursor = whole.end();

            let slot = catalog.get(name).ok_or_else(|| TemplateError::UndeclaredSlot {
                fragment: kind.to_string(),
                slot: name.to_string(),
            })?;

            match &slot.kind {
                SlotKind::Static(value) => {
                    if quoted {
                        pending.push_str(&escape_json(value));
                    } else {
                        pending.push_str(value);
                    }
                }
                SlotKind::Dynamic => {
                    if !seen.insert(name.to_string()) {
                        return Err(TemplateError::DuplicateSlot {
                            fragment: kind.to_string(),
                            slot: name.to_string(),
                        });
                    }
                    if quoted != slot.value_type.is_quoted() {
                        return Err(TemplateError::Placement {
                            fragment: kind.to_string(),
                            slot: name.to_string(),
                        });
                    }
                    if !pending.is_empty() {
                        segments.push(Segment::Static(std::mem::take(&mut pending)));
                    }
                    segments.push(Segment::Slot {
                        name: name.to_string(),
                        value_type: slot.value_type,
                        quoted,
                    });
                }
            }
        }

        pending.push_str(&source[cursor..]);
        if !pending.is_empty() {
            segments.push(Segment::Static(pending));
        }

        Ok(Self { kind, segments })
    }

    /// Fragment kind
    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    /// Parsed segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Static scaffolding pieces in order
    pub fn static_pieces(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Static(text) => Some(text.as_str()),
            Segment::Slot { .. } => None,
        })
    }

    /// Names of the dynamic slots in order
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot { name, .. } => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    /// Render one instance of the fragment
    ///
    /// A slot without a value keeps its `{{marker}}`; a marker outside a
    /// string literal is wrapped in quotes so the candidate still parses.
    pub fn render(&self, values: &SlotValues) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Static(text) => out.push_str(text),
                Segment::Slot {
                    name,
                    value_type,
                    quoted,
                } => match values.get(name) {
                    Some(value) => out.push_str(&value.encode(name, *value_type)?),
                    None if *quoted => out.push_str(&format!("{{{{{}}}}}", name)),
                    None => out.push_str(&format!("\"{{{{{}}}}}\"", name)),
                },
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MARKER_PATTERN;

    fn catalog(slots: Vec<TemplateSlot>) -> BTreeMap<String, TemplateSlot> {
        slots.into_iter().map(|s| (s.name.clone(), s)).collect()
    }

    fn marker() -> Regex {
        Regex::new(MARKER_PATTERN).unwrap()
    }

    #[test]
    fn test_parse_resolves_static_slots() {
        let slots = catalog(vec![
            TemplateSlot::fixed("format", "EXTENDED_ENTRY"),
            TemplateSlot::dynamic("name", SlotType::Text),
        ]);
        let fragment = Fragment::parse(
            FragmentKind::Frame,
            r#"{"format": "{{format}}", "name": "{{name}}"}"#,
            &marker(),
            &slots,
        )
        .unwrap();

        let pieces: Vec<&str> = fragment.static_pieces().collect();
        assert_eq!(pieces, vec![r#"{"format": "EXTENDED_ENTRY", "name": ""#, "\"}"]);
        assert_eq!(fragment.slot_names().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_parse_rejects_undeclared() {
        let result = Fragment::parse(
            FragmentKind::Cell,
            r#"{"a": "{{mystery}}"}"#,
            &marker(),
            &catalog(vec![]),
        );
        assert!(matches!(
            result,
            Err(TemplateError::UndeclaredSlot { ref slot, .. }) if slot == "mystery"
        ));
    }

    #[test]
    fn test_parse_rejects_misplaced_slot() {
        let slots = catalog(vec![TemplateSlot::dynamic("count", SlotType::Integer)]);
        let result = Fragment::parse(FragmentKind::Cell, r#"{"a": "{{count}}"}"#, &marker(), &slots);
        assert!(matches!(result, Err(TemplateError::Placement { .. })));
    }

    #[test]
    fn test_parse_rejects_duplicate_slot() {
        let slots = catalog(vec![TemplateSlot::dynamic("name", SlotType::Text)]);
        let result = Fragment::parse(
            FragmentKind::Cell,
            r#"{"a": "{{name}}", "b": "{{name}}"}"#,
            &marker(),
            &slots,
        );
        assert!(matches!(result, Err(TemplateError::DuplicateSlot { .. })));
    }

    #[test]
    fn test_render_missing_values_keep_markers() {
        let slots = catalog(vec![
            TemplateSlot::dynamic("name", SlotType::Text),
            TemplateSlot::dynamic("count", SlotType::Integer),
        ]);
        let fragment = Fragment::parse(
            FragmentKind::Cell,
            r#"{"name": "{{name}}", "count": {{count}}}"#,
            &marker(),
            &slots,
        )
        .unwrap();

        let rendered = fragment.render(&SlotValues::new()).unwrap();
        assert_eq!(rendered, r#"{"name": "{{name}}", "count": "{{count}}"}"#);
        assert!(serde_json::from_str::<serde_json::Value>(&rendered).is_ok());

        let rendered = fragment
            .render(&SlotValues::new().with("name", "a \"quoted\" name").with("count", 3i64))
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["name"], "a \"quoted\" name");
        assert_eq!(parsed["count"], 3);
    }
}
