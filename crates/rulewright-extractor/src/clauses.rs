//! Clause splitting for per-clause extraction

/// Characters that separate independent "if ... then ..." clauses
pub const CLAUSE_SEPARATORS: [char; 3] = [';', '\n', '\r'];

/// Split rule text into its clauses
///
/// Pieces are trimmed and empty pieces dropped, so the result is
/// deterministic for identical input.
pub fn split_clauses(text: &str) -> Vec<String> {
    text.split(CLAUSE_SEPARATORS)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty() && c.chars().any(|ch| ch.is_alphanumeric()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_semicolons() {
        let clauses = split_clauses(
            "If size is small then assign 5 employees; if size is large then assign 10 employees.",
        );
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0], "If size is small then assign 5 employees");
        assert_eq!(clauses[1], "if size is large then assign 10 employees.");
    }

    #[test]
    fn test_split_lines_and_drops_empty() {
        let clauses = split_clauses("a then b\n\n  ;  \r\nc then d;.");
        assert_eq!(clauses, vec!["a then b", "c then d"]);
    }

    #[test]
    fn test_single_clause() {
        assert_eq!(split_clauses("  only one  "), vec!["only one"]);
        assert!(split_clauses("  ;; ").is_empty());
    }

    proptest! {
        #[test]
        fn prop_split_is_deterministic(text in "[a-z ;\n]{0,60}") {
            prop_assert_eq!(split_clauses(&text), split_clauses(&text));
        }

        #[test]
        fn prop_clauses_have_no_separators(text in "[a-z ;\n]{0,60}") {
            for clause in split_clauses(&text) {
                prop_assert!(!clause.contains(CLAUSE_SEPARATORS));
                prop_assert_eq!(clause.trim(), clause.as_str());
            }
        }
    }
}
