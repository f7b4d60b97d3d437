//! Fact model - the fact types a table may reason over and their fields

use std::collections::BTreeMap;

/// One fact type: where it lives and which fields it has
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FactType {
    /// Package the type is imported from
    pub package: Option<String>,

    /// Field name to declared type name (`size` -> `String`)
    pub fields: BTreeMap<String, String>,
}

impl FactType {
    /// Create a fact type in `package`
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: Some(package.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Declare a field
    pub fn with_field(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), type_name.into());
        self
    }

    /// Whether `name` is a declared field
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Whether an action may target `target`: a field or its setter
    ///
    /// `setEmployeeCount` is accepted when `employeeCount` is declared.
    pub fn accepts_target(&self, target: &str) -> bool {
        self.has_field(target) || self.field_of_setter(target).is_some_and(|f| self.has_field(&f))
    }

    fn field_of_setter(&self, target: &str) -> Option<String> {
        let mut rest = target.strip_prefix("set")?.chars();
        let first = rest.next().filter(|c| c.is_uppercase())?;
        Some(first.to_lowercase().chain(rest).collect())
    }
}

/// Fact types by simple name
///
/// Optional: a table without a model accepts any identifier as a field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FactModel {
    types: BTreeMap<String, FactType>,
}

impl FactModel {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a fact type
    pub fn with_type(mut self, name: impl Into<String>, fact_type: FactType) -> Self {
        self.types.insert(name.into(), fact_type);
        self
    }

    /// Look up a type by simple or qualified name
    pub fn get(&self, name: &str) -> Option<&FactType> {
        let short = name.rsplit('.').next().unwrap_or(name);
        self.types.get(short)
    }

    /// Whether no type is declared
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Declared types in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FactType)> {
        self.types.iter().map(|(name, t)| (name.as_str(), t))
    }

    /// Fully-qualified name of a declared type with a package
    pub fn qualified_name(&self, name: &str) -> Option<String> {
        let short = name.rsplit('.').next().unwrap_or(name);
        let package = self.types.get(short)?.package.as_deref()?;
        Some(format!("{}.{}", package, short))
    }
}
