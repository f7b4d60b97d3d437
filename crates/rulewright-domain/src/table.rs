//! Table metadata - naming and fact types of the decision table being built

use crate::fact::FactModel;

/// Default package of generated tables
pub const DEFAULT_PACKAGE: &str = "com.myspace.rules";

/// Default fact type conditions reason over
pub const DEFAULT_INPUT_TYPE: &str = "RestaurantData";

/// Default fact type actions modify
pub const DEFAULT_TARGET_TYPE: &str = "EmployeeRecommendation";

/// Default import prefix for fact types
pub const DEFAULT_IMPORT_PREFIX: &str = "com.myspace.restopsrecomms";

/// Default salience of a rule that states no priority
pub const DEFAULT_PRIORITY: i32 = 10;

/// Metadata of the decision table a compilation request targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    /// Fixed table name; when absent a name is generated
    pub table_name: Option<String>,

    /// Package the table belongs to
    pub package_name: String,

    /// Fully-qualified fact types imported by the table
    pub imports: Vec<String>,

    /// Fact type conditions reason over
    pub input_type: String,

    /// Fact type actions modify
    pub target_type: String,

    /// Salience applied to rules that state no priority
    pub default_priority: i32,

    /// Declared fact types; when present, extracted fields must exist in it
    pub fact_model: Option<FactModel>,
}

impl TableMetadata {
    /// Set a fixed table name
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    /// Set the input and target fact types, importing both from `import_prefix`
    pub fn with_types(
        mut self,
        import_prefix: &str,
        input_type: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        self.input_type = input_type.into();
        self.target_type = target_type.into();
        self.imports = vec![
            format!("{}.{}", import_prefix, self.input_type),
            format!("{}.{}", import_prefix, self.target_type),
        ];
        self
    }

    /// Attach a fact model; imports of types it places in a package follow it
    pub fn with_fact_model(mut self, model: FactModel) -> Self {
        for import in &mut self.imports {
            if let Some(qualified) = model.qualified_name(import) {
                *import = qualified;
            }
        }
        self.fact_model = Some(model);
        self
    }
}

impl Default for TableMetadata {
    fn default() -> Self {
        Self {
            table_name: None,
            package_name: DEFAULT_PACKAGE.to_string(),
            imports: Vec::new(),
            input_type: String::new(),
            target_type: String::new(),
            default_priority: DEFAULT_PRIORITY,
            fact_model: None,
        }
        .with_types(DEFAULT_IMPORT_PREFIX, DEFAULT_INPUT_TYPE, DEFAULT_TARGET_TYPE)
    }
}
