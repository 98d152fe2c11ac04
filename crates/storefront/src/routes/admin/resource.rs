//! Building blocks shared by every admin resource.
//!
//! A resource describes its table columns and form fields, and knows how
//! to list, load, save and deactivate its rows. The generic handlers in
//! the parent module do the rest.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use sqlx::PgPool;

use geekshop_core::CategoryId;

use crate::db::RepositoryError;
use crate::models::CurrentUser;

// =============================================================================
// Table
// =============================================================================

/// Column definition for an admin list table.
#[derive(Debug, Clone)]
pub struct TableColumn {
    /// Unique key for the column.
    pub key: &'static str,
    /// Display label for the column header.
    pub label: &'static str,
    /// Right-align the cells (numbers and money).
    pub numeric: bool,
}

impl TableColumn {
    /// Create a text column.
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            numeric: false,
        }
    }

    /// Create a right-aligned column.
    #[must_use]
    pub const fn numeric(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            numeric: true,
        }
    }
}

/// One rendered row of an admin list table.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub id: i32,
    /// Cell text in column order.
    pub cells: Vec<String>,
    /// Inactive rows are shown dimmed.
    pub is_active: bool,
}

/// Render a flag as a table cell.
#[must_use]
pub fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

/// Narrowing applied to a list page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub category: Option<CategoryId>,
}

impl ListFilter {
    /// Parse the raw `category` query value. Blank, zero or garbage means no filter.
    #[must_use]
    pub fn parse(category: Option<&str>) -> Self {
        let category = category
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .filter(|id| *id > 0)
            .map(CategoryId::new);
        Self { category }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Which form is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update,
}

/// HTML control for a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Password,
    Number,
    Checkbox,
    Select,
    TextArea,
}

impl FieldKind {
    /// Name used by the form template to pick a control.
    #[must_use]
    pub const fn input(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Number => "number",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
            Self::TextArea => "textarea",
        }
    }
}

/// Static description of a form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Initial value on the create form.
    pub default: Option<&'static str>,
}

impl FieldSpec {
    #[must_use]
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            default: None,
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Checkbox ticked on the create form.
    #[must_use]
    pub const fn checked(mut self) -> Self {
        self.default = Some(CHECKED);
        self
    }
}

/// Value a browser submits for a ticked checkbox.
pub const CHECKED: &str = "on";

/// Raw submitted (or loaded) form values keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(HashMap<String, String>);

impl FormValues {
    /// Build from `(field, value)` pairs.
    ///
    /// Unticked checkboxes are absent from a browser submission, so empty
    /// values are dropped to keep false flags absent too.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .filter(|(_, v)| !v.is_empty())
                .collect(),
        )
    }

    /// Initial values of a create form.
    #[must_use]
    pub fn defaults(fields: &[FieldSpec]) -> Self {
        Self::from_pairs(
            fields
                .iter()
                .filter_map(|f| f.default.map(|d| (f.name, d))),
        )
    }

    /// Trimmed value, empty if missing.
    #[must_use]
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map_or("", |v| v.trim())
    }

    /// Whether a checkbox was ticked.
    #[must_use]
    pub fn checkbox(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Trimmed value, `None` when blank.
    #[must_use]
    pub fn optional(&self, name: &str) -> Option<String> {
        let value = self.get(name);
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Encode a flag the way a browser would submit it.
    #[must_use]
    pub fn flag(value: bool) -> &'static str {
        if value { CHECKED } else { "" }
    }
}

impl From<HashMap<String, String>> for FormValues {
    fn from(values: HashMap<String, String>) -> Self {
        Self::from_pairs(values)
    }
}

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Record an error, keeping the first one per field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Error for a single field.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    /// `Ok(value)` if nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::Invalid` carrying these errors otherwise.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, SaveError> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(SaveError::Invalid(self))
        }
    }

    /// Value of a required field, recording an error when blank.
    pub fn require(&mut self, values: &FormValues, field: &str) -> String {
        let value = values.get(field);
        if value.is_empty() {
            self.add(field, "This field is required.");
        }
        value.to_string()
    }

    /// Record an error when `value` is longer than `max` characters.
    pub fn max_length(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(
                field,
                format!("Ensure this value has at most {max} characters."),
            );
        }
    }
}

/// A select option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

/// Select option as rendered, with its selection state.
#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl OptionView {
    /// Mark the choices matching `current`.
    #[must_use]
    pub fn list(choices: &[Choice], current: &str) -> Vec<Self> {
        choices
            .iter()
            .map(|c| Self {
                value: c.value.clone(),
                label: c.label.clone(),
                selected: c.value == current,
            })
            .collect()
    }
}

/// A form field ready for the template.
#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input: &'static str,
    pub value: String,
    pub checked: bool,
    pub required: bool,
    pub options: Vec<OptionView>,
    pub error: Option<String>,
}

impl FieldView {
    /// Combine field specs with current values, errors and select choices.
    ///
    /// Password values are never echoed back.
    #[must_use]
    pub fn build(
        fields: &[FieldSpec],
        values: &FormValues,
        errors: &FieldErrors,
        choices: &[Choice],
    ) -> Vec<Self> {
        fields
            .iter()
            .map(|f| {
                let value = match f.kind {
                    FieldKind::Password => String::new(),
                    _ => values.get(f.name).to_string(),
                };
                let options = match f.kind {
                    FieldKind::Select => OptionView::list(choices, &value),
                    _ => Vec::new(),
                };

                Self {
                    name: f.name,
                    label: f.label,
                    input: f.kind.input(),
                    checked: values.checkbox(f.name),
                    required: f.required,
                    value,
                    options,
                    error: errors.get(f.name).map(str::to_string),
                }
            })
            .collect()
    }
}

/// Why a create or update did not go through.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// Submitted values failed validation.
    #[error("invalid form")]
    Invalid(FieldErrors),

    /// Storage failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A new password could not be hashed.
    #[error("password hashing failed")]
    PasswordHash,
}

impl SaveError {
    /// Turn a constraint violation into an error on `field`.
    #[must_use]
    pub fn conflict_on(err: RepositoryError, field: &str) -> Self {
        match err {
            RepositoryError::Conflict(message) => Self::Invalid(FieldErrors::single(field, message)),
            other => Self::Repository(other),
        }
    }
}

// =============================================================================
// Resource trait
// =============================================================================

/// A table managed from the admin panel.
///
/// Ids are raw `i32` path segments; each resource wraps them in its own
/// id type.
pub trait AdminResource: Send + Sync + 'static {
    /// URL segment under `/admin/`.
    const SLUG: &'static str;
    /// Plural heading.
    const TITLE: &'static str;
    /// Singular noun for buttons and headings.
    const SINGULAR: &'static str;
    /// Query parameter narrowing the list, if any.
    const LIST_FILTER: Option<&'static str> = None;

    fn columns() -> Vec<TableColumn>;

    fn fields(mode: FormMode) -> Vec<FieldSpec>;

    /// Who may use this resource.
    fn is_authorized(user: &CurrentUser) -> bool {
        user.is_superuser
    }

    /// Name shown on the delete confirmation.
    fn display_name(values: &FormValues) -> String;

    fn list(
        pool: &PgPool,
        filter: &ListFilter,
    ) -> impl Future<Output = Result<Vec<TableRow>, RepositoryError>> + Send;

    fn load(
        pool: &PgPool,
        id: i32,
    ) -> impl Future<Output = Result<Option<FormValues>, RepositoryError>> + Send;

    /// Options for select fields and the list filter.
    fn choices(pool: &PgPool) -> impl Future<Output = Result<Vec<Choice>, RepositoryError>> + Send {
        let _ = pool;
        async { Ok(Vec::new()) }
    }

    fn create(
        pool: &PgPool,
        values: &FormValues,
    ) -> impl Future<Output = Result<i32, SaveError>> + Send;

    fn update(
        pool: &PgPool,
        id: i32,
        values: &FormValues,
    ) -> impl Future<Output = Result<(), SaveError>> + Send;

    /// Soft delete. `false` if the row does not exist.
    fn deactivate(
        pool: &PgPool,
        id: i32,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("name", "Name", FieldKind::Text).required(),
            FieldSpec::new("password", "Password", FieldKind::Password),
            FieldSpec::new("category_id", "Category", FieldKind::Select),
            FieldSpec::new("is_active", "Active", FieldKind::Checkbox).checked(),
        ]
    }

    #[test]
    fn test_list_filter_parse() {
        assert_eq!(ListFilter::parse(None), ListFilter::default());
        assert_eq!(ListFilter::parse(Some("")), ListFilter::default());
        assert_eq!(ListFilter::parse(Some("abc")), ListFilter::default());
        assert_eq!(ListFilter::parse(Some("0")), ListFilter::default());
        assert_eq!(
            ListFilter::parse(Some(" 3 ")).category,
            Some(CategoryId::new(3))
        );
    }

    #[test]
    fn test_form_values_access() {
        let mut raw = HashMap::new();
        raw.insert("name".to_string(), "  Consoles ".to_string());
        raw.insert("is_active".to_string(), CHECKED.to_string());
        raw.insert("description".to_string(), String::new());
        let values = FormValues::from(raw);

        assert_eq!(values.get("name"), "Consoles");
        assert_eq!(values.get("missing"), "");
        assert!(values.checkbox("is_active"));
        assert!(!values.checkbox("description"));
        assert_eq!(values.optional("description"), None);
        assert_eq!(values.optional("name").as_deref(), Some("Consoles"));
    }

    #[test]
    fn test_defaults_tick_checkboxes() {
        let values = FormValues::defaults(&specs());
        assert!(values.checkbox("is_active"));
        assert_eq!(values.get("name"), "");
    }

    #[test]
    fn test_field_errors_keep_first() {
        let mut errors = FieldErrors::default();
        let value = errors.require(&FormValues::default(), "name");
        errors.add("name", "second");

        assert_eq!(value, "");
        assert_eq!(errors.get("name"), Some("This field is required."));
        assert!(matches!(errors.finish(|| ()), Err(SaveError::Invalid(_))));
        assert!(FieldErrors::default().finish(|| 5).is_ok());
    }

    #[test]
    fn test_max_length_counts_characters() {
        let mut errors = FieldErrors::default();
        errors.max_length("name", &"é".repeat(4), 4);
        assert!(errors.is_empty());

        errors.max_length("name", "abcde", 4);
        assert_eq!(
            errors.get("name"),
            Some("Ensure this value has at most 4 characters.")
        );
    }

    #[test]
    fn test_field_views() {
        let values = FormValues::from_pairs([
            ("name", "Dune"),
            ("password", "secret-value"),
            ("category_id", "2"),
        ]);
        let errors = FieldErrors::single("name", "taken");
        let choices = vec![
            Choice {
                value: "1".to_string(),
                label: "Books".to_string(),
            },
            Choice {
                value: "2".to_string(),
                label: "Games".to_string(),
            },
        ];

        let views = FieldView::build(&specs(), &values, &errors, &choices);

        assert_eq!(views[0].error.as_deref(), Some("taken"));
        assert!(views[0].required);
        assert_eq!(views[1].value, "");
        assert_eq!(views[1].input, "password");
        let selected: Vec<_> = views[2].options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].label, "Games");
        assert!(!views[3].checked);
    }

    #[test]
    fn test_conflict_becomes_field_error() {
        let err = SaveError::conflict_on(
            RepositoryError::Conflict("category name already exists".to_string()),
            "name",
        );
        match err {
            SaveError::Invalid(errors) => {
                assert_eq!(errors.get("name"), Some("category name already exists"));
            }
            other => panic!("expected field error, got {other:?}"),
        }

        assert!(matches!(
            SaveError::conflict_on(RepositoryError::NotFound, "name"),
            SaveError::Repository(RepositoryError::NotFound)
        ));
    }
}
