//! Instance validation against verified schemas

use json_pointer::JsonPointer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ValidateError;
use crate::schema::Schema;
use crate::vm::Vm;

/// Knobs for a [`Validator`]. All zero/false by default.
///
/// When validating against untrusted schemas, always set `max_depth` to a
/// nonzero value: a cyclic `ref` otherwise recurses without bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Stop after this many errors. Zero collects every error.
    pub max_errors: usize,

    /// Abort once this many schema-path frames are active. The root counts
    /// as one frame and each nested `ref` adds one. Zero imposes no limit.
    pub max_depth: usize,

    /// Reject object members not named by a properties-form schema
    pub strict_instance_semantics: bool,
}

impl ValidatorConfig {
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_strict_instance_semantics(mut self, strict: bool) -> Self {
        self.strict_instance_semantics = strict;
        self
    }
}

/// A single place where an instance failed its schema.
///
/// `instance_path` locates the offending value: array indices appear as
/// decimal strings, object keys as-is. `schema_path` locates the keyword that
/// rejected it, starting from `definitions/<name>` when the failure happened
/// inside a referenced definition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValidationError {
    instance_path: Vec<String>,
    schema_path: Vec<String>,
}

impl ValidationError {
    pub fn new(instance_path: Vec<String>, schema_path: Vec<String>) -> Self {
        Self {
            instance_path,
            schema_path,
        }
    }

    pub fn instance_path(&self) -> &[String] {
        &self.instance_path
    }

    pub fn schema_path(&self) -> &[String] {
        &self.schema_path
    }

    /// RFC 6901 rendering of [`Self::instance_path`]. The root is `""`.
    pub fn instance_pointer(&self) -> String {
        to_pointer(&self.instance_path)
    }

    pub fn schema_pointer(&self) -> String {
        to_pointer(&self.schema_path)
    }
}

fn to_pointer(tokens: &[String]) -> String {
    JsonPointer::<String, &[String]>::new(tokens).to_string()
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "instance at '{}' rejected by schema at '{}'",
            self.instance_pointer(),
            self.schema_pointer()
        )
    }
}

/// Pointer form of a [`ValidationError`], as exchanged in reports and
/// conformance suites
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub instance_path: String,
    pub schema_path: String,
}

impl From<&ValidationError> for ErrorReport {
    fn from(err: &ValidationError) -> Self {
        Self {
            instance_path: err.instance_pointer(),
            schema_path: err.schema_pointer(),
        }
    }
}

/// Errors found while validating one instance, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Put errors in a canonical order, independent of traversal order
    pub fn sort(&mut self) {
        self.errors.sort();
    }

    pub fn reports(&self) -> Vec<ErrorReport> {
        self.errors.iter().map(ErrorReport::from).collect()
    }
}

impl From<Vec<ValidationError>> for ValidationResult {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for ValidationResult {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationResult {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Validates instances against verified schemas.
///
/// A validator holds only its configuration, so one instance can serve any
/// number of calls, from any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate `instance` against `schema`.
    ///
    /// An invalid instance is still `Ok`; the result lists what was wrong
    /// with it. `Err` means evaluation itself was aborted.
    pub fn validate(
        &self,
        schema: &Schema,
        instance: &Value,
    ) -> Result<ValidationResult, ValidateError> {
        let errors = Vm::new(&self.config, schema).run(instance)?;
        tracing::debug!(errors = errors.len(), form = %schema.form(), "validation finished");
        Ok(ValidationResult::from(errors))
    }
}

/// Validate `instance` against `schema` with the given configuration
pub fn validate(
    schema: &Schema,
    instance: &Value,
    config: ValidatorConfig,
) -> Result<ValidationResult, ValidateError> {
    Validator::with_config(config).validate(schema, instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        Schema::from_value(value).unwrap()
    }

    #[test]
    fn test_readme_example() {
        let schema = schema(json!({
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "number"},
                "phones": {"elements": {"type": "string"}}
            }
        }));
        let validator = Validator::new();

        let ok = validator
            .validate(
                &schema,
                &json!({"name": "John Doe", "age": 43, "phones": ["+44 1234567", "+44 2345678"]}),
            )
            .unwrap();
        assert!(ok.is_valid());

        let mut bad = validator
            .validate(&schema, &json!({"age": "43", "phones": ["+44 1234567", 442345678]}))
            .unwrap();
        bad.sort();
        let reports = bad.reports();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].instance_path, "");
        assert_eq!(reports[0].schema_path, "/properties/name");
        assert_eq!(reports[1].instance_path, "/age");
        assert_eq!(reports[1].schema_path, "/properties/age/type");
        assert_eq!(reports[2].instance_path, "/phones/1");
        assert_eq!(reports[2].schema_path, "/properties/phones/elements/type");
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::new(vec!["a".into(), "0".into()], vec!["values".into()]);
        assert_eq!(
            err.to_string(),
            "instance at '/a/0' rejected by schema at '/values'"
        );
    }

    #[test]
    fn test_pointer_escaping() {
        let err = ValidationError::new(
            vec!["a/b".into(), "m~n".into()],
            vec!["values".into(), "".into()],
        );
        assert_eq!(err.instance_pointer(), "/a~1b/m~0n");
        assert_eq!(err.schema_pointer(), "/values/");

        let root = ValidationError::new(vec![], vec![]);
        assert_eq!(root.instance_pointer(), "");
        assert_eq!(root.schema_pointer(), "");
    }

    #[test]
    fn test_report_serialization() {
        let err = ValidationError::new(vec![], vec!["discriminator".into(), "tag".into()]);
        let report = serde_json::to_value(ErrorReport::from(&err)).unwrap();
        assert_eq!(
            report,
            json!({"instancePath": "", "schemaPath": "/discriminator/tag"})
        );
    }

    #[test]
    fn test_config_builders() {
        let config = ValidatorConfig::default()
            .with_max_errors(5)
            .with_max_depth(32)
            .with_strict_instance_semantics(true);
        assert_eq!(config.max_errors, 5);
        assert_eq!(config.max_depth, 32);
        assert!(config.strict_instance_semantics);
        assert_eq!(Validator::with_config(config).config(), &config);
    }
}
