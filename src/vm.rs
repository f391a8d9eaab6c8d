//! The validation engine
//!
//! Walks a verified schema and an instance in lockstep. Two signals leave a
//! step: `Err(ValidateError)` aborts the whole call, while
//! `Ok(ControlFlow::Break(()))` means the error budget is spent and the walk
//! should unwind quietly, keeping what was collected.

use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::ControlFlow;

use crate::error::ValidateError;
use crate::schema::{Schema, SchemaShape};
use crate::validator::{ValidationError, ValidatorConfig};

type Step = Result<ControlFlow<()>, ValidateError>;

/// Run a step, unwinding early if it spent the error budget
macro_rules! step {
    ($e:expr) => {
        if let ControlFlow::Break(()) = $e? {
            return Ok(ControlFlow::Break(()));
        }
    };
}

const CONTINUE: Step = Ok(ControlFlow::Continue(()));

pub(crate) struct Vm<'a> {
    config: &'a ValidatorConfig,
    root: &'a Schema,
    instance_tokens: Vec<String>,
    /// One frame per active ref, plus the root frame
    schema_tokens: Vec<Vec<String>>,
    errors: Vec<ValidationError>,
}

impl<'a> Vm<'a> {
    pub(crate) fn new(config: &'a ValidatorConfig, root: &'a Schema) -> Self {
        Self {
            config,
            root,
            instance_tokens: Vec::new(),
            schema_tokens: vec![Vec::new()],
            errors: Vec::new(),
        }
    }

    pub(crate) fn run(mut self, instance: &Value) -> Result<Vec<ValidationError>, ValidateError> {
        let root = self.root;
        if self.validate(root, instance, None)?.is_break() {
            tracing::debug!(max_errors = self.config.max_errors, "error budget exhausted");
        }
        Ok(self.errors)
    }

    fn validate(&mut self, schema: &'a Schema, instance: &Value, parent_tag: Option<&str>) -> Step {
        match schema.shape() {
            SchemaShape::Empty => CONTINUE,
            SchemaShape::Ref(name) => self.validate_ref(name, instance),
            SchemaShape::Type(ty) => {
                if ty.accepts(instance) {
                    CONTINUE
                } else {
                    self.report(&["type"], None)
                }
            }
            SchemaShape::Enum(values) => match instance.as_str() {
                Some(s) if values.contains(s) => CONTINUE,
                _ => self.report(&["enum"], None),
            },
            SchemaShape::Elements(elements) => {
                let Some(items) = instance.as_array() else {
                    return self.report(&["elements"], None);
                };
                self.push_schema("elements");
                for (index, item) in items.iter().enumerate() {
                    self.instance_tokens.push(index.to_string());
                    step!(self.validate(elements, item, None));
                    self.instance_tokens.pop();
                }
                self.pop_schema();
                CONTINUE
            }
            SchemaShape::Properties { required, optional } => {
                self.validate_properties(required.as_ref(), optional.as_ref(), instance, parent_tag)
            }
            SchemaShape::Values(values) => {
                let Some(members) = instance.as_object() else {
                    return self.report(&["values"], None);
                };
                self.push_schema("values");
                for (key, member) in members {
                    self.instance_tokens.push(key.clone());
                    step!(self.validate(values, member, None));
                    self.instance_tokens.pop();
                }
                self.pop_schema();
                CONTINUE
            }
            SchemaShape::Discriminator { tag, mapping } => {
                let Some(members) = instance.as_object() else {
                    return self.report(&["discriminator"], None);
                };
                self.push_schema("discriminator");
                match members.get(tag.as_str()) {
                    None => step!(self.report(&["tag"], None)),
                    Some(Value::String(value)) => match mapping.get(value.as_str()) {
                        Some(variant) => {
                            self.push_schema("mapping");
                            self.push_schema(value);
                            step!(self.validate(variant, instance, Some(tag.as_str())));
                            self.pop_schema();
                            self.pop_schema();
                        }
                        None => step!(self.report(&["mapping"], Some(tag.as_str()))),
                    },
                    Some(_) => step!(self.report(&["tag"], Some(tag.as_str()))),
                }
                self.pop_schema();
                CONTINUE
            }
        }
    }

    fn validate_ref(&mut self, name: &str, instance: &Value) -> Step {
        let depth = self.schema_tokens.len();
        if self.config.max_depth != 0 && depth == self.config.max_depth {
            tracing::warn!(
                max_depth = self.config.max_depth,
                definition = name,
                "maximum evaluation depth exceeded"
            );
            return Err(ValidateError::MaxDepthExceeded);
        }

        let root = self.root;
        // Verification guarantees every ref names a root definition.
        let Some(target) = root.definition(name) else {
            return CONTINUE;
        };

        tracing::trace!(definition = name, depth, "resolving ref");
        self.schema_tokens
            .push(vec!["definitions".to_string(), name.to_string()]);
        step!(self.validate(target, instance, None));
        self.schema_tokens.pop();
        CONTINUE
    }

    fn validate_properties(
        &mut self,
        required: Option<&'a BTreeMap<String, Schema>>,
        optional: Option<&'a BTreeMap<String, Schema>>,
        instance: &Value,
        parent_tag: Option<&str>,
    ) -> Step {
        let Some(members) = instance.as_object() else {
            let keyword = if required.is_some() {
                "properties"
            } else {
                "optionalProperties"
            };
            return self.report(&[keyword], None);
        };

        if let Some(required) = required {
            self.push_schema("properties");
            for (name, schema) in required {
                self.push_schema(name);
                match members.get(name.as_str()) {
                    Some(member) => {
                        self.instance_tokens.push(name.clone());
                        step!(self.validate(schema, member, None));
                        self.instance_tokens.pop();
                    }
                    None => step!(self.report(&[], None)),
                }
                self.pop_schema();
            }
            self.pop_schema();
        }

        if let Some(optional) = optional {
            self.push_schema("optionalProperties");
            for (name, schema) in optional {
                if let Some(member) = members.get(name.as_str()) {
                    self.push_schema(name);
                    self.instance_tokens.push(name.clone());
                    step!(self.validate(schema, member, None));
                    self.instance_tokens.pop();
                    self.pop_schema();
                }
            }
            self.pop_schema();
        }

        if self.config.strict_instance_semantics {
            for key in members.keys() {
                // The enclosing discriminator's tag is exempt, one level only.
                if parent_tag == Some(key.as_str()) {
                    continue;
                }
                let known = required.is_some_and(|r| r.contains_key(key))
                    || optional.is_some_and(|o| o.contains_key(key));
                if !known {
                    step!(self.report(&[], Some(key.as_str())));
                }
            }
        }

        CONTINUE
    }

    fn push_schema(&mut self, token: &str) {
        if let Some(frame) = self.schema_tokens.last_mut() {
            frame.push(token.to_string());
        }
    }

    fn pop_schema(&mut self) {
        if let Some(frame) = self.schema_tokens.last_mut() {
            frame.pop();
        }
    }

    /// Record an error at the current location, extended by `keywords` on
    /// the schema side and `instance_key` on the instance side.
    fn report(&mut self, keywords: &[&str], instance_key: Option<&str>) -> Step {
        let mut instance_path = self.instance_tokens.clone();
        instance_path.extend(instance_key.map(str::to_string));

        let mut schema_path = self.schema_tokens.last().cloned().unwrap_or_default();
        schema_path.extend(keywords.iter().map(|k| k.to_string()));

        self.errors
            .push(ValidationError::new(instance_path, schema_path));

        if self.config.max_errors != 0 && self.errors.len() >= self.config.max_errors {
            Ok(ControlFlow::Break(()))
        } else {
            CONTINUE
        }
    }
}
