//! Schema correctness verification
//!
//! Walks a wire schema once, in the same priority order the form resolver
//! uses, and stops at the first violation. Instances are never consulted.

use std::collections::{BTreeMap, HashSet};

use crate::error::SchemaError;
use crate::schema::{Form, SerdeSchema, Type};

type Verified = Result<(), SchemaError>;

/// Verify a root schema.
///
/// Root definitions are checked first, in name order, followed by the root
/// itself. Definitions nested below the root are not resolvable and are
/// ignored.
pub fn verify(root: &SerdeSchema) -> Verified {
    let result = verify_root(root);
    if let Err(err) = &result {
        tracing::debug!(error = %err, form = %root.form(), "schema rejected");
    }
    result
}

fn verify_root(root: &SerdeSchema) -> Verified {
    if let Some(definitions) = &root.definitions {
        for definition in definitions.values() {
            verify_node(root, definition)?;
        }
    }
    verify_node(root, root)
}

/// Marks a group as populated, failing if another group already was
fn claim(is_empty: &mut bool) -> Verified {
    if !*is_empty {
        return Err(SchemaError::InvalidForm);
    }
    *is_empty = false;
    Ok(())
}

fn verify_map(root: &SerdeSchema, map: Option<&BTreeMap<String, SerdeSchema>>) -> Verified {
    map.into_iter()
        .flat_map(|m| m.values())
        .try_for_each(|schema| verify_node(root, schema))
}

fn verify_node(root: &SerdeSchema, schema: &SerdeSchema) -> Verified {
    let mut is_empty = true;

    if let Some(name) = &schema.ref_ {
        claim(&mut is_empty)?;
        let defined = root
            .definitions
            .as_ref()
            .is_some_and(|defs| defs.contains_key(name));
        if !defined {
            return Err(SchemaError::NoSuchDefinition(name.clone()));
        }
    }

    if let Some(tag) = schema.type_tag() {
        claim(&mut is_empty)?;
        tag.parse::<Type>()?;
    }

    if let Some(values) = &schema.enum_ {
        claim(&mut is_empty)?;
        let mut seen = HashSet::with_capacity(values.len());
        if let Some(repeated) = values.iter().find(|v| !seen.insert(v.as_str())) {
            return Err(SchemaError::RepeatedEnumValue(repeated.clone()));
        }
    }

    if let Some(elements) = &schema.elements {
        claim(&mut is_empty)?;
        verify_node(root, elements)?;
    }

    let required = schema.properties.as_ref();
    let optional = schema.optional_properties.as_ref();
    if required.is_some() || optional.is_some() {
        claim(&mut is_empty)?;

        if let (Some(required), Some(optional)) = (required, optional) {
            if let Some(name) = required.keys().find(|k| optional.contains_key(*k)) {
                return Err(SchemaError::RepeatedProperty(name.clone()));
            }
        }

        verify_map(root, required)?;
        verify_map(root, optional)?;
    }

    if let Some(values) = &schema.values {
        claim(&mut is_empty)?;
        verify_node(root, values)?;
    }

    if let Some(mapping) = schema.discriminator_mapping() {
        claim(&mut is_empty)?;
        let tag = schema
            .discriminator
            .as_ref()
            .map(|d| d.tag.as_str())
            .unwrap_or_default();

        for variant in mapping.values() {
            verify_node(root, variant)?;

            if variant.form() != Form::Properties {
                return Err(SchemaError::NonPropertiesMapping);
            }

            let repeats_tag = [&variant.properties, &variant.optional_properties]
                .into_iter()
                .flatten()
                .any(|props| props.contains_key(tag));
            if repeats_tag {
                return Err(SchemaError::RepeatedTagInProperties(tag.to_string()));
            }
        }
    }

    Ok(())
}
