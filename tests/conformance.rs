//! Conformance Tests
//!
//! Each fixture is a list of cases: a schema, whether strict instance
//! semantics apply, and instances with the exact errors they must produce.
//! Error order is unspecified, so both sides are sorted before comparison.

use json_pointer::JsonPointer;
use jsl::{ErrorReport, Schema, Validator, ValidatorConfig};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestCase {
    name: String,
    schema: Value,
    #[serde(default)]
    strict_instance: bool,
    instances: Vec<InstanceCase>,
}

#[derive(Deserialize)]
struct InstanceCase {
    instance: Value,
    errors: Vec<ErrorReport>,
}

fn assert_pointer_round_trips(pointer: &str, tokens: &[String]) {
    if tokens.is_empty() {
        assert_eq!(pointer, "");
        return;
    }
    let parsed: JsonPointer<String, Vec<String>> = pointer
        .parse()
        .unwrap_or_else(|e| panic!("{pointer}: {e:?}"));
    assert_eq!(parsed.to_string(), pointer);
}

fn run_suite(suite: &str, fixture: &str) {
    let cases: Vec<TestCase> = serde_json::from_str(fixture).unwrap();
    assert!(!cases.is_empty(), "{suite}: no cases");

    for case in cases {
        let schema = Schema::from_value(case.schema.clone())
            .unwrap_or_else(|e| panic!("{suite}/{}: schema rejected: {e}", case.name));
        let validator = Validator::with_config(
            ValidatorConfig::default()
                .with_max_depth(32)
                .with_strict_instance_semantics(case.strict_instance),
        );

        for (i, instance_case) in case.instances.into_iter().enumerate() {
            let result = validator
                .validate(&schema, &instance_case.instance)
                .unwrap_or_else(|e| panic!("{suite}/{}/{i}: {e}", case.name));

            for err in result.iter() {
                assert_pointer_round_trips(&err.instance_pointer(), err.instance_path());
                assert_pointer_round_trips(&err.schema_pointer(), err.schema_path());
            }

            let mut actual = result.reports();
            let mut expected = instance_case.errors;
            actual.sort();
            expected.sort();
            assert_eq!(actual, expected, "{suite}/{}/{i}", case.name);
        }
    }
}

#[test]
fn test_empty_suite() {
    run_suite("empty", include_str!("fixtures/empty.json"));
}

#[test]
fn test_type_suite() {
    run_suite("type", include_str!("fixtures/type.json"));
}

#[test]
fn test_enum_suite() {
    run_suite("enum", include_str!("fixtures/enum.json"));
}

#[test]
fn test_elements_suite() {
    run_suite("elements", include_str!("fixtures/elements.json"));
}

#[test]
fn test_properties_suite() {
    run_suite("properties", include_str!("fixtures/properties.json"));
}

#[test]
fn test_values_suite() {
    run_suite("values", include_str!("fixtures/values.json"));
}

#[test]
fn test_ref_suite() {
    run_suite("ref", include_str!("fixtures/ref.json"));
}

#[test]
fn test_discriminator_suite() {
    run_suite("discriminator", include_str!("fixtures/discriminator.json"));
}
