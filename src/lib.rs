//! JSON Schema Language
//!
//! Checks that JSON data ("instances") conforms to a schema written in a
//! small, closed grammar of eight mutually exclusive forms. Schemas and
//! instances may both be untrusted: verification is a single linear pass, and
//! validation is bounded by an error budget and a reference-depth limit.
//!
//! ## Forms
//!
//! | Form            | Keyword(s)                          | Accepts                         |
//! |-----------------|-------------------------------------|---------------------------------|
//! | empty           | (none)                              | anything                        |
//! | ref             | `ref`                               | whatever the definition accepts |
//! | type            | `type`                              | a primitive of that type        |
//! | enum            | `enum`                              | one of the listed strings       |
//! | elements        | `elements`                          | arrays of matching items        |
//! | properties      | `properties`, `optionalProperties`  | objects of that shape           |
//! | values          | `values`                            | objects with matching values    |
//! | discriminator   | `discriminator`                     | tagged unions of objects        |
//!
//! ## Usage
//!
//! ```
//! use jsl::{Schema, Validator, ValidatorConfig};
//! use serde_json::json;
//!
//! let schema = Schema::from_value(json!({
//!     "properties": {
//!         "name": { "type": "string" },
//!         "phones": { "elements": { "type": "string" } }
//!     }
//! })).unwrap();
//!
//! let validator = Validator::with_config(ValidatorConfig::default().with_max_depth(32));
//! let result = validator.validate(&schema, &json!({ "phones": [1] })).unwrap();
//! assert_eq!(result.len(), 2);
//! ```

pub mod config;
pub mod error;
pub mod schema;
pub mod validator;
pub mod verify;

mod vm;

pub use config::{JslConfig, OutputConfig, OutputFormat};
pub use error::{Error, Result, SchemaError, ValidateError};
pub use schema::{Form, Schema, SchemaShape, SerdeDiscriminator, SerdeSchema, Type};
pub use validator::{
    validate, ErrorReport, ValidationError, ValidationResult, Validator, ValidatorConfig,
};
pub use verify::verify;
