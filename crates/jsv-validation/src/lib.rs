// JSON Schema validation with precise error locations
//
// Schemas are parsed into an object model, compiled into an immutable
// validator, and checked against instances. Every error names the failing
// keyword, where in the instance it failed (legacy `.a[0]` or JSON Pointer
// `/a/0` notation), and where in the schema the keyword lives.

pub mod collector;
pub mod error;
pub mod options;
pub mod path;
pub mod schema;
pub mod validator;

mod compiler;
mod keywords;

pub use collector::{ErrorCollector, Flow};
pub use compiler::{compile, compile_with_registry};
pub use error::{SchemaError, SchemaResult, ValidationError, ValidationErrorKind};
pub use options::{RequiredErrorMode, ValidatorOptions};
pub use path::{InstancePath, PathNotation, PathSegment};
pub use schema::{InstanceType, Items, Keyword, Schema, SchemaObject, SchemaRegistry};
pub use validator::{ValidationResult, ValidationSession, Validator};
