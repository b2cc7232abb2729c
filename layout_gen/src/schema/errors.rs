use thiserror::Error;

/// Fatal schema defects detected while resolving layouts. Nothing is emitted
/// once one of these is raised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
  #[error("duplicate layout name '{0}'")]
  DuplicateLayout(String),

  #[error("duplicate field name '{field}' in layout '{layout}'")]
  DuplicateField { layout: String, field: String },

  #[error("field '{field}' of layout '{layout}' shadows an inherited or header field")]
  ShadowedField { layout: String, field: String },

  #[error("layout '{layout}' extends '{parent}', which is not declared before it")]
  UnknownParent { layout: String, parent: String },

  #[error("size field \"{size_field}\" of \"{field}\" not found in layout '{layout}'")]
  UnresolvedSizeField { layout: String, field: String, size_field: String },

  #[error("type field \"{type_field}\" of \"{field}\" not found in layout '{layout}'")]
  UnresolvedTypeField { layout: String, field: String, type_field: String },

  #[error("size field '{size_field}' of '{field}' in layout '{layout}' must be a fixed-length integer field of at most 32 bits")]
  InvalidSizeField { layout: String, field: String, size_field: String },

  #[error("type field '{type_field}' of '{field}' in layout '{layout}' must share the word's size field")]
  InvalidTypeField { layout: String, field: String, type_field: String },

  #[error("layout name '{0}' is reserved for generated dispatch functions")]
  ReservedLayoutName(String),

  #[error("layouts '{first}' and '{second}' both generate the constant {constant}")]
  ConflictingLayoutNames { first: String, second: String, constant: String },

  #[error("{what} '{name}' is not a valid identifier")]
  InvalidIdentifier { what: &'static str, name: String },

  #[error("field name '{field}' in layout '{layout}' is reserved for generated code")]
  ReservedName { layout: String, field: String },

  #[error("unknown initial value '{value}' for field '{field}' of layout '{layout}'")]
  UnknownInitValue { layout: String, field: String, value: String },

  #[error("unsupported pointer width {0} (expected 4 or 8)")]
  InvalidPointerWidth(u64),
}
