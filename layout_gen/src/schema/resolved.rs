use super::errors::SchemaError;
use layout_types::{InitValue, PrimitiveType};
use serde_derive::{Deserialize, Serialize};

/// Platform parameters the layout math depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
  pub ptr_width: u64,
}

impl Target {
  pub fn new(ptr_width: u64) -> Result<Self, SchemaError> {
    match ptr_width {
      4 | 8 => Ok(Self { ptr_width }),
      other => Err(SchemaError::InvalidPointerWidth(other)),
    }
  }

  pub fn size_of(&self, ty: PrimitiveType) -> u64 {
    ty.fixed_size().unwrap_or(self.ptr_width)
  }
}

impl Default for Target {
  fn default() -> Self {
    Self { ptr_width: 8 }
  }
}

/// Tag-id constant generated for the layout called `name`.
pub fn layout_const_name(name: &str) -> String {
  format!("LAYOUT_{}", name.to_uppercase())
}

/// Index of a field inside its owning layout's flattened field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub usize);

/// Initial value after name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitConst {
  Int(i64),
  Null,
  UndefWord,
  UndefType,
}

impl InitConst {
  pub fn from_def(init: &InitValue) -> Option<Self> {
    match init {
      InitValue::Int(v) => Some(InitConst::Int(*v)),
      InitValue::Named(name) => match name.as_str() {
        "null" => Some(InitConst::Null),
        "undef_word" => Some(InitConst::UndefWord),
        "undef_type" => Some(InitConst::UndefType),
        other => other.parse::<i64>().ok().map(InitConst::Int),
      },
    }
  }

  /// Zero-valued initializers are never written: fresh allocations are zero-filled.
  pub fn is_zero(&self) -> bool {
    matches!(self, InitConst::Int(0) | InitConst::Null | InitConst::UndefType)
  }
}

/// How a field's start offset is aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Alignment {
  /// Constant padding folded into the offset formula.
  Static { pad: u64 },
  /// Rounded up to the pointer width at run time.
  Dynamic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedField {
  pub name: String,
  pub ty: PrimitiveType,
  /// Element size in bytes (the whole slot for fixed-length fields).
  pub elem_size: u64,
  pub size_field: Option<FieldId>,
  pub type_field: Option<FieldId>,
  pub init: Option<InitConst>,
  pub align: Alignment,
  /// Byte offset when it is provable at generation time.
  pub static_offset: Option<u64>,
}

impl ResolvedField {
  pub fn is_variable(&self) -> bool {
    self.size_field.is_some()
  }

  /// Traced by the collector: heap references and word/type pairs.
  pub fn is_traced(&self) -> bool {
    self.ty == PrimitiveType::Refptr || self.type_field.is_some()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLayout {
  pub id: u32,
  pub name: String,
  pub category: String,
  pub comment: Option<String>,
  pub fields: Vec<ResolvedField>,
  /// Distinct size fields in first-use order; one count parameter each.
  pub size_fields: Vec<FieldId>,
}

impl ResolvedLayout {
  pub fn field(&self, id: FieldId) -> Option<&ResolvedField> {
    self.fields.get(id.0)
  }

  pub fn field_by_name(&self, name: &str) -> Option<(FieldId, &ResolvedField)> {
    self.fields.iter().enumerate().find(|(_, f)| f.name == name).map(|(idx, f)| (FieldId(idx), f))
  }

  /// Name of the generated tag-id constant (`LAYOUT_STR`).
  pub fn id_const_name(&self) -> String {
    layout_const_name(&self.name)
  }

  pub fn is_fixed_size(&self) -> bool {
    self.size_fields.is_empty()
  }
}
