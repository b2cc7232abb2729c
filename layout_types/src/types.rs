use serde_derive::{Deserialize, Serialize};

/// Primitive slot kinds a layout field may hold.
///
/// Pointer kinds are as wide as the target platform pointer; every other kind
/// has a fixed width.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveType {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float64,
    /// Untraced pointer into native memory.
    Rawptr,
    /// Traced pointer into the managed heap.
    Refptr,
    /// Pointer to generated machine code.
    Funptr,
    /// Pointer to an object shape descriptor.
    Shapeptr,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 13] = [
        PrimitiveType::Uint8,
        PrimitiveType::Uint16,
        PrimitiveType::Uint32,
        PrimitiveType::Uint64,
        PrimitiveType::Int8,
        PrimitiveType::Int16,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::Float64,
        PrimitiveType::Rawptr,
        PrimitiveType::Refptr,
        PrimitiveType::Funptr,
        PrimitiveType::Shapeptr,
    ];

    /// Schema spelling of the kind (`uint32`, `refptr`, ...).
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Uint8 => "uint8",
            PrimitiveType::Uint16 => "uint16",
            PrimitiveType::Uint32 => "uint32",
            PrimitiveType::Uint64 => "uint64",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::Float64 => "float64",
            PrimitiveType::Rawptr => "rawptr",
            PrimitiveType::Refptr => "refptr",
            PrimitiveType::Funptr => "funptr",
            PrimitiveType::Shapeptr => "shapeptr",
        }
    }

    /// Width in bytes for kinds that do not depend on the platform pointer.
    pub fn fixed_size(self) -> Option<u64> {
        match self {
            PrimitiveType::Uint8 | PrimitiveType::Int8 => Some(1),
            PrimitiveType::Uint16 | PrimitiveType::Int16 => Some(2),
            PrimitiveType::Uint32 | PrimitiveType::Int32 => Some(4),
            PrimitiveType::Uint64 | PrimitiveType::Int64 | PrimitiveType::Float64 => Some(8),
            PrimitiveType::Rawptr
            | PrimitiveType::Refptr
            | PrimitiveType::Funptr
            | PrimitiveType::Shapeptr => None,
        }
    }

    pub fn is_pointer(self) -> bool {
        self.fixed_size().is_none()
    }

    pub fn is_integer(self) -> bool {
        !self.is_pointer() && self != PrimitiveType::Float64
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PrimitiveType::Int8 | PrimitiveType::Int16 | PrimitiveType::Int32 | PrimitiveType::Int64
        )
    }
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared initial value of a field.
///
/// Integers are written verbatim; named values (`null`, `undef_word`,
/// `undef_type`) are mapped to runtime constants by the generator.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(untagged)]
pub enum InitValue {
    Int(i64),
    Named(String),
}

impl std::fmt::Display for InitValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitValue::Int(v) => write!(f, "{}", v),
            InitValue::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: PrimitiveType,
    /// Name of an earlier field holding this field's element count. Present
    /// only on variable-length fields.
    #[serde(default)]
    pub size_field: Option<String>,
    /// Name of the sibling field holding the runtime type tag of this word.
    #[serde(default)]
    pub type_field: Option<String>,
    #[serde(default)]
    pub init: Option<InitValue>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            field_type,
            size_field: None,
            type_field: None,
            init: None,
        }
    }

    pub fn sized_by(mut self, size_field: impl Into<String>) -> Self {
        self.size_field = Some(size_field.into());
        self
    }

    pub fn typed_by(mut self, type_field: impl Into<String>) -> Self {
        self.type_field = Some(type_field.into());
        self
    }

    pub fn with_init(mut self, init: InitValue) -> Self {
        self.init = Some(init);
        self
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct LayoutDef {
    pub name: String,
    /// Name of an earlier layout whose fields are prepended to this one.
    #[serde(default)]
    pub extends: Option<String>,
    /// Allocation category handed to the allocator (`string`, `object`, ...).
    pub category: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl LayoutDef {
    pub fn new(name: impl Into<String>, category: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            category: category.into(),
            fields,
            comment: None,
        }
    }

    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_keys_are_kebab_case() {
        let yaml = r#"
name: obj
category: object
fields:
  - name: cap
    type: uint32
  - name: word
    type: uint64
    size-field: cap
    type-field: type
    init: undef_word
  - name: num
    type: int32
    init: 7
"#;
        let layout: LayoutDef = serde_yml::from_str(yaml).expect("parse layout");
        assert_eq!(layout.extends, None);
        assert_eq!(layout.fields.len(), 3);
        assert_eq!(layout.fields[1].size_field.as_deref(), Some("cap"));
        assert_eq!(layout.fields[1].type_field.as_deref(), Some("type"));
        assert_eq!(layout.fields[1].init, Some(InitValue::Named("undef_word".into())));
        assert_eq!(layout.fields[2].init, Some(InitValue::Int(7)));
    }

    #[test]
    fn pointer_kinds_have_no_fixed_size() {
        for ty in PrimitiveType::ALL {
            assert_eq!(ty.is_pointer(), ty.name().ends_with("ptr"), "{ty}");
        }
        assert_eq!(PrimitiveType::Uint16.fixed_size(), Some(2));
        assert!(PrimitiveType::Int64.is_signed());
        assert!(!PrimitiveType::Float64.is_integer());
    }

    #[test]
    fn init_values_display_as_written() {
        assert_eq!(InitValue::Named("undef_word".into()).to_string(), "undef_word");
        assert_eq!(InitValue::Int(-3).to_string(), "-3");
    }
}
