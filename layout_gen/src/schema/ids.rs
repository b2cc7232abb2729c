/* Tag id assignment and header injection */

use super::errors::SchemaError;
use super::inherit::FlatLayout;
use layout_types::{FieldDef, InitValue, PrimitiveType};
use std::collections::HashSet;

/// Forwarding pointer installed by the collector during compaction.
pub const FORWARD_FIELD: &str = "next";
/// Per-instance layout tag read by every dispatch function.
pub const TAG_FIELD: &str = "tag";
pub const TAG_TYPE: PrimitiveType = PrimitiveType::Uint32;
/// Number of injected header fields.
pub const HEADER_FIELDS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedLayout {
  pub id: u32,
  pub name: String,
  pub category: String,
  pub comment: Option<String>,
  pub fields: Vec<FieldDef>,
}

fn header_fields(id: u32) -> [FieldDef; HEADER_FIELDS] {
  [
    FieldDef::new(FORWARD_FIELD, PrimitiveType::Refptr).with_init(InitValue::Named("null".into())),
    FieldDef::new(TAG_FIELD, TAG_TYPE).with_init(InitValue::Int(id as i64)),
  ]
}

/* Assign dense ids in declaration order and prepend the header fields */
pub fn assign_ids(layouts: Vec<FlatLayout>) -> Result<Vec<TaggedLayout>, SchemaError> {
  layouts
    .into_iter()
    .enumerate()
    .map(|(idx, layout)| {
      let id = idx as u32;
      let mut fields: Vec<FieldDef> = header_fields(id).into_iter().collect();
      fields.extend(layout.fields);

      /* Flattened names must be unique; a child may not re-declare an inherited or header field */
      let mut seen = HashSet::new();
      for field in &fields {
        if !seen.insert(field.name.as_str()) {
          return Err(SchemaError::ShadowedField { layout: layout.name.clone(), field: field.name.clone() });
        }
      }

      Ok(TaggedLayout { id, name: layout.name, category: layout.category, comment: layout.comment, fields })
    })
    .collect()
}
