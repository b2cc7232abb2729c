/* Size-field and type-field resolution */

use super::errors::SchemaError;
use super::ids::TaggedLayout;
use super::resolved::{FieldId, InitConst};
use layout_types::PrimitiveType;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundField {
  pub name: String,
  pub ty: PrimitiveType,
  pub size_field: Option<FieldId>,
  pub type_field: Option<FieldId>,
  pub init: Option<InitConst>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundLayout {
  pub id: u32,
  pub name: String,
  pub category: String,
  pub comment: Option<String>,
  pub fields: Vec<BoundField>,
  pub size_fields: Vec<FieldId>,
}

/* Element counts are 32-bit in generated code */
fn is_count_type(ty: PrimitiveType) -> bool {
  ty.is_integer() && ty.fixed_size().is_some_and(|size| size <= 4)
}

/* Replace size/type field names with references into the flattened list.
 *
 * A size field must appear strictly before the field it governs. A type field
 * may sit anywhere in the layout (word arrays usually precede their tag arrays)
 * but must be governed by the same size field as its word. */
pub fn bind_fields(layout: TaggedLayout) -> Result<BoundLayout, SchemaError> {
  let mut size_fields: Vec<FieldId> = Vec::new();
  let mut fields = Vec::with_capacity(layout.fields.len());

  for (field_idx, field) in layout.fields.iter().enumerate() {
    let size_field = match &field.size_field {
      None => None,
      Some(sz_name) => {
        let sz_idx = layout.fields[..field_idx]
          .iter()
          .position(|prev| &prev.name == sz_name)
          .ok_or_else(|| SchemaError::UnresolvedSizeField {
            layout: layout.name.clone(),
            field: field.name.clone(),
            size_field: sz_name.clone(),
          })?;

        let sz = &layout.fields[sz_idx];
        if sz.size_field.is_some() || !is_count_type(sz.field_type) {
          return Err(SchemaError::InvalidSizeField {
            layout: layout.name.clone(),
            field: field.name.clone(),
            size_field: sz_name.clone(),
          });
        }

        let id = FieldId(sz_idx);
        if !size_fields.contains(&id) {
          size_fields.push(id);
        }
        Some(id)
      }
    };

    let type_field = match &field.type_field {
      None => None,
      Some(tp_name) => {
        let tp_idx = layout.fields.iter().position(|f| &f.name == tp_name).ok_or_else(|| {
          SchemaError::UnresolvedTypeField {
            layout: layout.name.clone(),
            field: field.name.clone(),
            type_field: tp_name.clone(),
          }
        })?;

        /* The tag is read at the word's own index, so both must repeat the same way */
        if layout.fields[tp_idx].size_field != field.size_field {
          return Err(SchemaError::InvalidTypeField {
            layout: layout.name.clone(),
            field: field.name.clone(),
            type_field: tp_name.clone(),
          });
        }
        Some(FieldId(tp_idx))
      }
    };

    let init = match &field.init {
      None => None,
      Some(init) => Some(InitConst::from_def(init).ok_or_else(|| SchemaError::UnknownInitValue {
        layout: layout.name.clone(),
        field: field.name.clone(),
        value: init.to_string(),
      })?),
    };

    fields.push(BoundField { name: field.name.clone(), ty: field.field_type, size_field, type_field, init });
  }

  Ok(BoundLayout {
    id: layout.id,
    name: layout.name,
    category: layout.category,
    comment: layout.comment,
    fields,
    size_fields,
  })
}
