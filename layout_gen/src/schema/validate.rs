/* Basic schema checks run before any layout is flattened */

use super::errors::SchemaError;
use super::resolved::{InitConst, layout_const_name};
use layout_types::LayoutDef;
use std::collections::HashMap;

/* Names used for parameters and locals of generated functions */
pub const RESERVED_NAMES: &[&str] = &["o", "i", "v", "t", "vm"];

/* Prefix of the generic `layout_sizeof` / `layout_visit_gc` dispatchers */
pub const RESERVED_LAYOUT_NAMES: &[&str] = &["layout"];

pub fn is_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_identifier(what: &'static str, name: &str) -> Result<(), SchemaError> {
  if is_identifier(name) {
    Ok(())
  } else {
    Err(SchemaError::InvalidIdentifier { what, name: name.to_string() })
  }
}

/* Validate layout names and each layout's own declared fields.
 *
 * Duplicates are only checked among a layout's own fields here. Clashes with
 * inherited or header fields are caught once the field list is flattened. */
pub fn validate_schema(layouts: &[LayoutDef]) -> Result<(), SchemaError> {
  /* Tag constant name -> layout that generates it */
  let mut constants: HashMap<String, &str> = HashMap::new();

  for layout in layouts {
    check_identifier("layout name", &layout.name)?;
    check_identifier("category", &layout.category)?;
    if RESERVED_LAYOUT_NAMES.contains(&layout.name.as_str()) {
      return Err(SchemaError::ReservedLayoutName(layout.name.clone()));
    }

    let constant = layout_const_name(&layout.name);
    if let Some(first) = constants.get(&constant) {
      if *first == layout.name {
        return Err(SchemaError::DuplicateLayout(layout.name.clone()));
      }
      return Err(SchemaError::ConflictingLayoutNames {
        first: first.to_string(),
        second: layout.name.clone(),
        constant,
      });
    }
    constants.insert(constant, layout.name.as_str());

    for (field_idx, field) in layout.fields.iter().enumerate() {
      check_identifier("field name", &field.name)?;

      if RESERVED_NAMES.contains(&field.name.as_str()) {
        return Err(SchemaError::ReservedName { layout: layout.name.clone(), field: field.name.clone() });
      }

      if layout.fields[..field_idx].iter().any(|prev| prev.name == field.name) {
        return Err(SchemaError::DuplicateField { layout: layout.name.clone(), field: field.name.clone() });
      }

      if let Some(init) = &field.init {
        InitConst::from_def(init).ok_or_else(|| SchemaError::UnknownInitValue {
          layout: layout.name.clone(),
          field: field.name.clone(),
          value: init.to_string(),
        })?;
      }
    }
  }

  Ok(())
}
