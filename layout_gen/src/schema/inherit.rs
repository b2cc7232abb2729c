/* Inheritance flattening: a child layout starts with copies of its parent's fields */

use super::errors::SchemaError;
use indexmap::IndexMap;
use layout_types::{FieldDef, LayoutDef};
use tracing::debug;

/// Layout whose `extends` chain has been folded into its field list.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatLayout {
  pub name: String,
  pub category: String,
  pub comment: Option<String>,
  pub fields: Vec<FieldDef>,
}

/* Flatten every layout in declaration order.
 *
 * A parent must be declared before its children, so a single pass suffices and
 * the parent's list is already flat when a child copies it. Fields are cloned:
 * later annotation of a child's fields never touches the parent's. */
pub fn flatten_layouts(layouts: &[LayoutDef]) -> Result<Vec<FlatLayout>, SchemaError> {
  let mut flat: IndexMap<String, FlatLayout> = IndexMap::with_capacity(layouts.len());

  for layout in layouts {
    if flat.contains_key(&layout.name) {
      return Err(SchemaError::DuplicateLayout(layout.name.clone()));
    }

    let mut fields = Vec::new();
    if let Some(parent_name) = &layout.extends {
      let parent = flat.get(parent_name).ok_or_else(|| SchemaError::UnknownParent {
        layout: layout.name.clone(),
        parent: parent_name.clone(),
      })?;
      debug!(layout = %layout.name, parent = %parent_name, inherited = parent.fields.len(), "flattening layout");
      fields.extend(parent.fields.iter().cloned());
    }
    fields.extend(layout.fields.iter().cloned());

    flat.insert(
      layout.name.clone(),
      FlatLayout {
        name: layout.name.clone(),
        category: layout.category.clone(),
        comment: layout.comment.clone(),
        fields,
      },
    );
  }

  Ok(flat.into_values().collect())
}

#[cfg(test)]
mod tests {
  use super::*;
  use layout_types::PrimitiveType;

  fn names(layout: &FlatLayout) -> Vec<&str> {
    layout.fields.iter().map(|f| f.name.as_str()).collect()
  }

  #[test]
  fn child_fields_follow_parent_fields() {
    let layouts = vec![
      LayoutDef::new("base", "object", vec![FieldDef::new("a", PrimitiveType::Uint32)]),
      LayoutDef::new("mid", "object", vec![FieldDef::new("b", PrimitiveType::Uint8)]).extending("base"),
      LayoutDef::new("leaf", "object", vec![FieldDef::new("c", PrimitiveType::Refptr)]).extending("mid"),
    ];
    let flat = flatten_layouts(&layouts).unwrap();
    assert_eq!(names(&flat[0]), vec!["a"]);
    assert_eq!(names(&flat[1]), vec!["a", "b"]);
    assert_eq!(names(&flat[2]), vec!["a", "b", "c"]);
  }

  #[test]
  fn forward_reference_is_rejected() {
    let layouts = vec![
      LayoutDef::new("child", "object", vec![]).extending("parent"),
      LayoutDef::new("parent", "object", vec![]),
    ];
    assert_eq!(
      flatten_layouts(&layouts),
      Err(SchemaError::UnknownParent { layout: "child".into(), parent: "parent".into() })
    );
  }

  #[test]
  fn self_extension_is_rejected() {
    let layouts = vec![LayoutDef::new("loop", "object", vec![]).extending("loop")];
    assert!(matches!(flatten_layouts(&layouts), Err(SchemaError::UnknownParent { .. })));
  }

  #[test]
  fn inherited_fields_are_copies() {
    let layouts = vec![
      LayoutDef::new("parent", "object", vec![FieldDef::new("n", PrimitiveType::Uint32)]),
      LayoutDef::new("child", "object", vec![]).extending("parent"),
    ];
    let mut flat = flatten_layouts(&layouts).unwrap();
    flat[1].fields[0].field_type = PrimitiveType::Uint64;
    assert_eq!(flat[0].fields[0].field_type, PrimitiveType::Uint32);
    assert_eq!(layouts[0].fields[0].field_type, PrimitiveType::Uint32);
  }
}
