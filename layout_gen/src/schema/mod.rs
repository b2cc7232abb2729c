pub mod align;
pub mod bindings;
pub mod errors;
pub mod file;
pub mod ids;
pub mod inherit;
pub mod resolved;
pub mod validate;

pub use errors::SchemaError;
pub use resolved::{Alignment, FieldId, InitConst, ResolvedField, ResolvedLayout, Target};

use layout_types::LayoutDef;
use tracing::debug;

/// Runs every resolution phase in order and returns the annotated layouts.
///
/// Each phase consumes the previous phase's output; the first error aborts the
/// whole run.
pub fn resolve_schema(layouts: &[LayoutDef], target: Target) -> Result<Vec<ResolvedLayout>, SchemaError> {
  validate::validate_schema(layouts)?;

  let flat = inherit::flatten_layouts(layouts)?;
  let tagged = ids::assign_ids(flat)?;
  debug!(layouts = tagged.len(), "assigned layout ids");

  let bound = tagged.into_iter().map(bindings::bind_fields).collect::<Result<Vec<_>, _>>()?;

  let resolved: Vec<ResolvedLayout> = bound.into_iter().map(|layout| align::plan_alignment(layout, target)).collect();
  for layout in &resolved {
    debug!(
      layout = %layout.name,
      id = layout.id,
      fields = layout.fields.len(),
      size_fields = layout.size_fields.len(),
      "resolved layout"
    );
  }

  Ok(resolved)
}
