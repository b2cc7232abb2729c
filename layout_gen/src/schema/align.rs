/* Alignment planning: constant padding where provable, run-time rounding otherwise */

use super::bindings::BoundLayout;
use super::resolved::{Alignment, ResolvedField, ResolvedLayout, Target};
use tracing::trace;

/* Annotate every field with its alignment class and, where known, its offset.
 *
 * `cur` is the offset since the last dynamically aligned boundary. A field that
 * directly follows a variable-length region of strictly smaller elements can
 * not be statically aligned (the region length is a run-time count), so it is
 * rounded to the pointer width when the offset is computed. `cur` then restarts
 * at that field's size, not at 0: the rounded field itself already occupies the
 * start of the new boundary, and dropping it would under-pad the next field
 * (a `uint32` count rounded up, then a `refptr` array, needs `pad = 4` for the
 * array to stay pointer-aligned). Any other field gets the pad that aligns `cur` to its own size. A
 * variable-length field contributes a single element to `cur`; whole elements
 * of a size at least as large keep the following offset aligned. */
pub fn plan_alignment(layout: BoundLayout, target: Target) -> ResolvedLayout {
  let mut cur: u64 = 0;
  let mut known: Option<u64> = Some(0);
  let mut fields: Vec<ResolvedField> = Vec::with_capacity(layout.fields.len());

  for field in layout.fields {
    let size = target.size_of(field.ty);

    let after_small_region = fields
      .last()
      .map(|prev| prev.is_variable() && prev.elem_size < size)
      .unwrap_or(false);

    let (align, static_offset) = if after_small_region {
      cur = size;
      known = None;
      (Alignment::Dynamic, None)
    } else {
      let rem = cur % size;
      let pad = if rem != 0 { size - rem } else { 0 };
      cur += pad + size;
      let offset = known.map(|k| k + pad);
      known = match (offset, field.size_field) {
        (Some(ofs), None) => Some(ofs + size),
        _ => None,
      };
      (Alignment::Static { pad }, offset)
    };

    trace!(layout = %layout.name, field = %field.name, size, ?align, ?static_offset, "planned field");

    fields.push(ResolvedField {
      name: field.name,
      ty: field.ty,
      elem_size: size,
      size_field: field.size_field,
      type_field: field.type_field,
      init: field.init,
      align,
      static_offset,
    });
  }

  ResolvedLayout {
    id: layout.id,
    name: layout.name,
    category: layout.category,
    comment: layout.comment,
    fields,
    size_fields: layout.size_fields,
  }
}
