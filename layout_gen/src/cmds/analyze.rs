/* Analyze command - detailed layout analysis and reporting */

use super::common::load_and_resolve;
use anyhow::{Context, anyhow};
use layout_gen::codegen::shared::builder::IrBuilder;
use layout_gen::schema::{Alignment, InitConst, ResolvedField, ResolvedLayout};
use std::path::PathBuf;

/* Execute the analyze command */
pub fn run(file: Option<PathBuf>, ptr_width: u64, print_ir: bool, layout: Option<String>) -> anyhow::Result<()> {
  println!("Layout Generator - Layout Analysis Tool");
  println!("=======================================\n");

  let (target, layouts) = load_and_resolve(file.as_deref(), ptr_width, true)?;

  let selected: Vec<&ResolvedLayout> = match layout.as_deref() {
    Some(name) => {
      let found = layouts
        .iter()
        .find(|l| l.name == name)
        .ok_or_else(|| anyhow!("Layout '{}' not found in schema", name))?;
      vec![found]
    }
    None => layouts.iter().collect(),
  };

  for resolved in &selected {
    print_layout(resolved);
  }

  if print_ir {
    let ir = IrBuilder::new(target)
      .build_all(&layouts)
      .context("Failed to synthesize layout functions")?;
    let json = serde_json::to_string_pretty(&ir).context("Failed to serialize layout IR")?;
    println!("[~] Layout IR:");
    println!("{}", json);
  }

  Ok(())
}

fn print_layout(layout: &ResolvedLayout) {
  println!("Layout: {} (id {}, category {})", layout.name, layout.id, layout.category);
  println!("---------------------------------------------");
  if let Some(comment) = &layout.comment {
    println!("  {}", comment.trim());
  }
  println!("  Constant: {} = {}", layout.id_const_name(), layout.id);
  if layout.is_fixed_size() {
    println!("  Size: fixed");
  } else {
    let params: Vec<&str> = layout
      .size_fields
      .iter()
      .filter_map(|id| layout.field(*id))
      .map(|f| f.name.as_str())
      .collect();
    println!("  Size: variable, allocated with ({})", params.join(", "));
  }

  for field in &layout.fields {
    println!("  {}", describe_field(layout, field));
  }
  println!();
}

fn describe_field(layout: &ResolvedLayout, field: &ResolvedField) -> String {
  let mut line = format!("{:<12} {:<9}", field.name, field.ty.name());

  let offset = match field.static_offset {
    Some(offset) => format!("@{}", offset),
    None => "@dynamic".to_string(),
  };
  line.push_str(&format!(" {:<9}", offset));

  match field.align {
    Alignment::Static { pad: 0 } => {}
    Alignment::Static { pad } => line.push_str(&format!(" pad={}", pad)),
    Alignment::Dynamic => line.push_str(" align=ptr"),
  }

  let field_name = |id| layout.field(id).map(|f| f.name.as_str()).unwrap_or("?");
  if let Some(size) = field.size_field {
    line.push_str(&format!(" [{}]", field_name(size)));
  }
  if let Some(tag) = field.type_field {
    line.push_str(&format!(" type={}", field_name(tag)));
  }
  if let Some(init) = field.init {
    let value = match init {
      InitConst::Int(v) => v.to_string(),
      InitConst::Null => "null".to_string(),
      InitConst::UndefWord => "undef_word".to_string(),
      InitConst::UndefType => "undef_type".to_string(),
    };
    line.push_str(&format!(" init={}", value));
  }
  if field.is_traced() {
    line.push_str(" traced");
  }

  line
}
