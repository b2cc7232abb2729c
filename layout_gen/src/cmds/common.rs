/* Common utilities shared between analyze and codegen commands */

use anyhow::Context;
use layout_gen::schema::file::SchemaFile;
use layout_gen::schema::{ResolvedLayout, Target, resolve_schema};
use std::path::Path;
use tracing::info;

/* Load a schema file (or the built-in runtime schema) */
pub fn load_schema(file: Option<&Path>, verbose: bool) -> anyhow::Result<SchemaFile> {
  let schema = match file {
    Some(path) => {
      if verbose {
        println!("[~] Loading schema {}", path.display());
      }
      SchemaFile::load(path)?
    }
    None => {
      if verbose {
        println!("[~] Using built-in runtime schema");
      }
      SchemaFile::runtime()?
    }
  };

  if verbose {
    println!("[~] Loaded {} layout definitions", schema.layouts.len());
    for layout in &schema.layouts {
      match &layout.extends {
        Some(parent) => println!("  - {} (extends {})", layout.name, parent),
        None => println!("  - {}", layout.name),
      }
    }
    println!();
  }

  Ok(schema)
}

/* Load, validate and resolve every layout for the requested pointer width */
pub fn load_and_resolve(
  file: Option<&Path>,
  ptr_width: u64,
  verbose: bool,
) -> anyhow::Result<(Target, Vec<ResolvedLayout>)> {
  let schema = load_schema(file, verbose)?;
  let target = Target::new(ptr_width)?;

  if verbose {
    println!("[~] Resolving layouts (pointer width {})...", target.ptr_width);
  }

  let layouts = match resolve_schema(&schema.layouts, target) {
    Ok(layouts) => layouts,
    Err(err) => {
      println!("[✗] Schema resolution failed: {}", err);
      return Err(err).context("Layout schema is invalid");
    }
  };

  info!(layouts = layouts.len(), ptr_width = target.ptr_width, "schema resolved");
  if verbose {
    println!("[✓] Resolved {} layouts\n", layouts.len());
  }

  Ok((target, layouts))
}
