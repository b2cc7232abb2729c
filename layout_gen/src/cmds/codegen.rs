/* Codegen command - generate the D and JS layout libraries */

use super::common::load_and_resolve;
use anyhow::Context;
use layout_gen::codegen::d::DCodeGeneratorOptions;
use layout_gen::codegen::js::JsCodeGeneratorOptions;
use layout_gen::codegen::{D_OUT_FILE, JS_OUT_FILE, generate, write_atomic};
use std::path::{Path, PathBuf};
use tracing::info;

/* Where each artifact is written */
pub struct OutputPaths {
  pub d_path: PathBuf,
  pub js_path: PathBuf,
}

impl OutputPaths {
  pub fn new(output_dir: &Path, d_out: Option<PathBuf>, js_out: Option<PathBuf>) -> Self {
    Self {
      d_path: d_out.unwrap_or_else(|| output_dir.join(D_OUT_FILE)),
      js_path: js_out.unwrap_or_else(|| output_dir.join(JS_OUT_FILE)),
    }
  }
}

/* Execute the codegen command */
pub fn run(file: Option<PathBuf>, outputs: OutputPaths, ptr_width: u64, verbose: bool) -> anyhow::Result<()> {
  if verbose {
    println!("Layout Generator - Code Generation Tool");
    println!("=======================================\n");
    println!("[~] Configuration:");
    match &file {
      Some(path) => println!("  Schema: {}", path.display()),
      None => println!("  Schema: <built-in runtime>"),
    }
    println!("  Pointer width: {}", ptr_width);
    println!("  D output: {}", outputs.d_path.display());
    println!("  JS output: {}", outputs.js_path.display());
    println!();
  }

  let (target, layouts) = load_and_resolve(file.as_deref(), ptr_width, verbose)?;

  /* Render both artifacts before touching the filesystem */
  let artifacts = generate(
    &layouts,
    target,
    DCodeGeneratorOptions::default(),
    JsCodeGeneratorOptions::default(),
  )
  .context("Failed to synthesize layout functions")?;

  if verbose {
    println!("[~] Synthesized {} functions", artifacts.ir.functions().count());
  }

  write_atomic(&outputs.d_path, &artifacts.d_source)?;
  println!("[✓] Generated {}", outputs.d_path.display());
  write_atomic(&outputs.js_path, &artifacts.js_source)?;
  println!("[✓] Generated {}", outputs.js_path.display());

  info!(
    d = %outputs.d_path.display(),
    js = %outputs.js_path.display(),
    "layout artifacts written"
  );

  Ok(())
}
