pub mod d;
pub mod js;
pub mod shared;

use crate::codegen::d::{DCodeGenerator, DCodeGeneratorOptions};
use crate::codegen::js::{JsCodeGenerator, JsCodeGeneratorOptions};
use crate::codegen::shared::builder::{BuildError, IrBuilder};
use crate::codegen::shared::ir::LayoutIr;
use crate::schema::{ResolvedLayout, Target};
use anyhow::Context;
use std::io::Write;
use std::path::Path;

pub const D_OUT_FILE: &str = "layout.d";
pub const JS_OUT_FILE: &str = "layout.js";

/// Both rendered artifacts plus the IR they were rendered from.
pub struct Artifacts {
    pub ir: LayoutIr,
    pub d_source: String,
    pub js_source: String,
}

/// Synthesizes the IR once and renders it with both emitters.
pub fn generate(
    layouts: &[ResolvedLayout],
    target: Target,
    d_options: DCodeGeneratorOptions,
    js_options: JsCodeGeneratorOptions,
) -> Result<Artifacts, BuildError> {
    let ir = IrBuilder::new(target).build_all(layouts)?;
    let d_source = DCodeGenerator::new(d_options).emit_code(&ir);
    let js_source = JsCodeGenerator::new(js_options).emit_code(&ir);
    Ok(Artifacts {
        ir,
        d_source,
        js_source,
    })
}

/// Replaces `path` with `contents` via a temporary file in the same directory,
/// so readers never observe a partially written artifact.
pub fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
