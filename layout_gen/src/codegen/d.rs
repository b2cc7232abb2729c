/* D emitter for the natively compiled runtime */

use crate::codegen::shared::ir::*;
use layout_types::PrimitiveType;
use std::fmt::Write;

pub struct DCodeGeneratorOptions {
    pub module_name: String,
    pub imports: Vec<String>,
    /// Shown in the "auto-generated" banner.
    pub source_name: String,
}

impl Default for DCodeGeneratorOptions {
    fn default() -> Self {
        Self {
            module_name: "runtime.layout".to_string(),
            imports: vec!["runtime.vm".to_string(), "runtime.gc".to_string()],
            source_name: "layout-gen".to_string(),
        }
    }
}

/* Builtin D type behind each schema primitive alias */
fn d_native_type(ty: PrimitiveType) -> &'static str {
    match ty {
        PrimitiveType::Uint8 => "ubyte",
        PrimitiveType::Uint16 => "ushort",
        PrimitiveType::Uint32 => "uint",
        PrimitiveType::Uint64 => "ulong",
        PrimitiveType::Int8 => "byte",
        PrimitiveType::Int16 => "short",
        PrimitiveType::Int32 => "int",
        PrimitiveType::Int64 => "long",
        PrimitiveType::Float64 => "double",
        PrimitiveType::Rawptr
        | PrimitiveType::Refptr
        | PrimitiveType::Funptr
        | PrimitiveType::Shapeptr => "ubyte*",
    }
}

fn d_value_type(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Prim(prim) => prim.name(),
        ValueType::Context => "VM",
        ValueType::Void => "void",
    }
}

fn d_binop(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Mul => "*",
        BinOp::And => "&",
        BinOp::Eq => "==",
    }
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

pub struct DCodeGenerator {
    options: DCodeGeneratorOptions,
}

impl DCodeGenerator {
    pub fn new(options: DCodeGeneratorOptions) -> Self {
        Self { options }
    }

    pub fn emit_code(&self, ir: &LayoutIr) -> String {
        let mut output = String::new();
        writeln!(output, "//").unwrap();
        writeln!(
            output,
            "// Code auto-generated from \"{}\". Do not modify.",
            self.options.source_name
        )
        .unwrap();
        writeln!(output, "//\n").unwrap();

        writeln!(output, "module {};\n", self.options.module_name).unwrap();
        for import in &self.options.imports {
            writeln!(output, "import {};", import).unwrap();
        }
        if !self.options.imports.is_empty() {
            output.push('\n');
        }

        /* Pointer kinds first, then the fixed-width scalars */
        let mut aliases: Vec<PrimitiveType> = PrimitiveType::ALL
            .iter()
            .copied()
            .filter(|ty| ty.is_pointer())
            .collect();
        aliases.extend(PrimitiveType::ALL.iter().copied().filter(|ty| !ty.is_pointer()));
        for ty in aliases {
            writeln!(output, "alias {:<6} {};", d_native_type(ty), ty.name()).unwrap();
        }
        output.push('\n');

        for decl in &ir.decls {
            output.push_str(&self.format_decl(decl));
            output.push_str("\n\n");
        }

        output
    }

    pub fn format_decl(&self, decl: &Decl) -> String {
        match decl {
            Decl::Const(c) => format!("const {} {} = {};", c.ty.name(), c.name, c.value),
            Decl::Function(fun) => self.format_function(fun),
        }
    }

    pub fn format_function(&self, fun: &Function) -> String {
        let params: Vec<String> = fun
            .params
            .iter()
            .map(|p| format!("{} {}", d_value_type(p.ty), p.name))
            .collect();
        let mut out = format!(
            "extern (C) {} {}({})\n{{\n",
            d_value_type(fun.ret),
            fun.name,
            params.join(", ")
        );
        self.format_block(&fun.body, 1, &mut out);
        out.push('}');
        out
    }

    fn format_block(&self, stmts: &[Stmt], depth: usize, out: &mut String) {
        for stmt in stmts {
            self.format_stmt(stmt, depth, out);
        }
    }

    fn format_stmt(&self, stmt: &Stmt, depth: usize, out: &mut String) {
        let pad = indent(depth);
        match stmt {
            Stmt::Let { name, ty, value } => {
                writeln!(out, "{}{} {} = {};", pad, ty.name(), name, self.format_expr(value)).unwrap();
            }
            Stmt::Store {
                ty,
                base,
                offset,
                value,
            } => {
                writeln!(
                    out,
                    "{}*cast({}*)({} + {}) = {};",
                    pad,
                    ty.name(),
                    self.format_expr(base),
                    self.format_expr(offset),
                    self.format_expr(value)
                )
                .unwrap();
            }
            Stmt::Expr { expr } => {
                writeln!(out, "{}{};", pad, self.format_expr(expr)).unwrap();
            }
            Stmt::Return { value: Some(value) } => {
                writeln!(out, "{}return {};", pad, self.format_expr(value)).unwrap();
            }
            Stmt::Return { value: None } => {
                writeln!(out, "{}return;", pad).unwrap();
            }
            Stmt::If { cond, then } => {
                writeln!(out, "{}if ({})", pad, self.format_expr(cond)).unwrap();
                writeln!(out, "{}{{", pad).unwrap();
                self.format_block(then, depth + 1, out);
                writeln!(out, "{}}}", pad).unwrap();
            }
            Stmt::For { var, bound, body } => {
                writeln!(
                    out,
                    "{}for (uint32 {} = 0; {} < {}; ++{})",
                    pad,
                    var,
                    var,
                    self.format_expr(bound),
                    var
                )
                .unwrap();
                writeln!(out, "{}{{", pad).unwrap();
                self.format_block(body, depth + 1, out);
                writeln!(out, "{}}}", pad).unwrap();
            }
            Stmt::Unreachable { message } => {
                writeln!(out, "{}assert (false, \"{}\");", pad, message).unwrap();
            }
        }
    }

    pub fn format_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Var { name } => name.clone(),
            Expr::Const { value } => value.to_string(),
            Expr::LayoutId { name } => name.clone(),
            Expr::Undef {
                kind: UndefKind::Word,
            } => "UNDEF.word.uint8Val".to_string(),
            Expr::Undef {
                kind: UndefKind::Type,
            } => "Type.CONST".to_string(),
            Expr::Bin { bin, lhs, rhs } => format!(
                "({} {} {})",
                self.format_expr(lhs),
                d_binop(*bin),
                self.format_expr(rhs)
            ),
            Expr::Load { ty, base, offset } => format!(
                "*cast({}*)({} + {})",
                ty.name(),
                self.format_expr(base),
                self.format_expr(offset)
            ),
            Expr::Call { callee, args } => {
                let name = match callee {
                    Callee::Generated(name) => name.as_str(),
                    Callee::GcForward => "gcForward",
                };
                let args: Vec<String> = args.iter().map(|a| self.format_expr(a)).collect();
                format!("{}({})", name, args.join(", "))
            }
            Expr::Alloc { size, .. } => format!("vm.heapAlloc({})", self.format_expr(size)),
            Expr::Context => "vm".to_string(),
        }
    }
}
