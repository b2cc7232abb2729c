/* JS emitter for the bootstrap runtime hosted in the managed language.
 *
 * Arithmetic, memory access and allocation go through `$ir_*` primitives.
 * The heap context is implicit in this runtime, so context parameters and
 * arguments are dropped. */

use crate::codegen::shared::ir::*;
use layout_types::PrimitiveType;
use std::fmt::Write;

pub struct JsCodeGeneratorOptions {
    /// Prefix applied to every generated definition and call.
    pub prefix: String,
    pub source_name: String,
}

impl Default for JsCodeGeneratorOptions {
    fn default() -> Self {
        Self {
            prefix: "$rt_".to_string(),
            source_name: "layout-gen".to_string(),
        }
    }
}

/* Suffix of the `$ir_load_*` / `$ir_store_*` primitives */
fn js_short_name(ty: PrimitiveType) -> &'static str {
    match ty {
        PrimitiveType::Uint8 => "u8",
        PrimitiveType::Uint16 => "u16",
        PrimitiveType::Uint32 => "u32",
        PrimitiveType::Uint64 => "u64",
        PrimitiveType::Int8 => "i8",
        PrimitiveType::Int16 => "i16",
        PrimitiveType::Int32 => "i32",
        PrimitiveType::Int64 => "i64",
        PrimitiveType::Float64 => "f64",
        PrimitiveType::Rawptr => "rawptr",
        PrimitiveType::Refptr => "refptr",
        PrimitiveType::Funptr => "funptr",
        PrimitiveType::Shapeptr => "shapeptr",
    }
}

fn js_binop(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "$ir_add_i32",
        BinOp::Mul => "$ir_mul_i32",
        BinOp::And => "$ir_and_i32",
        BinOp::Eq => "$ir_eq_i32",
    }
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

pub struct JsCodeGenerator {
    options: JsCodeGeneratorOptions,
}

impl JsCodeGenerator {
    pub fn new(options: JsCodeGeneratorOptions) -> Self {
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

        for decl in &ir.decls {
            output.push_str(&self.format_decl(decl));
            output.push_str("\n\n");
        }

        output
    }

    pub fn format_decl(&self, decl: &Decl) -> String {
        match decl {
            Decl::Const(c) => format!("var {}{} = {};", self.options.prefix, c.name, c.value),
            Decl::Function(fun) => self.format_function(fun),
        }
    }

    pub fn format_function(&self, fun: &Function) -> String {
        let params: Vec<&str> = fun
            .params
            .iter()
            .filter(|p| p.ty != ValueType::Context)
            .map(|p| p.name.as_str())
            .collect();
        let mut out = format!(
            "function {}{}({})\n{{\n",
            self.options.prefix,
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
            Stmt::Let { name, value, .. } => {
                writeln!(out, "{}var {} = {};", pad, name, self.format_expr(value)).unwrap();
            }
            Stmt::Store {
                ty,
                base,
                offset,
                value,
            } => {
                writeln!(
                    out,
                    "{}$ir_store_{}({}, {}, {});",
                    pad,
                    js_short_name(*ty),
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
                    "{pad}for (var {v} = 0; $ir_lt_i32({v}, {b}); {v} = $ir_add_i32({v}, 1))",
                    pad = pad,
                    v = var,
                    b = self.format_expr(bound)
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

    fn format_args(&self, args: &[Expr]) -> String {
        args.iter()
            .filter(|a| !matches!(a, Expr::Context))
            .map(|a| self.format_expr(a))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn format_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Var { name } => name.clone(),
            Expr::Const { value } => value.to_string(),
            Expr::LayoutId { name } => format!("{}{}", self.options.prefix, name),
            Expr::Undef {
                kind: UndefKind::Word,
            } => "$ir_get_word($undef)".to_string(),
            Expr::Undef {
                kind: UndefKind::Type,
            } => "$ir_get_type($undef)".to_string(),
            Expr::Bin { bin, lhs, rhs } => format!(
                "{}({}, {})",
                js_binop(*bin),
                self.format_expr(lhs),
                self.format_expr(rhs)
            ),
            Expr::Load { ty, base, offset } => format!(
                "$ir_load_{}({}, {})",
                js_short_name(*ty),
                self.format_expr(base),
                self.format_expr(offset)
            ),
            Expr::Call { callee, args } => {
                let name = match callee {
                    Callee::Generated(name) => name.as_str(),
                    Callee::GcForward => "gcForward",
                };
                format!("{}{}({})", self.options.prefix, name, self.format_args(args))
            }
            Expr::Alloc { size, category } => {
                format!("$ir_alloc_{}({})", category, self.format_expr(size))
            }
            /* Only reachable outside an argument list, which the builder never produces */
            Expr::Context => "undefined".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_intrinsics() {
        let generator = JsCodeGenerator::new(JsCodeGeneratorOptions::default());
        let ofs = Expr::add(
            Expr::cst(16),
            Expr::mul(Expr::cst(2), Expr::call("str_get_len", vec![Expr::var("o")])),
        );
        assert_eq!(
            generator.format_expr(&ofs),
            "$ir_add_i32(16, $ir_mul_i32(2, $rt_str_get_len(o)))"
        );
        let load = Expr::load(PrimitiveType::Refptr, Expr::var("o"), Expr::cst(0));
        assert_eq!(generator.format_expr(&load), "$ir_load_refptr(o, 0)");
    }

    #[test]
    fn drops_the_heap_context() {
        let generator = JsCodeGenerator::new(JsCodeGeneratorOptions::default());
        let fwd = Expr::gc_forward(vec![Expr::Context, Expr::var("w"), Expr::var("t")]);
        assert_eq!(generator.format_expr(&fwd), "$rt_gcForward(w, t)");

        let fun = Function {
            name: "str_alloc".into(),
            kind: FunctionKind::Alloc {
                layout: "str".into(),
            },
            ret: ValueType::Prim(PrimitiveType::Refptr),
            params: vec![
                Param::new("vm", ValueType::Context),
                Param::new("len", ValueType::Prim(PrimitiveType::Uint32)),
            ],
            body: vec![
                Stmt::Let {
                    name: "o".into(),
                    ty: PrimitiveType::Refptr,
                    value: Expr::Alloc {
                        size: Box::new(Expr::call("str_comp_size", vec![Expr::var("len")])),
                        category: "string".into(),
                    },
                },
                Stmt::ret(Expr::var("o")),
            ],
        };
        assert_eq!(
            generator.format_function(&fun),
            "function $rt_str_alloc(len)\n{\n    var o = $ir_alloc_string($rt_str_comp_size(len));\n    return o;\n}"
        );
    }

    #[test]
    fn loops_use_primitive_comparisons() {
        let generator = JsCodeGenerator::new(JsCodeGeneratorOptions::default());
        let mut out = String::new();
        generator.format_stmt(
            &Stmt::For {
                var: "i".into(),
                bound: Expr::var("cap"),
                body: vec![],
            },
            0,
            &mut out,
        );
        assert_eq!(
            out,
            "for (var i = 0; $ir_lt_i32(i, cap); i = $ir_add_i32(i, 1))\n{\n}\n"
        );
    }
}
