/* Shared helpers for the integration tests: schema resolution from inline
 * YAML and a small interpreter that runs the synthesized IR over a simulated
 * byte heap. */

#![allow(dead_code)]

use layout_gen::codegen::shared::builder::IrBuilder;
use layout_gen::codegen::shared::ir::*;
use layout_gen::schema::file::SchemaFile;
use layout_gen::schema::{ResolvedLayout, Target, resolve_schema};
use layout_types::PrimitiveType;
use std::collections::HashMap;

/// Bit pattern the interpreter uses for the runtime's undefined word.
pub const UNDEF_WORD: i64 = 0x0BAD_F00D;
/// Type tag of the undefined value.
pub const UNDEF_TYPE: i64 = 0;

/* Addresses below this are never handed out, so 0 stays a null reference */
const HEAP_BASE: usize = 16;
const ALLOC_ALIGN: usize = 8;

pub fn resolve_yaml(yaml: &str, ptr_width: u64) -> Vec<ResolvedLayout> {
    let schema = SchemaFile::from_yaml_str(yaml).expect("schema YAML should parse");
    let target = Target::new(ptr_width).expect("valid pointer width");
    resolve_schema(&schema.layouts, target).expect("schema should resolve")
}

pub fn build_yaml(yaml: &str, ptr_width: u64) -> (Vec<ResolvedLayout>, LayoutIr) {
    let layouts = resolve_yaml(yaml, ptr_width);
    let target = Target::new(ptr_width).expect("valid pointer width");
    let ir = IrBuilder::new(target).build_all(&layouts).expect("IR should build");
    (layouts, ir)
}

/// One recorded call into the collector's forwarding entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forwarded {
    pub word: i64,
    pub type_tag: Option<i64>,
}

/// An allocation as seen by the heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub addr: i64,
    pub size: usize,
    pub category: String,
}

enum Flow {
    Next,
    Return(Option<i64>),
}

pub struct Interpreter<'a> {
    functions: HashMap<&'a str, &'a Function>,
    consts: HashMap<&'a str, i64>,
    ptr_width: u64,
    pub heap: Vec<u8>,
    pub allocations: Vec<Allocation>,
    pub forwarded: Vec<Forwarded>,
}

fn size_of(ty: PrimitiveType, ptr_width: u64) -> usize {
    ty.fixed_size().unwrap_or(ptr_width) as usize
}

impl<'a> Interpreter<'a> {
    pub fn new(ir: &'a LayoutIr) -> Self {
        let mut functions = HashMap::new();
        let mut consts = HashMap::new();
        for decl in &ir.decls {
            match decl {
                Decl::Const(c) => {
                    consts.insert(c.name.as_str(), c.value);
                }
                Decl::Function(f) => {
                    functions.insert(f.name.as_str(), f);
                }
            }
        }
        Self {
            functions,
            consts,
            ptr_width: ir.ptr_width,
            heap: vec![0; HEAP_BASE],
            allocations: Vec::new(),
            forwarded: Vec::new(),
        }
    }

    /// Calls a generated function. The heap context is implicit: `args`
    /// covers only the non-context parameters.
    pub fn call(&mut self, name: &str, args: &[i64]) -> Option<i64> {
        let fun = *self
            .functions
            .get(name)
            .unwrap_or_else(|| panic!("no generated function named {}", name));
        let params: Vec<&Param> = fun.params.iter().filter(|p| p.ty != ValueType::Context).collect();
        assert_eq!(
            params.len(),
            args.len(),
            "{} takes {} argument(s)",
            name,
            params.len()
        );

        let mut env: HashMap<String, i64> = HashMap::new();
        for (param, value) in params.iter().zip(args) {
            let value = match param.ty {
                ValueType::Prim(ty) => self.truncate(ty, *value),
                _ => *value,
            };
            env.insert(param.name.clone(), value);
        }

        match self.exec_block(&fun.body, &mut env) {
            Flow::Return(value) => value,
            Flow::Next => None,
        }
    }

    /// Calls a value-returning generated function.
    pub fn eval(&mut self, name: &str, args: &[i64]) -> i64 {
        self.call(name, args)
            .unwrap_or_else(|| panic!("{} returned no value", name))
    }

    pub fn read(&self, ty: PrimitiveType, addr: i64) -> i64 {
        let size = size_of(ty, self.ptr_width);
        let start = addr as usize;
        let bytes = &self.heap[start..start + size];
        let mut raw: u64 = 0;
        for (i, b) in bytes.iter().enumerate() {
            raw |= (*b as u64) << (8 * i);
        }
        self.extend(ty, raw)
    }

    pub fn write(&mut self, ty: PrimitiveType, addr: i64, value: i64) {
        let size = size_of(ty, self.ptr_width);
        let start = addr as usize;
        assert!(
            start >= HEAP_BASE && start + size <= self.heap.len(),
            "store of {} bytes at {} is outside the heap",
            size,
            start
        );
        let raw = value as u64;
        for i in 0..size {
            self.heap[start + i] = (raw >> (8 * i)) as u8;
        }
    }

    fn truncate(&self, ty: PrimitiveType, value: i64) -> i64 {
        let bits = 8 * size_of(ty, self.ptr_width);
        if bits >= 64 {
            return value;
        }
        self.extend(ty, (value as u64) & ((1u64 << bits) - 1))
    }

    fn extend(&self, ty: PrimitiveType, raw: u64) -> i64 {
        let bits = 8 * size_of(ty, self.ptr_width);
        if bits >= 64 || !ty.is_signed() {
            return raw as i64;
        }
        let shift = 64 - bits;
        ((raw << shift) as i64) >> shift
    }

    fn alloc(&mut self, size: i64, category: &str) -> i64 {
        let size = usize::try_from(size).expect("allocation size must be positive");
        let addr = self.heap.len().div_ceil(ALLOC_ALIGN) * ALLOC_ALIGN;
        self.heap.resize(addr + size, 0);
        self.allocations.push(Allocation {
            addr: addr as i64,
            size,
            category: category.to_string(),
        });
        addr as i64
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: &mut HashMap<String, i64>) -> Flow {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec(stmt, env) {
                return Flow::Return(value);
            }
        }
        Flow::Next
    }

    fn exec(&mut self, stmt: &Stmt, env: &mut HashMap<String, i64>) -> Flow {
        match stmt {
            Stmt::Let { name, ty, value } => {
                let v = self.eval_expr(value, env);
                let v = self.truncate(*ty, v);
                env.insert(name.clone(), v);
            }
            Stmt::Store {
                ty,
                base,
                offset,
                value,
            } => {
                let addr = self.eval_expr(base, env) + self.eval_expr(offset, env);
                let v = self.eval_expr(value, env);
                self.write(*ty, addr, v);
            }
            Stmt::Expr { expr } => {
                self.eval_expr(expr, env);
            }
            Stmt::Return { value } => {
                let v = value.as_ref().map(|e| self.eval_expr(e, env));
                return Flow::Return(v);
            }
            Stmt::If { cond, then } => {
                if self.eval_expr(cond, env) != 0 {
                    return self.exec_block(then, env);
                }
            }
            Stmt::For { var, bound, body } => {
                let bound = self.eval_expr(bound, env);
                let mut i = 0;
                while i < bound {
                    env.insert(var.clone(), i);
                    if let Flow::Return(value) = self.exec_block(body, env) {
                        return Flow::Return(value);
                    }
                    i += 1;
                }
            }
            Stmt::Unreachable { message } => panic!("reached unreachable code: {}", message),
        }
        Flow::Next
    }

    fn eval_expr(&mut self, expr: &Expr, env: &HashMap<String, i64>) -> i64 {
        match expr {
            Expr::Var { name } => *env
                .get(name)
                .unwrap_or_else(|| panic!("unbound variable {}", name)),
            Expr::Const { value } => *value,
            Expr::LayoutId { name } => *self
                .consts
                .get(name.as_str())
                .unwrap_or_else(|| panic!("unknown constant {}", name)),
            Expr::Undef {
                kind: UndefKind::Word,
            } => UNDEF_WORD,
            Expr::Undef {
                kind: UndefKind::Type,
            } => UNDEF_TYPE,
            Expr::Bin { bin, lhs, rhs } => {
                let l = self.eval_expr(lhs, env);
                let r = self.eval_expr(rhs, env);
                match bin {
                    BinOp::Add => l.wrapping_add(r),
                    BinOp::Mul => l.wrapping_mul(r),
                    BinOp::And => l & r,
                    BinOp::Eq => (l == r) as i64,
                }
            }
            Expr::Load { ty, base, offset } => {
                let addr = self.eval_expr(base, env) + self.eval_expr(offset, env);
                self.read(*ty, addr)
            }
            Expr::Call { callee, args } => {
                let values: Vec<i64> = args
                    .iter()
                    .filter(|a| !matches!(a, Expr::Context))
                    .map(|a| self.eval_expr(a, env))
                    .collect();
                match callee {
                    Callee::Generated(name) => self.call(name, &values).unwrap_or(0),
                    Callee::GcForward => {
                        self.forwarded.push(Forwarded {
                            word: values[0],
                            type_tag: values.get(1).copied(),
                        });
                        values[0]
                    }
                }
            }
            Expr::Alloc { size, category } => {
                let size = self.eval_expr(size, env);
                self.alloc(size, category)
            }
            Expr::Context => 0,
        }
    }
}
