//! Target-agnostic statement/expression tree shared by every emitter.
//!
//! The builder synthesizes one [`Function`] per accessor; the D and JS
//! generators walk the same tree, so any layout arithmetic they render comes
//! from a single source. Nothing here knows about keywords, intrinsic names or
//! prefixes of either target.
//!
//! # Example
//! ```
//! use layout_gen::codegen::shared::ir::*;
//!
//! let ofs = Expr::add(Expr::add(Expr::cst(8), Expr::cst(4)), Expr::var("x"));
//! assert_eq!(ofs, Expr::add(Expr::cst(12), Expr::var("x")));
//! ```

use layout_types::PrimitiveType;
use serde_derive::{Deserialize, Serialize};

/// Schema version used for every serialized IR export.
pub const IR_SCHEMA_VERSION: u32 = 1;

/// Every declaration synthesized for one schema, in emission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutIr {
    pub version: u32,
    /// Platform pointer width the offsets were computed for.
    pub ptr_width: u64,
    pub decls: Vec<Decl>,
}

impl LayoutIr {
    pub fn new(ptr_width: u64, decls: Vec<Decl>) -> Self {
        Self {
            version: IR_SCHEMA_VERSION,
            ptr_width,
            decls,
        }
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Function(fun) => Some(fun),
            Decl::Const(_) => None,
        })
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions().find(|fun| fun.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "kebab-case")]
pub enum Decl {
    Const(ConstDecl),
    Function(Function),
}

/// Named integer constant (layout tag ids).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConstDecl {
    pub name: String,
    pub ty: PrimitiveType,
    pub value: i64,
}

/// Type of a parameter, local or return value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ValueType {
    Prim(PrimitiveType),
    /// Heap/VM context handed to allocation and collector entry points.
    Context,
    Void,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: ValueType,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// What a synthesized function computes; used by tooling to find functions
/// without parsing names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FunctionKind {
    Offset { layout: String, field: String },
    Get { layout: String, field: String },
    Set { layout: String, field: String },
    CompSize { layout: String },
    Sizeof { layout: String },
    Alloc { layout: String },
    VisitGc { layout: String },
    DispatchSizeof,
    DispatchVisitGc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Function {
    pub name: String,
    pub kind: FunctionKind,
    pub ret: ValueType,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BinOp {
    Add,
    Mul,
    And,
    Eq,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UndefKind {
    Word,
    Type,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "callee", content = "name", rename_all = "kebab-case")]
pub enum Callee {
    /// Another synthesized function, by unprefixed name.
    Generated(String),
    /// The collector's relocation entry point.
    GcForward,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Expr {
    Var {
        name: String,
    },
    Const {
        value: i64,
    },
    /// Reference to a tag-id constant by name.
    LayoutId {
        name: String,
    },
    /// The runtime's undefined value (word or type half).
    Undef {
        kind: UndefKind,
    },
    Bin {
        bin: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Load {
        ty: PrimitiveType,
        base: Box<Expr>,
        offset: Box<Expr>,
    },
    Call {
        callee: Callee,
        args: Vec<Expr>,
    },
    Alloc {
        size: Box<Expr>,
        category: String,
    },
    Context,
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var { name: name.into() }
    }

    pub fn cst(value: i64) -> Self {
        Expr::Const { value }
    }

    pub fn layout_id(name: impl Into<String>) -> Self {
        Expr::LayoutId { name: name.into() }
    }

    pub fn as_const(&self) -> Option<i64> {
        match self {
            Expr::Const { value } => Some(*value),
            _ => None,
        }
    }

    /// Addition with constant folding: `c1 + c2`, `0 + x`, `x + 0` and
    /// `(x + c1) + c2` collapse.
    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        match (lhs.as_const(), rhs.as_const()) {
            (Some(a), Some(b)) => return Expr::cst(a + b),
            (Some(0), None) => return rhs,
            (None, Some(0)) => return lhs,
            _ => {}
        }
        if let (
            Expr::Bin {
                bin: BinOp::Add,
                lhs: inner,
                rhs: inner_rhs,
            },
            Some(b),
        ) = (&lhs, rhs.as_const())
        {
            if let Some(a) = inner_rhs.as_const() {
                return Expr::add((**inner).clone(), Expr::cst(a + b));
            }
        }
        Expr::bin(BinOp::Add, lhs, rhs)
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        match (lhs.as_const(), rhs.as_const()) {
            (Some(a), Some(b)) => Expr::cst(a * b),
            _ => Expr::bin(BinOp::Mul, lhs, rhs),
        }
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        match (lhs.as_const(), rhs.as_const()) {
            (Some(a), Some(b)) => Expr::cst(a & b),
            _ => Expr::bin(BinOp::And, lhs, rhs),
        }
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Expr::bin(BinOp::Eq, lhs, rhs)
    }

    /// Rounds `expr` up to a multiple of `unit` (a power of two).
    pub fn align_up(expr: Expr, unit: u64) -> Self {
        let unit = unit as i64;
        Expr::and(Expr::add(expr, Expr::cst(unit - 1)), Expr::cst(-unit))
    }

    pub fn bin(bin: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Bin {
            bin,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Callee::Generated(name.into()),
            args,
        }
    }

    pub fn gc_forward(args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Callee::GcForward,
            args,
        }
    }

    pub fn load(ty: PrimitiveType, base: Expr, offset: Expr) -> Self {
        Expr::Load {
            ty,
            base: Box::new(base),
            offset: Box::new(offset),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "stmt", rename_all = "kebab-case")]
pub enum Stmt {
    Let {
        name: String,
        ty: PrimitiveType,
        value: Expr,
    },
    Store {
        ty: PrimitiveType,
        base: Expr,
        offset: Expr,
        value: Expr,
    },
    Expr {
        expr: Expr,
    },
    Return {
        value: Option<Expr>,
    },
    If {
        cond: Expr,
        then: Vec<Stmt>,
    },
    /// `for var in 0..bound`, with a `uint32` counter.
    For {
        var: String,
        bound: Expr,
        body: Vec<Stmt>,
    },
    /// Control must never reach here; rendered as a failing assertion.
    Unreachable {
        message: String,
    },
}

impl Stmt {
    pub fn ret(value: Expr) -> Self {
        Stmt::Return { value: Some(value) }
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr { expr }
    }
}
