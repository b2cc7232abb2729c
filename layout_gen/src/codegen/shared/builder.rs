use super::dispatch::build_dispatch;
use super::ir::*;
use super::naming::*;
use crate::schema::{Alignment, FieldId, InitConst, ResolvedField, ResolvedLayout, Target};
use layout_types::PrimitiveType;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Offsets, sizes and loop counters are 32-bit in both runtimes.
const OFS_TYPE: PrimitiveType = PrimitiveType::Uint32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("layout '{layout}': field '{field}' is bound to missing field #{index}")]
    UnresolvedBinding {
        layout: String,
        field: String,
        index: usize,
    },
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

fn obj() -> Expr {
    Expr::var(OBJ_PARAM)
}

fn obj_param() -> Param {
    Param::new(OBJ_PARAM, ValueType::Prim(PrimitiveType::Refptr))
}

fn index_param() -> Param {
    Param::new(INDEX_PARAM, ValueType::Prim(OFS_TYPE))
}

fn init_expr(init: InitConst) -> Expr {
    match init {
        InitConst::Int(v) => Expr::cst(v),
        InitConst::Null => Expr::cst(0),
        InitConst::UndefWord => Expr::Undef {
            kind: UndefKind::Word,
        },
        InitConst::UndefType => Expr::Undef {
            kind: UndefKind::Type,
        },
    }
}

/// Synthesizes the accessor functions of every layout as IR.
pub struct IrBuilder {
    target: Target,
}

impl IrBuilder {
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    /// Builds per-layout declarations in tag order, then the dispatchers.
    pub fn build_all(&self, layouts: &[ResolvedLayout]) -> Result<LayoutIr, BuildError> {
        let mut decls = Vec::new();
        for layout in layouts {
            decls.extend(self.build_layout(layout)?);
        }
        for fun in build_dispatch(layouts, self.target)? {
            decls.push(Decl::Function(fun));
        }
        debug!(decls = decls.len(), "synthesized layout IR");
        Ok(LayoutIr::new(self.target.ptr_width, decls))
    }

    /// Tag constant, then offset, get, set, comp_size, sizeof, alloc and
    /// visit_gc functions for one layout.
    pub fn build_layout(&self, layout: &ResolvedLayout) -> Result<Vec<Decl>, BuildError> {
        let mut decls = vec![Decl::Const(ConstDecl {
            name: layout.id_const_name(),
            ty: PrimitiveType::Uint32,
            value: layout.id as i64,
        })];

        for idx in 0..layout.fields.len() {
            decls.push(Decl::Function(self.offset_fn(layout, idx)?));
        }
        for field in &layout.fields {
            decls.push(Decl::Function(self.getter_fn(layout, field)));
        }
        for field in &layout.fields {
            decls.push(Decl::Function(self.setter_fn(layout, field)));
        }
        decls.push(Decl::Function(self.comp_size_fn(layout)?));
        decls.push(Decl::Function(self.sizeof_fn(layout)?));
        decls.push(Decl::Function(self.alloc_fn(layout)?));
        decls.push(Decl::Function(self.visit_gc_fn(layout)?));

        Ok(decls)
    }

    fn binding<'a>(
        &self,
        layout: &'a ResolvedLayout,
        field: &ResolvedField,
        id: FieldId,
    ) -> Result<&'a ResolvedField, BuildError> {
        layout.field(id).ok_or_else(|| BuildError::UnresolvedBinding {
            layout: layout.name.clone(),
            field: field.name.clone(),
            index: id.0,
        })
    }

    fn aligned(&self, sum: Expr, field: &ResolvedField) -> Expr {
        match field.align {
            Alignment::Dynamic => Expr::align_up(sum, self.target.ptr_width),
            Alignment::Static { pad } => Expr::add(sum, Expr::cst(pad as i64)),
        }
    }

    /* Alignment-adjusted sum of the spans of `fields`. `count` yields the
     * element count expression for a variable-length field's size field. */
    fn prefix_sum(
        &self,
        layout: &ResolvedLayout,
        fields: &[ResolvedField],
        count: &dyn Fn(&ResolvedField) -> Expr,
    ) -> Result<Expr, BuildError> {
        let mut sum = Expr::cst(0);
        for field in fields {
            sum = self.aligned(sum, field);
            let span = match field.size_field {
                None => Expr::cst(field.elem_size as i64),
                Some(id) => {
                    let size_field = self.binding(layout, field, id)?;
                    Expr::mul(Expr::cst(field.elem_size as i64), count(size_field))
                }
            };
            sum = Expr::add(sum, span);
        }
        Ok(sum)
    }

    fn access_params(field: &ResolvedField) -> Vec<Param> {
        let mut params = vec![obj_param()];
        if field.is_variable() {
            params.push(index_param());
        }
        params
    }

    fn access_args(field: &ResolvedField, index: Expr) -> Vec<Expr> {
        let mut args = vec![obj()];
        if field.is_variable() {
            args.push(index);
        }
        args
    }

    fn offset_fn(&self, layout: &ResolvedLayout, field_idx: usize) -> Result<Function, BuildError> {
        let field = &layout.fields[field_idx];
        let read_count = |size_field: &ResolvedField| Expr::call(get_fn(&layout.name, &size_field.name), vec![obj()]);

        let mut sum = self.prefix_sum(layout, &layout.fields[..field_idx], &read_count)?;
        sum = self.aligned(sum, field);
        if field.is_variable() {
            sum = Expr::add(
                sum,
                Expr::mul(Expr::cst(field.elem_size as i64), Expr::var(INDEX_PARAM)),
            );
        }

        Ok(Function {
            name: ofs_fn(&layout.name, &field.name),
            kind: FunctionKind::Offset {
                layout: layout.name.clone(),
                field: field.name.clone(),
            },
            ret: ValueType::Prim(OFS_TYPE),
            params: Self::access_params(field),
            body: vec![Stmt::ret(sum)],
        })
    }

    fn getter_fn(&self, layout: &ResolvedLayout, field: &ResolvedField) -> Function {
        let ofs = Expr::call(
            ofs_fn(&layout.name, &field.name),
            Self::access_args(field, Expr::var(INDEX_PARAM)),
        );
        Function {
            name: get_fn(&layout.name, &field.name),
            kind: FunctionKind::Get {
                layout: layout.name.clone(),
                field: field.name.clone(),
            },
            ret: ValueType::Prim(field.ty),
            params: Self::access_params(field),
            body: vec![Stmt::ret(Expr::load(field.ty, obj(), ofs))],
        }
    }

    fn setter_fn(&self, layout: &ResolvedLayout, field: &ResolvedField) -> Function {
        let ofs = Expr::call(
            ofs_fn(&layout.name, &field.name),
            Self::access_args(field, Expr::var(INDEX_PARAM)),
        );
        let mut params = Self::access_params(field);
        params.push(Param::new(VALUE_PARAM, ValueType::Prim(field.ty)));
        Function {
            name: set_fn(&layout.name, &field.name),
            kind: FunctionKind::Set {
                layout: layout.name.clone(),
                field: field.name.clone(),
            },
            ret: ValueType::Void,
            params,
            body: vec![Stmt::Store {
                ty: field.ty,
                base: obj(),
                offset: ofs,
                value: Expr::var(VALUE_PARAM),
            }],
        }
    }

    fn size_params(&self, layout: &ResolvedLayout) -> Result<Vec<(String, PrimitiveType)>, BuildError> {
        layout
            .size_fields
            .iter()
            .map(|id| {
                layout
                    .field(*id)
                    .map(|f| (f.name.clone(), f.ty))
                    .ok_or_else(|| BuildError::UnresolvedBinding {
                        layout: layout.name.clone(),
                        field: comp_size_fn(&layout.name),
                        index: id.0,
                    })
            })
            .collect()
    }

    fn comp_size_fn(&self, layout: &ResolvedLayout) -> Result<Function, BuildError> {
        let params = self
            .size_params(layout)?
            .into_iter()
            .map(|(name, ty)| Param::new(name, ValueType::Prim(ty)))
            .collect();
        let count_param = |size_field: &ResolvedField| Expr::var(size_field.name.clone());
        let total = self.prefix_sum(layout, &layout.fields, &count_param)?;

        Ok(Function {
            name: comp_size_fn(&layout.name),
            kind: FunctionKind::CompSize {
                layout: layout.name.clone(),
            },
            ret: ValueType::Prim(OFS_TYPE),
            params,
            body: vec![Stmt::ret(total)],
        })
    }

    fn sizeof_fn(&self, layout: &ResolvedLayout) -> Result<Function, BuildError> {
        let args = self
            .size_params(layout)?
            .into_iter()
            .map(|(name, _)| Expr::call(get_fn(&layout.name, &name), vec![obj()]))
            .collect();

        Ok(Function {
            name: sizeof_fn(&layout.name),
            kind: FunctionKind::Sizeof {
                layout: layout.name.clone(),
            },
            ret: ValueType::Prim(OFS_TYPE),
            params: vec![obj_param()],
            body: vec![Stmt::ret(Expr::call(comp_size_fn(&layout.name), args))],
        })
    }

    /* Allocation writes the size fields, then every field whose declared
     * initial value is not zero. Fresh memory is zero-filled. */
    fn alloc_fn(&self, layout: &ResolvedLayout) -> Result<Function, BuildError> {
        let size_params = self.size_params(layout)?;
        let mut params = vec![Param::new(CONTEXT_PARAM, ValueType::Context)];
        params.extend(
            size_params
                .iter()
                .map(|(name, ty)| Param::new(name.clone(), ValueType::Prim(*ty))),
        );

        let size_args: Vec<Expr> = size_params.iter().map(|(name, _)| Expr::var(name.clone())).collect();
        let mut body = vec![Stmt::Let {
            name: OBJ_PARAM.to_string(),
            ty: PrimitiveType::Refptr,
            value: Expr::Alloc {
                size: Box::new(Expr::call(comp_size_fn(&layout.name), size_args)),
                category: layout.category.clone(),
            },
        }];

        for (name, _) in &size_params {
            body.push(Stmt::expr(Expr::call(
                set_fn(&layout.name, name),
                vec![obj(), Expr::var(name.clone())],
            )));
        }

        for field in &layout.fields {
            let init = match field.init {
                Some(init) if !init.is_zero() => init,
                _ => continue,
            };

            match field.size_field {
                Some(id) => {
                    let size_field = self.binding(layout, field, id)?;
                    let set = Expr::call(
                        set_fn(&layout.name, &field.name),
                        vec![obj(), Expr::var(INDEX_PARAM), init_expr(init)],
                    );
                    body.push(Stmt::For {
                        var: INDEX_PARAM.to_string(),
                        bound: Expr::var(size_field.name.clone()),
                        body: vec![Stmt::expr(set)],
                    });
                }
                None => {
                    body.push(Stmt::expr(Expr::call(
                        set_fn(&layout.name, &field.name),
                        vec![obj(), init_expr(init)],
                    )));
                }
            }
        }

        body.push(Stmt::ret(obj()));

        Ok(Function {
            name: alloc_fn(&layout.name),
            kind: FunctionKind::Alloc {
                layout: layout.name.clone(),
            },
            ret: ValueType::Prim(PrimitiveType::Refptr),
            params,
            body,
        })
    }

    /* Every heap reference and every word/type pair goes through the
     * collector's forwarding entry point and is written back. */
    fn visit_gc_fn(&self, layout: &ResolvedLayout) -> Result<Function, BuildError> {
        let mut body = Vec::new();
        let mut declared_counts: HashSet<String> = HashSet::new();

        for field in layout.fields.iter().filter(|f| f.is_traced()) {
            let index = Expr::var(INDEX_PARAM);
            let get = Expr::call(
                get_fn(&layout.name, &field.name),
                Self::access_args(field, index.clone()),
            );

            let mut fwd_args = vec![Expr::Context, get];
            if let Some(type_id) = field.type_field {
                let type_field = self.binding(layout, field, type_id)?;
                fwd_args.push(Expr::call(
                    get_fn(&layout.name, &type_field.name),
                    Self::access_args(type_field, index.clone()),
                ));
            }

            let set = Expr::call(set_fn(&layout.name, &field.name), {
                let mut args = Self::access_args(field, index);
                args.push(Expr::gc_forward(fwd_args));
                args
            });

            match field.size_field {
                Some(id) => {
                    let size_field = self.binding(layout, field, id)?;
                    if declared_counts.insert(size_field.name.clone()) {
                        body.push(Stmt::Let {
                            name: size_field.name.clone(),
                            ty: OFS_TYPE,
                            value: Expr::call(get_fn(&layout.name, &size_field.name), vec![obj()]),
                        });
                    }
                    body.push(Stmt::For {
                        var: INDEX_PARAM.to_string(),
                        bound: Expr::var(size_field.name.clone()),
                        body: vec![Stmt::expr(set)],
                    });
                }
                None => body.push(Stmt::expr(set)),
            }
        }

        Ok(Function {
            name: visit_gc_fn(&layout.name),
            kind: FunctionKind::VisitGc {
                layout: layout.name.clone(),
            },
            ret: ValueType::Void,
            params: vec![Param::new(CONTEXT_PARAM, ValueType::Context), obj_param()],
            body,
        })
    }
}
