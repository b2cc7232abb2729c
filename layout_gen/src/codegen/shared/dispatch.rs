/* Generic `layout_sizeof` / `layout_visit_gc` that switch on the instance tag */

use super::builder::BuildError;
use super::ir::*;
use super::naming::*;
use crate::schema::ids::TAG_TYPE;
use crate::schema::{ResolvedLayout, Target};
use layout_types::PrimitiveType;

/* The tag directly follows the pointer-sized forwarding field in every layout */
fn read_tag(target: Target) -> Stmt {
    Stmt::Let {
        name: TAG_LOCAL.to_string(),
        ty: TAG_TYPE,
        value: Expr::load(TAG_TYPE, Expr::var(OBJ_PARAM), Expr::cst(target.ptr_width as i64)),
    }
}

fn tag_is(layout: &ResolvedLayout) -> Expr {
    Expr::eq(Expr::var(TAG_LOCAL), Expr::layout_id(layout.id_const_name()))
}

fn obj_param() -> Param {
    Param::new(OBJ_PARAM, ValueType::Prim(PrimitiveType::Refptr))
}

pub fn build_dispatch(layouts: &[ResolvedLayout], target: Target) -> Result<Vec<Function>, BuildError> {
    let mut sizeof_body = vec![read_tag(target)];
    for layout in layouts {
        sizeof_body.push(Stmt::If {
            cond: tag_is(layout),
            then: vec![Stmt::ret(Expr::call(sizeof_fn(&layout.name), vec![Expr::var(OBJ_PARAM)]))],
        });
    }
    sizeof_body.push(Stmt::Unreachable {
        message: format!("invalid layout in {}", DISPATCH_SIZEOF),
    });

    let mut visit_body = vec![read_tag(target)];
    for layout in layouts {
        visit_body.push(Stmt::If {
            cond: tag_is(layout),
            then: vec![
                Stmt::expr(Expr::call(
                    visit_gc_fn(&layout.name),
                    vec![Expr::Context, Expr::var(OBJ_PARAM)],
                )),
                Stmt::Return { value: None },
            ],
        });
    }
    visit_body.push(Stmt::Unreachable {
        message: format!("invalid layout in {}", DISPATCH_VISIT_GC),
    });

    let functions = vec![
        Function {
            name: DISPATCH_SIZEOF.to_string(),
            kind: FunctionKind::DispatchSizeof,
            ret: ValueType::Prim(PrimitiveType::Uint32),
            params: vec![obj_param()],
            body: sizeof_body,
        },
        Function {
            name: DISPATCH_VISIT_GC.to_string(),
            kind: FunctionKind::DispatchVisitGc,
            ret: ValueType::Void,
            params: vec![Param::new(CONTEXT_PARAM, ValueType::Context), obj_param()],
            body: visit_body,
        },
    ];

    for fun in &functions {
        check_dispatch(fun, layouts)?;
    }
    Ok(functions)
}

/// Tag constants tested by a dispatch function, in branch order.
pub fn dispatch_arms(fun: &Function) -> Vec<&str> {
    fun.body
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::If {
                cond: Expr::Bin {
                    bin: BinOp::Eq,
                    rhs,
                    ..
                },
                ..
            } => match rhs.as_ref() {
                Expr::LayoutId { name } => Some(name.as_str()),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// A dispatcher must test every layout exactly once, in tag order, and end in
/// an unreachable marker.
pub fn check_dispatch(fun: &Function, layouts: &[ResolvedLayout]) -> Result<(), BuildError> {
    let expected: Vec<String> = layouts.iter().map(|l| l.id_const_name()).collect();
    let arms = dispatch_arms(fun);
    if arms != expected {
        return Err(BuildError::InternalInvariant(format!(
            "{} dispatches on [{}] but the schema declares [{}]",
            fun.name,
            arms.join(", "),
            expected.join(", ")
        )));
    }
    if !matches!(fun.body.last(), Some(Stmt::Unreachable { .. })) {
        return Err(BuildError::InternalInvariant(format!(
            "{} falls through without an unreachable marker",
            fun.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::resolve_schema;
    use layout_types::LayoutDef;

    fn resolved(names: &[&str]) -> Vec<ResolvedLayout> {
        let defs: Vec<LayoutDef> = names.iter().map(|n| LayoutDef::new(*n, "refptr", vec![])).collect();
        resolve_schema(&defs, Target::default()).unwrap()
    }

    #[test]
    fn one_arm_per_layout_in_tag_order() {
        let layouts = resolved(&["str", "obj", "arr"]);
        let funs = build_dispatch(&layouts, Target::default()).unwrap();
        for fun in &funs {
            assert_eq!(dispatch_arms(fun), vec!["LAYOUT_STR", "LAYOUT_OBJ", "LAYOUT_ARR"]);
        }
        assert_eq!(
            funs[0].body[0],
            Stmt::Let {
                name: "t".into(),
                ty: PrimitiveType::Uint32,
                value: Expr::load(PrimitiveType::Uint32, Expr::var("o"), Expr::cst(8)),
            }
        );
    }

    #[test]
    fn desynchronized_dispatch_is_rejected() {
        let layouts = resolved(&["a", "b"]);
        let mut funs = build_dispatch(&layouts, Target::default()).unwrap();
        funs[0].body.remove(2);
        assert!(matches!(
            check_dispatch(&funs[0], &layouts),
            Err(BuildError::InternalInvariant(_))
        ));
    }

    /* A layout with a reserved name would generate the dispatchers' own names */
    #[test]
    fn dispatcher_names_are_reserved_layout_functions() {
        for reserved in crate::schema::validate::RESERVED_LAYOUT_NAMES {
            let names = [sizeof_fn(reserved), visit_gc_fn(reserved)];
            assert!(names.contains(&DISPATCH_SIZEOF.to_string()));
            assert!(names.contains(&DISPATCH_VISIT_GC.to_string()));
        }
    }

    #[test]
    fn empty_schema_still_dispatches() {
        let funs = build_dispatch(&[], Target::default()).unwrap();
        assert_eq!(funs[0].body.len(), 2);
    }
}
