/* Names of synthesized functions, parameters and locals */

pub const OBJ_PARAM: &str = "o";
pub const INDEX_PARAM: &str = "i";
pub const VALUE_PARAM: &str = "v";
pub const TAG_LOCAL: &str = "t";
pub const CONTEXT_PARAM: &str = "vm";

pub const DISPATCH_SIZEOF: &str = "layout_sizeof";
pub const DISPATCH_VISIT_GC: &str = "layout_visit_gc";

pub fn ofs_fn(layout: &str, field: &str) -> String {
    format!("{}_ofs_{}", layout, field)
}

pub fn get_fn(layout: &str, field: &str) -> String {
    format!("{}_get_{}", layout, field)
}

pub fn set_fn(layout: &str, field: &str) -> String {
    format!("{}_set_{}", layout, field)
}

pub fn comp_size_fn(layout: &str) -> String {
    format!("{}_comp_size", layout)
}

pub fn sizeof_fn(layout: &str) -> String {
    format!("{}_sizeof", layout)
}

pub fn alloc_fn(layout: &str) -> String {
    format!("{}_alloc", layout)
}

pub fn visit_gc_fn(layout: &str) -> String {
    format!("{}_visit_gc", layout)
}
