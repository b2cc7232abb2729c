pub mod builder;
pub mod dispatch;
pub mod ir;
pub mod naming;
