pub mod codegen;
pub mod schema;
