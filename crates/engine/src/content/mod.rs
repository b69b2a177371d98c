mod compiler;
mod database;
mod discovery;

pub use compiler::{
    compile_builtin_taxonomy, compile_taxonomy, ContentCompileError, ContentErrorCode,
    SourceLocation,
};
pub use database::{Taxonomy, TypeDef, TypeDefId};
