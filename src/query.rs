//! SQL parsing, validation and translation into native queries.

pub mod ast;
pub mod builder;
pub mod native;
pub mod parser;
pub mod translate;
pub mod validator;

pub use ast::{CompareOp, Expr, Literal, OrderByItem, Projection, SelectItem, SelectStatement};
pub use builder::QueryBuilder;
pub use native::NativeQuerySpec;
pub use parser::{ParsedQuery, QueryParser, preprocess_query};
pub use validator::QueryValidator;
