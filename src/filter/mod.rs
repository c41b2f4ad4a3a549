//! Filter language: a JSON document describing select/where/order/limit,
//! compiled to parameterized SQL. Scope conditions (tenant ownership and
//! soft-delete visibility) are conjoined by the data layer and always
//! precede anything the caller supplied.

pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use types::{FilterData, QueryScope, SqlResult};

/// True when `name` is safe to interpolate as a quoted SQL identifier.
pub(crate) fn valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_alphanumeric() || c == '_')
        && name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
}
