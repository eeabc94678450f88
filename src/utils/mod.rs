//! Utility modules

pub mod error;
pub mod logger;
pub mod money;
pub mod pagination;
pub mod validation;

pub use error::{AppError, AppResult};
pub use pagination::{PageQuery, Paginated, Pagination};
