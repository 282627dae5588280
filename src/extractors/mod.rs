pub mod body;
pub mod pagination;
pub mod path;

pub use body::JsonBody;
pub use pagination::Pagination;
pub use path::PathParam;
