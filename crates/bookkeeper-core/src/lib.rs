pub mod category;
pub mod error;
pub mod expense;
pub mod filter;
pub mod id;
pub mod model;
pub mod schema;
pub mod tree;
pub mod types;

// Re-export commonly used types
pub use category::Category;
pub use error::CoreError;
pub use expense::Expense;
pub use filter::Filter;
pub use id::Pk;
pub use model::Model;
pub use schema::{Schema, PK_FIELD};
pub use tree::{FlatRow, Tree, TreeNode, TreeRecord, ROOT_ID};
pub use types::{FieldType, Value};
