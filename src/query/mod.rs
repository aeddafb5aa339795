pub mod builder;

pub use builder::{build_project_query, build_user_query, JqlBuilder};
