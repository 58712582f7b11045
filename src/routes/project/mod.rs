mod handler;
mod model;

pub use handler::{create_project, delete_project, get_project, list_projects, update_project};
pub use model::{Project, ProjectRequest};
