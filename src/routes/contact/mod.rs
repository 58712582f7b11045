mod handler;
mod model;

pub use handler::{delete_contact, list_contacts, mark_contact_read, submit_contact};
pub use model::Contact;
