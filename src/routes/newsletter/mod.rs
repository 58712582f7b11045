mod handler;
mod model;

pub use handler::{list_subscribers, subscribe, unsubscribe};
pub use model::Subscriber;
