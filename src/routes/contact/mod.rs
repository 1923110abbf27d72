mod handler;
mod model;

pub use handler::submit_contact;
pub use model::{ContactRequest, ContactResponse};
