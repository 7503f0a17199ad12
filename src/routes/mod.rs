mod error;
mod health_check;
mod subscribers;

pub use error::json_error_handler;
pub use health_check::health_check;
pub use subscribers::{
    handle_create_subscriber, handle_delete_subscriber, handle_get_subscriber,
    handle_list_subscribers, handle_update_subscriber,
};
