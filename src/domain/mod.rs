pub mod new_subscriber;
pub mod pagination;
pub mod subscriber;
pub mod subscriber_email;
pub mod subscriber_status;
pub mod subscriber_update;

pub use new_subscriber::{EmailBody, NewSubscriber};
pub use pagination::{ListSubscribersBody, Pagination};
pub use subscriber::Subscriber;
pub use subscriber_email::SubscriberEmail;
pub use subscriber_status::SubscriberStatus;
pub use subscriber_update::{SubscriberUpdate, UpdateSubscriberBody};
