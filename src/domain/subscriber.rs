use chrono::{DateTime, Utc};

use crate::domain::subscriber_status::SubscriberStatus;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    /// Last confirmation event; the unix epoch means the subscriber never confirmed.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub confirmed_at: DateTime<Utc>,
    pub opt_out: bool,
}

impl Subscriber {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at > never_confirmed()
    }

    pub fn status(&self) -> SubscriberStatus {
        SubscriberStatus::of(self)
    }
}

/// The zero timestamp stored for subscribers that never confirmed.
pub fn never_confirmed() -> DateTime<Utc> {
    // chrono defaults to the unix epoch
    DateTime::<Utc>::default()
}
