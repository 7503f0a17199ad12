use crate::domain::subscriber::Subscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SubscriberStatus {
    Pending,
    Confirmed,
    Unsubscribed,
}

impl SubscriberStatus {
    /// Opting out wins over a past confirmation.
    pub fn of(subscriber: &Subscriber) -> SubscriberStatus {
        if subscriber.opt_out {
            SubscriberStatus::Unsubscribed
        } else if subscriber.is_confirmed() {
            SubscriberStatus::Confirmed
        } else {
            SubscriberStatus::Pending
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SubscriberStatus::Pending)
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, SubscriberStatus::Confirmed)
    }

    pub fn is_unsubscribed(&self) -> bool {
        matches!(self, SubscriberStatus::Unsubscribed)
    }
}

impl AsRef<str> for SubscriberStatus {
    fn as_ref(&self) -> &str {
        match self {
            SubscriberStatus::Pending => "pending_confirmation",
            SubscriberStatus::Confirmed => "confirmed",
            SubscriberStatus::Unsubscribed => "unsubscribed",
        }
    }
}
