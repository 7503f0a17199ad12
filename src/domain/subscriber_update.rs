use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::domain::subscriber_email::SubscriberEmail;

/// Full replacement of a subscriber's mutable fields, keyed on email.
///
/// Both fields are always written together: there is no partial update.
#[derive(Debug, Clone)]
pub struct SubscriberUpdate {
    pub email: SubscriberEmail,
    pub confirmed_at: DateTime<Utc>,
    pub opt_out: bool,
}

#[derive(Deserialize, Debug)]
pub struct UpdateSubscriberBody {
    pub email: String,
    /// Seconds since the unix epoch, 0 for never confirmed.
    pub confirmed_at: i64,
    pub opt_out: bool,
}

impl TryFrom<UpdateSubscriberBody> for SubscriberUpdate {
    type Error = String;

    fn try_from(body: UpdateSubscriberBody) -> Result<Self, Self::Error> {
        let email = SubscriberEmail::parse(body.email)?;
        let confirmed_at = Utc
            .timestamp_opt(body.confirmed_at, 0)
            .single()
            .ok_or_else(|| format!("{} is not a valid confirmation timestamp", body.confirmed_at))?;

        Ok(SubscriberUpdate {
            email,
            confirmed_at,
            opt_out: body.opt_out,
        })
    }
}
