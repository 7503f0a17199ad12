use serde::Deserialize;

use crate::domain::subscriber_email::SubscriberEmail;

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
}

/// Body shared by every operation addressed by email alone.
#[derive(Deserialize, Debug)]
pub struct EmailBody {
    pub email: String,
}

impl TryFrom<EmailBody> for NewSubscriber {
    type Error = String;

    fn try_from(body: EmailBody) -> Result<Self, Self::Error> {
        let email = SubscriberEmail::parse(body.email)?;

        Ok(NewSubscriber { email })
    }
}
