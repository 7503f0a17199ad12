use validator::validate_email;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<SubscriberEmail, String> {
        let is_valid_email = validate_email(&email);

        if !is_valid_email {
            return Err(format!("{} is not a valid subscriber email", email));
        }

        Ok(Self(email))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
