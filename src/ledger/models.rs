use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Durable per-user record, keyed by the provider-issued identity id.
///
/// Profile fields are a snapshot of the latest successful login claim;
/// `first_login` and the identity id itself never change after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_id: Option<String>,
    pub first_login: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub total_logins: u64,
}

/// Identity claim as supplied by the OAuth provider or a direct login body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// How a bound hardware fingerprint is enforced on repeat logins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HwidPolicy {
    /// Reject the login when the incoming fingerprint differs from the bound one.
    Strict,
    /// Overwrite the bound fingerprint with the incoming value, last writer wins.
    Lenient,
}

impl HwidPolicy {
    /// Parse a policy name as accepted on the command line.
    ///
    /// # Errors
    /// Returns a message suitable for CLI validation on unknown names.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("invalid hardware binding policy: {other}")),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn hwid_policy_parses_known_names() {
        assert_eq!(HwidPolicy::parse("strict"), Ok(HwidPolicy::Strict));
        assert_eq!(HwidPolicy::parse("LENIENT"), Ok(HwidPolicy::Lenient));
        assert!(HwidPolicy::parse("both").is_err());
    }

    #[test]
    fn user_record_omits_empty_optionals() -> Result<()> {
        let now = Utc::now();
        let record = UserRecord {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            email_verified: true,
            avatar: None,
            hardware_id: None,
            first_login: now,
            last_login: now,
            total_logins: 1,
        };

        let value = serde_json::to_value(&record)?;
        assert!(value.get("hardware_id").is_none());
        assert!(value.get("avatar").is_none());
        assert_eq!(value["total_logins"], 1);
        Ok(())
    }

    #[test]
    fn provider_profile_defaults_optional_claims() -> Result<()> {
        let profile: ProviderProfile =
            serde_json::from_value(serde_json::json!({"id": "u1", "username": "alice"}))?;
        assert_eq!(profile.email, "");
        assert!(!profile.verified);
        assert!(profile.avatar.is_none());
        Ok(())
    }
}
