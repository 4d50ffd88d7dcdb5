use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const ACTIVE: &str = "active";

/// Features granted to every local user.
pub const FEATURES: &[&str] = &[
    "folders",
    "prompts",
    "prompt-library",
    "chains",
    "pinned",
    "announcements",
    "export",
    "sync",
    "premium",
];

/// The singleton user/subscription record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub subscription_status: String,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default = "far_future")]
    pub expiry_date: DateTime<Utc>,
}

impl UserData {
    /// The fully entitled record.
    pub fn entitled() -> Self {
        Self {
            is_premium: true,
            is_paid: true,
            subscription_status: ACTIVE.to_string(),
            features: FEATURES.iter().map(|f| f.to_string()).collect(),
            expiry_date: far_future(),
        }
    }

    /// Re-apply the entitlement over whatever was stored. Extra stored
    /// features are kept; nothing can be revoked.
    pub fn into_entitled(mut self) -> Self {
        self.is_premium = true;
        self.is_paid = true;
        self.subscription_status = ACTIVE.to_string();
        self.features.extend(FEATURES.iter().map(|f| f.to_string()));
        if self.expiry_date < Utc::now() {
            self.expiry_date = far_future();
        }
        self
    }

    pub fn is_entitled(&self) -> bool {
        self.is_premium && self.is_paid && self.subscription_status == ACTIVE
    }
}

impl Default for UserData {
    fn default() -> Self {
        Self::entitled()
    }
}

fn far_future() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2099, 12, 31, 23, 59, 59)
        .single()
        .unwrap_or_default()
}

/// Body of the payment-validation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub valid: bool,
    pub is_premium_user: bool,
    pub subscription_status: String,
    pub expiry_date: DateTime<Utc>,
    pub features: BTreeSet<String>,
}

impl From<&UserData> for Entitlement {
    fn from(user: &UserData) -> Self {
        Self {
            valid: user.is_entitled(),
            is_premium_user: user.is_premium,
            subscription_status: user.subscription_status.clone(),
            expiry_date: user.expiry_date,
            features: user.features.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tampered_record_is_re_entitled() {
        let tampered = UserData {
            is_premium: false,
            is_paid: false,
            subscription_status: "canceled".into(),
            features: BTreeSet::from(["custom".to_string()]),
            expiry_date: Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
        };
        let fixed = tampered.into_entitled();
        assert!(fixed.is_entitled());
        assert!(fixed.features.contains("custom"));
        assert!(fixed.features.contains("folders"));
        assert!(fixed.expiry_date > Utc::now());
    }

    #[test]
    fn entitlement_from_user() {
        let ent = Entitlement::from(&UserData::entitled());
        assert!(ent.valid);
        assert!(ent.is_premium_user);
        assert_eq!(ent.subscription_status, "active");
        let json = serde_json::to_value(&ent).unwrap();
        assert_eq!(json["isPremiumUser"], true);
        assert_eq!(json["subscriptionStatus"], "active");
    }
}
