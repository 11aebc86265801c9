// 🏠 Household, Members & Invitations
//
// The household is the tenancy unit: every recipe, plan entry and list is
// scoped to one. Invitation codes are handed out once in plaintext; only
// their SHA-256 digest is kept.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::str::FromStr;

use crate::error::PlannerError;

/// How long an invitation code stays valid
pub const INVITATION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Household {
    pub fn new(name: &str) -> Self {
        Household {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Member => "member",
        }
    }
}

impl FromStr for MemberRole {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(MemberRole::Owner),
            "member" => Ok(MemberRole::Member),
            other => Err(PlannerError::invalid("role", format!("unknown role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdMember {
    pub household_id: String,
    pub user_id: String,
    pub display_name: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: String,
    pub household_id: String,
    pub email: String,

    /// Hex SHA-256 of the invitation code
    #[serde(skip_serializing)]
    pub code_hash: String,

    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Build an invitation and the plaintext code to hand to the invitee
    pub fn issue(household_id: &str, email: &str, now: DateTime<Utc>) -> (Invitation, String) {
        let code = generate_code();
        let invitation = Invitation {
            id: uuid::Uuid::new_v4().to_string(),
            household_id: household_id.to_string(),
            email: email.trim().to_lowercase(),
            code_hash: hash_code(&code),
            created_at: now,
            expires_at: now + Duration::days(INVITATION_TTL_DAYS),
            accepted_at: None,
        };
        (invitation, code)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted_at.is_some()
    }
}

/// Eight uppercase hex characters, easy to read aloud
fn generate_code() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

/// Codes are compared case-insensitively, ignoring surrounding whitespace
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.trim().to_uppercase());
    format!("{:x}", hasher.finalize())
}
