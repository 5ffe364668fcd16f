use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::otp::PendingCode;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => anyhow::bail!("unknown role {other:?}"),
        }
    }
}

/// Email verification state. A pending account always carries its code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Pending(PendingCode),
    Verified,
}

/// User record as the lifecycle sees it.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub verification: Verification,
    pub reset: Option<PendingCode>,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
}

impl User {
    pub fn is_verified(&self) -> bool {
        matches!(self.verification, Verification::Verified)
    }
}

/// Fields supplied when creating an account; the store assigns `id`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub otp: PendingCode,
    pub created_at: OffsetDateTime,
}

/// Single-document writes the lifecycle is allowed to make.
///
/// Code-consuming variants carry the code that was checked; the write only
/// lands while that code is still the stored one.
#[derive(Debug, Clone)]
pub enum UserUpdate {
    /// Set verified and drop the registration code, if still pending with `code`.
    MarkVerified { code: String },
    RecordLogin(OffsetDateTime),
    /// Replace any outstanding reset code.
    StartReset(PendingCode),
    /// Store the new hash and drop the reset code, if it is still `code`.
    CompleteReset { password_hash: String, code: String },
}

/// Row shape of the `users` table.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_verified: bool,
    pub otp: Option<String>,
    pub otp_expires: Option<OffsetDateTime>,
    pub reset_otp: Option<String>,
    pub reset_otp_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let verification = match (r.is_verified, r.otp, r.otp_expires) {
            (true, _, _) => Verification::Verified,
            (false, Some(code), Some(expires_at)) => {
                Verification::Pending(PendingCode { code, expires_at })
            }
            (false, _, _) => anyhow::bail!("user {} is unverified without a pending code", r.id),
        };
        let reset = match (r.reset_otp, r.reset_otp_expires) {
            (Some(code), Some(expires_at)) => Some(PendingCode { code, expires_at }),
            _ => None,
        };
        Ok(User {
            id: r.id,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            role: r.role.parse()?,
            verification,
            reset,
            created_at: r.created_at,
            last_login: r.last_login,
        })
    }
}
