use rand::Rng;
use time::{Duration, OffsetDateTime};

use crate::error::AppError;

pub const OTP_LEN: usize = 6;
pub const OTP_TTL: Duration = Duration::minutes(10);

/// Uppercase alphanumeric, easy to read back from an email.
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// A one-time code awaiting use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCode {
    pub code: String,
    pub expires_at: OffsetDateTime,
}

impl PendingCode {
    pub fn issue(now: OffsetDateTime) -> Self {
        Self {
            code: generate_code(),
            expires_at: now + OTP_TTL,
        }
    }

    /// Mismatch is reported before expiry.
    pub fn check(&self, supplied: &str, now: OffsetDateTime) -> Result<(), AppError> {
        if self.code != supplied {
            return Err(AppError::InvalidCode);
        }
        if now >= self.expires_at {
            return Err(AppError::CodeExpired);
        }
        Ok(())
    }
}
