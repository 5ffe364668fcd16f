use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};

use super::{
    dto::RegisterRequest,
    jwt::JwtKeys,
    otp::{PendingCode, OTP_TTL},
    password,
    repo_types::{NewUser, User, UserUpdate, Verification},
};
use crate::{error::AppError, state::AppState};

pub const MIN_USERNAME_LEN: usize = 3;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn send_code(st: &AppState, to: &str, subject: &str, body: String) -> Result<(), AppError> {
    st.notifier
        .send(to, subject, &body)
        .await
        .map_err(AppError::UpstreamUnavailable)
}

/// Creates an unverified account and mails its verification code.
pub async fn register(st: &AppState, req: RegisterRequest) -> Result<User, AppError> {
    let username = req.username.trim().to_string();
    let email = normalize_email(&req.email);

    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    password::validate(&req.password)?;

    let now = OffsetDateTime::now_utc();
    let otp = PendingCode::issue(now);
    let new_user = NewUser {
        username,
        email,
        password_hash: password::hash(req.password).await?,
        role: req.role,
        otp: otp.clone(),
        created_at: now,
    };

    let Some(user) = st.users.create_if_absent(new_user).await? else {
        warn!(username = %req.username.trim(), "registration conflict");
        return Err(AppError::Conflict);
    };
    info!(user_id = %user.id, username = %user.username, "user registered");

    send_code(
        st,
        &user.email,
        "Your Verification Code",
        format!(
            "Your Stream Watch verification code is: {}\n\nThis code will expire in {} minutes.",
            otp.code,
            OTP_TTL.whole_minutes()
        ),
    )
    .await?;
    Ok(user)
}

/// Checks are ordered: existence, state, code, expiry.
pub async fn verify_otp(st: &AppState, email: &str, otp: &str) -> Result<(), AppError> {
    let email = normalize_email(email);
    let user = st
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let pending = match &user.verification {
        Verification::Verified => return Err(AppError::AlreadyVerified),
        Verification::Pending(p) => p,
    };
    if let Err(e) = pending.check(otp, OffsetDateTime::now_utc()) {
        warn!(user_id = %user.id, error = %e, "verification rejected");
        return Err(e);
    }

    let update = UserUpdate::MarkVerified {
        code: otp.to_string(),
    };
    if !st.users.apply(user.id, update).await? {
        // Lost a race with another verification of the same account.
        return match st.users.find_by_id(user.id).await? {
            None => Err(AppError::NotFound("User")),
            Some(u) if u.is_verified() => Err(AppError::AlreadyVerified),
            Some(_) => Err(AppError::InvalidCode),
        };
    }
    info!(user_id = %user.id, "email verified");
    Ok(())
}

/// Unknown username and wrong password are indistinguishable to the caller.
pub async fn login(st: &AppState, username: &str, password: &str) -> Result<(String, User), AppError> {
    let Some(mut user) = st.users.find_by_username(username.trim()).await? else {
        warn!(username = %username.trim(), "login for unknown username");
        return Err(AppError::InvalidCredentials);
    };

    if !password::verify(password.to_string(), user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(AppError::InvalidCredentials);
    }
    if !user.is_verified() {
        return Err(AppError::NotVerified);
    }

    let now = OffsetDateTime::now_utc();
    if !st.users.apply(user.id, UserUpdate::RecordLogin(now)).await? {
        warn!(user_id = %user.id, "user removed during login");
        return Err(AppError::InvalidCredentials);
    }
    user.last_login = Some(now);

    let token = JwtKeys::new(&st.config.jwt).issue(&user)?;
    info!(user_id = %user.id, "user logged in");
    Ok((token, user))
}

/// Silently does nothing for unknown emails.
pub async fn forgot_password(st: &AppState, email: &str) -> Result<(), AppError> {
    let email = normalize_email(email);
    let Some(user) = st.users.find_by_email(&email).await? else {
        info!("password reset requested for unknown email");
        return Ok(());
    };

    let pending = PendingCode::issue(OffsetDateTime::now_utc());
    st.users
        .apply(user.id, UserUpdate::StartReset(pending.clone()))
        .await?;
    info!(user_id = %user.id, "password reset started");

    send_code(
        st,
        &user.email,
        "Your Password Reset Code",
        format!(
            "Your Stream Watch password reset code is: {}\n\nThis code will expire in {} minutes.",
            pending.code,
            OTP_TTL.whole_minutes()
        ),
    )
    .await
}

pub async fn reset_password(
    st: &AppState,
    email: &str,
    otp: &str,
    new_password: String,
) -> Result<(), AppError> {
    let email = normalize_email(email);
    let user = st
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let pending = user.reset.as_ref().ok_or(AppError::InvalidCode)?;
    if let Err(e) = pending.check(otp, OffsetDateTime::now_utc()) {
        warn!(user_id = %user.id, error = %e, "password reset rejected");
        return Err(e);
    }
    password::validate(&new_password)?;

    let update = UserUpdate::CompleteReset {
        password_hash: password::hash(new_password).await?,
        code: otp.to_string(),
    };
    if !st.users.apply(user.id, update).await? {
        warn!(user_id = %user.id, "reset code consumed or replaced concurrently");
        return match st.users.find_by_id(user.id).await? {
            None => Err(AppError::NotFound("User")),
            Some(_) => Err(AppError::InvalidCode),
        };
    }
    info!(user_id = %user.id, "password reset completed");
    Ok(())
}
