use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewUser, User, UserRow, UserUpdate};

/// Credential store contract. Uniqueness of username and email is enforced
/// by `create_if_absent`; each `apply` is one atomic single-row write.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns `None` when the username or email is already taken.
    async fn create_if_absent(&self, user: NewUser) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Returns `false` when no user has this id or the code the update
    /// consumes is no longer stored.
    async fn apply(&self, id: Uuid, update: UserUpdate) -> anyhow::Result<bool>;
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, is_verified, otp, \
     otp_expires, reset_otp, reset_otp_expires, created_at, last_login";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("find user by {column}"))?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_if_absent(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, password_hash, role, is_verified,
                               otp, otp_expires, created_at)
            VALUES ($1, $2, $3, $4, FALSE, $5, $6, $7)
            ON CONFLICT DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(&user.otp.code)
            .bind(user.otp.expires_at)
            .bind(user.created_at)
            .fetch_optional(&self.db)
            .await
            .context("insert user")?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find user by id")?;
        row.map(User::try_from).transpose()
    }

    async fn apply(&self, id: Uuid, update: UserUpdate) -> anyhow::Result<bool> {
        let query = match &update {
            UserUpdate::MarkVerified { code } => sqlx::query(
                r#"
                UPDATE users
                   SET is_verified = TRUE, otp = NULL, otp_expires = NULL
                 WHERE id = $1 AND NOT is_verified AND otp = $2
                "#,
            )
            .bind(id)
            .bind(code),
            UserUpdate::RecordLogin(at) => {
                sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
                    .bind(id)
                    .bind(*at)
            }
            UserUpdate::StartReset(pending) => sqlx::query(
                r#"
                UPDATE users
                   SET reset_otp = $2, reset_otp_expires = $3
                 WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(&pending.code)
            .bind(pending.expires_at),
            UserUpdate::CompleteReset {
                password_hash,
                code,
            } => sqlx::query(
                r#"
                UPDATE users
                   SET password_hash = $2, reset_otp = NULL, reset_otp_expires = NULL
                 WHERE id = $1 AND reset_otp = $3
                "#,
            )
            .bind(id)
            .bind(password_hash)
            .bind(code),
        };
        let result = query
            .execute(&self.db)
            .await
            .with_context(|| format!("update user {id}"))?;
        Ok(result.rows_affected() == 1)
    }
}
