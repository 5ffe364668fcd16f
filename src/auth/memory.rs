use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    repo::UserStore,
    repo_types::{NewUser, User, UserUpdate, Verification},
};

/// Mutex-guarded user table with the same uniqueness rules as the database.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Direct write access for arranging test fixtures.
    pub fn edit(&self, email: &str, f: impl FnOnce(&mut User)) {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .expect("fixture user exists");
        f(user);
    }

    pub fn by_email(&self, email: &str) -> Option<User> {
        self.find_where(|u| u.email == email)
    }

    fn find_where(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| pred(u)).cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_if_absent(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.username == new.username || u.email == new.email)
        {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            verification: Verification::Pending(new.otp),
            reset: None,
            created_at: new.created_at,
            last_login: None,
        };
        users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self.find_where(|u| u.username == username))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.find_where(|u| u.email == email))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.find_where(|u| u.id == id))
    }

    async fn apply(&self, id: Uuid, update: UserUpdate) -> anyhow::Result<bool> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        match update {
            UserUpdate::MarkVerified { code } => {
                if !matches!(&user.verification, Verification::Pending(p) if p.code == code) {
                    return Ok(false);
                }
                user.verification = Verification::Verified;
            }
            UserUpdate::RecordLogin(at) => user.last_login = Some(at),
            UserUpdate::StartReset(pending) => user.reset = Some(pending),
            UserUpdate::CompleteReset {
                password_hash,
                code,
            } => {
                if user.reset.as_ref().map(|p| &p.code) != Some(&code) {
                    return Ok(false);
                }
                user.password_hash = password_hash;
                user.reset = None;
            }
        }
        Ok(true)
    }
}
