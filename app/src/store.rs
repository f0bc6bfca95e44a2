//! In-memory user storage shared by the user controller

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Payload for creating a user
#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<Vec<User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a couple of users already present
    pub fn seeded() -> Self {
        let store = Self::new();
        store.insert(NewUser {
            name: "Ada".into(),
            email: "ada@example.com".into(),
        });
        store.insert(NewUser {
            name: "Grace".into(),
            email: "grace@example.com".into(),
        });
        store
    }

    pub fn all(&self) -> Vec<User> {
        self.users.read().map(|users| users.clone()).unwrap_or_default()
    }

    pub fn find(&self, id: u64) -> Option<User> {
        self.users
            .read()
            .ok()?
            .iter()
            .find(|user| user.id == id)
            .cloned()
    }

    pub fn insert(&self, new: NewUser) -> User {
        let mut users = match self.users.write() {
            Ok(users) => users,
            Err(poisoned) => poisoned.into_inner(),
        };
        let user = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            name: new.name,
            email: new.email,
        };
        users.push(user.clone());
        user
    }

    pub fn remove(&self, id: u64) -> Option<User> {
        let mut users = self.users.write().ok()?;
        let position = users.iter().position(|user| user.id == id)?;
        Some(users.remove(position))
    }
}
