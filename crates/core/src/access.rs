//! Privileged-caller policies.
//!
//! Every queue operation and the completion gateway are restricted to
//! privileged callers. What "privileged" means is decided by an
//! [`AccessPolicy`] injected at startup, so handlers never hardcode an
//! identity and the predicate can be tested on its own.

use std::collections::HashSet;

use crate::roles::ROLE_ADMIN;
use crate::types::DbId;

/// The authenticated identity making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: DbId,
    pub username: String,
    pub role: String,
}

/// Decides whether a caller may operate the simulation queue.
pub trait AccessPolicy: Send + Sync {
    fn is_privileged(&self, caller: &Caller) -> bool;
}

/// Grants privilege to callers holding the `admin` role.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdminRolePolicy;

impl AccessPolicy for AdminRolePolicy {
    fn is_privileged(&self, caller: &Caller) -> bool {
        caller.role == ROLE_ADMIN
    }
}

/// Grants privilege to an explicit set of usernames, regardless of role.
///
/// Usernames are compared case-insensitively after trimming.
#[derive(Debug, Clone)]
pub struct UsernameAllowList {
    usernames: HashSet<String>,
}

impl UsernameAllowList {
    pub fn new<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let usernames = usernames
            .into_iter()
            .map(|u| u.as_ref().trim().to_lowercase())
            .filter(|u| !u.is_empty())
            .collect();
        Self { usernames }
    }

    pub fn is_empty(&self) -> bool {
        self.usernames.is_empty()
    }
}

impl AccessPolicy for UsernameAllowList {
    fn is_privileged(&self, caller: &Caller) -> bool {
        self.usernames
            .contains(&caller.username.trim().to_lowercase())
    }
}
