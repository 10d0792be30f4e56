use std::collections::HashMap;

use crate::error::GatewayError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub premium: bool,
}

// Source of known users and their entitlements, a real identity store can
// replace the static table without touching admission logic
pub trait UserDirectory: Send + Sync {
    fn lookup(&self, username: &str) -> Option<UserRecord>;
}

// Fixed table built once at startup, never mutated afterwards
#[derive(Debug, Default)]
pub struct StaticDirectory {
    users: HashMap<String, bool>,
}

impl StaticDirectory {
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        Self {
            users: users.into_iter().map(|(name, p)| (name.into(), p)).collect(),
        }
    }

    // Parse comma-separated "name:tier" entries, e.g. "aditya:premium,guest:basic"
    pub fn parse(list: &str) -> Result<Self, GatewayError> {
        let mut users = HashMap::new();

        for entry in list.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
            let (name, tier) = entry.split_once(':').ok_or_else(|| {
                GatewayError::Configuration(format!("user entry '{entry}' has no tier"))
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(GatewayError::Configuration(format!(
                    "user entry '{entry}' has no name"
                )));
            }
            let premium = match tier.trim() {
                "premium" => true,
                "basic" => false,
                other => {
                    return Err(GatewayError::Configuration(format!(
                        "unknown tier '{other}' for user '{name}'"
                    )));
                }
            };
            if users.insert(name.to_string(), premium).is_some() {
                return Err(GatewayError::Configuration(format!(
                    "user '{name}' is listed more than once"
                )));
            }
        }

        Ok(Self { users })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectory for StaticDirectory {
    fn lookup(&self, username: &str) -> Option<UserRecord> {
        self.users.get(username).map(|&premium| UserRecord {
            username: username.to_string(),
            premium,
        })
    }
}
