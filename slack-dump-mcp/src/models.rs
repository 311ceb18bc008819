pub mod slackdump;

use std::collections::HashMap;

use slackdump::Message;

const UNKNOWN_SENDER: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub is_bot: bool,
    pub deleted: bool,
    pub is_restricted: bool,
    pub email: Option<String>,
}

/// Users of the workspace keyed by ID. Rebuilt for every dump request.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<String, User>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries with the same ID replace earlier ones.
    pub fn insert(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn get(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Label for the author of `message`.
    ///
    /// Known senders resolve to their directory name. Otherwise the message's own
    /// `username` is used, then the raw sender ID, then `"unknown"`.
    pub fn sender(&self, message: &Message) -> String {
        let id = message.sender_id();

        if let Some(user) = id.and_then(|id| self.get(id)) {
            return user.name.clone();
        }

        message
            .username
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(id)
            .unwrap_or(UNKNOWN_SENDER)
            .to_string()
    }
}
