//! Privileged users.

/// Handles of users allowed to bypass responder limits and moderation.
#[derive(Debug, Clone, Default)]
pub struct SuperUsers {
    handles: Vec<String>,
}

impl SuperUsers {
    /// Handles may be given with or without the leading `@`.
    pub fn new(handles: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            handles: handles
                .into_iter()
                .map(|handle| handle.as_ref().trim().trim_start_matches('@').to_string())
                .filter(|handle| !handle.is_empty())
                .collect(),
        }
    }

    /// Whether `username` (with or without `@`) is a super user.
    pub fn is_super(&self, username: &str) -> bool {
        let username = username.trim_start_matches('@');
        !username.is_empty() && self.handles.iter().any(|handle| handle == username)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
