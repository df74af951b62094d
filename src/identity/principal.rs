use serde::Serialize;

/// The identity a request was authorized as.
///
/// Only the guard mints principals outside this crate's tests, so holding one
/// is proof that the session and its token checked out.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Principal {
    username: String,
}

impl Principal {
    pub(crate) fn new(username: impl Into<String>) -> Self { Self { username: username.into() } }

    pub fn username(&self) -> &str { &self.username }
}
