/// Commands the `devcamper` binary can run against a seeded in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Advanced-results query; `params` is a raw query string (`page=2&limit=10`).
    Query { collection: String, params: String },
    /// One request through the HTTP dispatcher.
    Request { method: String, path: String, body: Option<String>, token: Option<String> },
    Keygen,
    HashPassword { password: String },
}
