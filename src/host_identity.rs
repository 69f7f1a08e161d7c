use std::sync::OnceLock;

/// The process-wide host-identity token used by external formatters (the `u`
/// directive in the record template, compiled outside this crate).
///
/// Resolving *what* the token is (hostname lookup, a node's install GUID,
/// ...) is out of scope here -- see `spec.md` §1. What is in scope is
/// avoiding a mutable global for it: the value is threaded through
/// [`crate::LoggerBuilder::host_identity`] once, at construction, and stored
/// in a one-shot cell so later reads are a single pointer load.
#[derive(Debug, Default)]
pub(crate) struct HostIdentity(OnceLock<String>);

impl HostIdentity {
    pub(crate) fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Sets the token. Only the first call has any effect, mirroring a
    /// one-shot process global; later calls are silently ignored rather than
    /// panicking, since a reconfiguration race here is harmless.
    pub(crate) fn set(&self, value: String) {
        self.0.set(value).ok();
    }

    pub(crate) fn get(&self) -> Option<&str> {
        self.0.get().map(String::as_str)
    }
}
