use tracing::subscriber::NoSubscriber;

/// Runs `f` with every `tracing` event on this thread discarded.
///
/// Collaborators are chatty; the previous subscriber is restored when `f`
/// returns, panics included.
pub fn quiet<T>(f: impl FnOnce() -> T) -> T {
    tracing::subscriber::with_default(NoSubscriber::default(), f)
}

/// Runs `f` quietly when `enabled`, otherwise as-is.
pub(super) fn quiet_if<T>(enabled: bool, f: impl FnOnce() -> T) -> T {
    if enabled { quiet(f) } else { f() }
}
