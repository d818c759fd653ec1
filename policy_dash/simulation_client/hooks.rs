/// Anchor of the results panel.
pub const RESULTS_ANCHOR: &str = "results-section";

/// View-side effects the client may request. Calls are best-effort.
pub trait ViewHooks: Send + Sync {
    /// Brings the element identified by `anchor` into view.
    fn scroll_into_view(&self, anchor: &str);
}

/// Hooks for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopViewHooks;

impl ViewHooks for NoopViewHooks {
    fn scroll_into_view(&self, _anchor: &str) {}
}
