/// Options threaded into every reconciliation engine at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Logs every per-slot disposition, not just commit summaries.
    pub verbose: bool,
}

impl ReconcileConfig {
    pub const fn new() -> Self {
        Self { verbose: false }
    }

    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
