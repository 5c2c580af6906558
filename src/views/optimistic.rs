/// A confirmed value with at most one unconfirmed local patch on top.
///
/// Readers see the patched value while a patch is pending. The patch is
/// either committed (the server agreed) or reverted (it did not).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Optimistic<T> {
    base: T,
    pending: Option<T>,
}

impl<T> Optimistic<T> {
    pub fn new(value: T) -> Self {
        Self {
            base: value,
            pending: None,
        }
    }

    /// The displayed value: the pending patch if any, else the confirmed one.
    pub fn current(&self) -> &T {
        self.pending.as_ref().unwrap_or(&self.base)
    }

    pub fn confirmed(&self) -> &T {
        &self.base
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Show `value` ahead of confirmation, replacing any earlier patch.
    pub fn apply(&mut self, value: T) {
        self.pending = Some(value);
    }

    /// Make `value` the confirmed value and drop the patch.
    pub fn commit(&mut self, value: T) {
        self.base = value;
        self.pending = None;
    }

    /// Drop the patch, returning to the last confirmed value.
    pub fn revert(&mut self) -> Option<T> {
        self.pending.take()
    }
}
