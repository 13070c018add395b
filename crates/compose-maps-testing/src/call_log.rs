use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared, ordered record of calls made by fakes and descriptors.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    /// Returns the recorded calls and clears the log.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    pub fn contains(&self, call: &str) -> bool {
        self.calls.borrow().iter().any(|recorded| recorded == call)
    }

    /// Index of the first call equal to `call`.
    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|recorded| recorded == call)
    }

    /// Calls that start with `prefix`, in order.
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|recorded| recorded.starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// Logs compare by identity.
impl PartialEq for CallLog {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.calls, &other.calls)
    }
}

impl fmt::Debug for CallLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.calls.borrow().iter()).finish()
    }
}
