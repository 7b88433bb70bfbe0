use cash_utils::GetName;
#[cfg(debug_assertions)]
use cash_utils::Id;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Alias for a RefCell contained in an Rc reference.
#[allow(clippy::upper_case_acronyms)]
pub type RRC<T> = Rc<RefCell<T>>;

/// Construct a new RRC.
pub fn rrc<T>(t: T) -> RRC<T> {
    Rc::new(RefCell::new(t))
}

/// A wrapper for a weak RefCell pointer.
/// Used by the parent link of a child context.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug)]
pub struct WRC<T>
where
    T: GetName,
{
    internal: Weak<RefCell<T>>,
    #[cfg(debug_assertions)]
    debug_name: Id,
}

impl<T: GetName> WRC<T> {
    /// Upgrade to a strong reference. Returns `None` once the target has been
    /// dropped.
    pub fn upgrade(&self) -> Option<RRC<T>> {
        let r = self.internal.upgrade();
        #[cfg(debug_assertions)]
        if r.is_none() {
            log::debug!("weak reference to `{}' outlived its target", self.debug_name);
        }
        r
    }
}

/// From implementation with the same signature as `Rc::downgrade`.
impl<T: GetName> From<&RRC<T>> for WRC<T> {
    fn from(internal: &RRC<T>) -> Self {
        Self {
            internal: Rc::downgrade(internal),
            #[cfg(debug_assertions)]
            debug_name: internal.borrow().name(),
        }
    }
}

/// Clone the Weak reference inside the WRC.
impl<T: GetName> Clone for WRC<T> {
    fn clone(&self) -> Self {
        Self {
            internal: Weak::clone(&self.internal),
            #[cfg(debug_assertions)]
            debug_name: self.debug_name,
        }
    }
}
