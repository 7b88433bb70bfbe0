//! The per-thread "current context" used while a design is being built.
use crate::{Context, RRC};
use cash_utils::{CashResult, Error};
use std::{cell::RefCell, marker::PhantomData, rc::Rc};

thread_local! {
    /// Entered contexts, innermost last. Kept per thread so that nothing
    /// here has to be `Sync`.
    static CTX_STACK: RefCell<Vec<RRC<Context>>> = const { RefCell::new(Vec::new()) };
}

/// Guard making a context current until it is dropped.
///
/// Scopes nest: dropping the guard restores whichever context was current
/// when it was entered, including when a panic unwinds through it.
#[must_use = "the context is only current while the scope is alive"]
pub struct ContextScope {
    depth: usize,
    // Pushed onto this thread's stack; must be popped on the same thread.
    _not_send: PhantomData<*const ()>,
}

impl ContextScope {
    pub fn enter(ctx: &RRC<Context>) -> Self {
        let depth = CTX_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(Rc::clone(ctx));
            stack.len()
        });
        log::trace!("entered context scope at depth {depth}");
        ContextScope {
            depth,
            _not_send: PhantomData,
        }
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        CTX_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.len() != self.depth {
                log::warn!(
                    "context scopes closed out of order (depth {} while closing {})",
                    stack.len(),
                    self.depth
                );
            }
            stack.truncate(self.depth.saturating_sub(1));
        });
    }
}

/// The innermost entered context on this thread.
pub fn ctx_curr() -> Option<RRC<Context>> {
    CTX_STACK.with(|stack| stack.borrow().last().cloned())
}

/// Run `f` against the current context.
pub fn with_ctx_curr<T, F>(f: F) -> CashResult<T>
where
    F: FnOnce(&mut Context) -> CashResult<T>,
{
    let ctx = ctx_curr().ok_or(Error::NoActiveContext)?;
    let mut ctx = ctx
        .try_borrow_mut()
        .map_err(|_| Error::misc("current context is already borrowed"))?;
    f(&mut ctx)
}

/// Like [with_ctx_curr], but logs the failure and returns `None`.
pub fn try_with_ctx_curr<T, F>(f: F) -> Option<T>
where
    F: FnOnce(&mut Context) -> CashResult<T>,
{
    with_ctx_curr(f).map_err(|err| log::error!("{err}")).ok()
}
