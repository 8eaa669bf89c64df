use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Default)]
struct SleepState {
    done: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

/// Future returned by [`RuntimeHandle::sleep`](crate::RuntimeHandle::sleep).
#[derive(Clone, Default)]
pub struct Sleep {
    state: Rc<SleepState>,
}

impl Sleep {
    pub(crate) fn pending() -> Self {
        Self::default()
    }

    pub(crate) fn complete(&self) {
        self.state.done.set(true);
        if let Some(waker) = self.state.waker.borrow_mut().take() {
            waker.wake();
        }
    }

    pub fn is_elapsed(&self) -> bool {
        self.state.done.get()
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.state.done.get() {
            return Poll::Ready(());
        }
        *self.state.waker.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}
