use std::{
    ops::Deref,
    os::unix::io::{
        AsFd,
        AsRawFd,
        BorrowedFd,
        RawFd,
    },
    sync::atomic::{
        AtomicBool,
        Ordering,
    },
};

use inotify_sys as ffi;


/// A RAII guard around a `RawFd` that closes it automatically on drop.
#[derive(Debug)]
pub struct FdGuard {
    pub(crate) fd           : RawFd,
    pub(crate) close_on_drop: AtomicBool,
}

impl FdGuard {
    /// Takes ownership of a freshly opened descriptor.
    pub(crate) fn new(fd: RawFd) -> Self {
        FdGuard {
            fd,
            close_on_drop: AtomicBool::new(true),
        }
    }

    /// Closes the descriptor now instead of on drop
    ///
    /// Returns the raw `close(2)` result. After this call the guard never
    /// touches the descriptor again, even if closing failed.
    pub(crate) fn close_now(&self) -> libc::c_int {
        if self.close_on_drop.swap(false, Ordering::AcqRel) {
            unsafe { ffi::close(self.fd) }
        }
        else {
            0
        }
    }
}

impl Deref for FdGuard {
    type Target = RawFd;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.fd
    }
}

impl Drop for FdGuard {
    fn drop(&mut self) {
        if self.close_on_drop.load(Ordering::Acquire) {
            unsafe { ffi::close(self.fd); }
        }
    }
}

impl AsRawFd for FdGuard {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl AsFd for FdGuard {
    #[inline]
    fn as_fd(&self) -> BorrowedFd<'_> {
        unsafe { BorrowedFd::borrow_raw(self.fd) }
    }
}
