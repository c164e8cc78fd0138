use std::os::unix::io::RawFd;

use inotify_sys as ffi;
use libc::{
    c_int,
    c_void,
    size_t,
};


/// Reads from `fd` into `buffer`, returning the raw `read(2)` result.
pub fn read_into_buffer(fd: RawFd, buffer: &mut [u8]) -> isize {
    unsafe {
        ffi::read(
            fd,
            buffer.as_mut_ptr() as *mut c_void,
            buffer.len() as size_t,
        )
    }
}

/// Number of bytes queued on `fd`, as reported by `FIONREAD`.
///
/// Returns `None` if the `ioctl` failed; the error is left in `errno`.
pub fn bytes_queued(fd: RawFd) -> Option<usize> {
    let mut available: c_int = 0;
    let result = unsafe {
        libc::ioctl(fd, libc::FIONREAD, &mut available as *mut c_int)
    };

    match result {
        -1 => None,
        _  => Some(available.max(0) as usize),
    }
}

/// Toggles `O_NONBLOCK` on `fd`.
pub fn set_nonblocking(fd: RawFd, nonblocking: bool) -> c_int {
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags == -1 {
            return -1;
        }

        let flags = if nonblocking {
            flags | libc::O_NONBLOCK
        }
        else {
            flags & !libc::O_NONBLOCK
        };

        libc::fcntl(fd, libc::F_SETFL, flags)
    }
}
