use std::{
    collections::HashMap,
    io,
    os::raw::c_int,
    os::unix::io::{
        AsFd,
        AsRawFd,
        BorrowedFd,
        RawFd,
    },
    path::PathBuf,
    sync::{
        Arc,
        Mutex,
    },
};

use inotify_sys as ffi;
use tracing::{
    debug,
    trace,
    warn,
};

use crate::error::{
    Error,
    ErrorContext,
    Result,
    Syscall,
};
use crate::events::{
    EventMask,
    Events,
};
use crate::fd_guard::FdGuard;
use crate::util::{
    bytes_queued,
    read_into_buffer,
    set_nonblocking,
};
use crate::watches::{
    lock,
    WatchTable,
    Watches,
};


/// Idiomatic Rust wrapper around an inotify instance
///
/// `Inotify` owns one kernel event queue, and the table of watches registered
/// on it. It generally tries to adhere to the underlying inotify API as
/// closely as possible, while at the same time making access to it safe and
/// convenient.
///
/// Please note that using inotify correctly is not always trivial, and while
/// this wrapper tries to alleviate that, it is not perfect. Please refer to the
/// inotify man pages for potential problems to watch out for.
///
/// # Examples
///
/// ```
/// use inotify_watch::{
///     Inotify,
///     WatchMask,
/// };
///
/// let mut inotify = Inotify::init()
///     .expect("Error while initializing inotify instance");
///
/// // Watch for modify and close events.
/// inotify
///     .watches()
///     .add(
///         "/tmp/",
///         WatchMask::MODIFY | WatchMask::CLOSE,
///     )
///     .expect("Failed to add file watch");
///
/// // Read events that were added with `Watches::add` above.
/// let mut buffer = [0; 1024];
/// let events = inotify.read_events(&mut buffer)
///     .expect("Error while reading events");
///
/// for event in events {
///     // Handle event
/// }
/// ```
#[derive(Debug)]
pub struct Inotify {
    fd   : Arc<FdGuard>,
    table: Arc<Mutex<WatchTable>>,
}

impl Inotify {
    /// Creates an [`Inotify`] instance
    ///
    /// Initializes an inotify instance by calling [`inotify_init1`].
    ///
    /// This method passes both flags accepted by [`inotify_init1`], not giving
    /// the user any choice in the matter, as not passing the flags would be
    /// inappropriate in the context of this wrapper:
    ///
    /// - [`IN_CLOEXEC`] prevents leaking file descriptors to other processes.
    /// - [`IN_NONBLOCK`] controls the blocking behavior of the inotify API,
    ///   which is entirely managed by this wrapper.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Resource`] error if the per-user instance limit
    /// or the file descriptor table is exhausted.
    ///
    /// # Examples
    ///
    /// ```
    /// use inotify_watch::Inotify;
    ///
    /// let inotify = Inotify::init()
    ///     .expect("Failed to initialize an inotify instance");
    /// ```
    ///
    /// [`inotify_init1`]: inotify_sys::inotify_init1
    /// [`IN_CLOEXEC`]: inotify_sys::IN_CLOEXEC
    /// [`IN_NONBLOCK`]: inotify_sys::IN_NONBLOCK
    /// [`ErrorKind::Resource`]: crate::ErrorKind::Resource
    pub fn init() -> Result<Inotify> {
        let fd = unsafe {
            // `IN_NONBLOCK` makes everything non-blocking by default;
            // `read_events_blocking` overrides that for a single read.
            ffi::inotify_init1(ffi::IN_CLOEXEC | ffi::IN_NONBLOCK)
        };

        if fd == -1 {
            let error = Error::last_os_error(Syscall::Init, ErrorContext::Instance);
            debug!(error = %error, "failed to create inotify instance");
            return Err(error);
        }

        debug!(fd, "created inotify instance");

        Ok(Inotify {
            fd   : Arc::new(FdGuard::new(fd)),
            table: Arc::new(Mutex::new(WatchTable::new())),
        })
    }

    /// Gets an interface that allows adding and removing watches.
    /// See [`Watches::add`] and [`Watches::remove`].
    pub fn watches(&self) -> Watches {
        Watches::new(self.fd.clone(), self.table.clone())
    }

    /// Waits until events are available, then returns them
    ///
    /// Blocks the current thread until at least one event is available. If this
    /// is not desirable, please consider [`Inotify::read_events`].
    ///
    /// This method calls [`Inotify::read_events`] internally and behaves
    /// essentially the same, apart from the blocking behavior. Please refer to
    /// the documentation of [`Inotify::read_events`] for more information.
    ///
    /// The queue is switched back to non-blocking mode afterwards. If that
    /// fails, the failure is logged and the events are returned regardless.
    pub fn read_events_blocking<'a>(&mut self, buffer: &'a mut [u8])
        -> Result<Events<'a>>
    {
        if set_nonblocking(**self.fd, false) == -1 {
            return Err(Error::last_os_error(Syscall::Fcntl, ErrorContext::Queue));
        }
        let result = self.read_events(buffer);
        restore_nonblocking(**self.fd);

        result
    }

    /// Returns one buffer's worth of available events
    ///
    /// Reads as many events as possible into `buffer`, and returns an iterator
    /// over them. If no events are available, an empty iterator is returned
    /// immediately, so this method can be used to poll the queue after the
    /// file descriptor was reported readable by `poll`/`epoll`.
    ///
    /// The buffer should be large enough to hold at least one event with the
    /// longest possible file name, i.e. `EVENT_HEADER_SIZE + NAME_MAX + 1`
    /// bytes. Records are never split across reads, so the returned iterator
    /// only yields complete events.
    ///
    /// Watches that the read events report as [`EventMask::IGNORED`] are
    /// dropped from the watch table before this method returns.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::InvalidArgument`] error if `buffer` is too
    /// small for the next event, and translates any other error from [`read`].
    ///
    /// # Examples
    ///
    /// ```
    /// use inotify_watch::Inotify;
    ///
    /// let mut inotify = Inotify::init()
    ///     .expect("Failed to initialize an inotify instance");
    ///
    /// let mut buffer = [0; 1024];
    /// let events = inotify.read_events(&mut buffer)
    ///     .expect("Error while reading events");
    ///
    /// for event in events {
    ///     // Handle event
    /// }
    /// ```
    ///
    /// [`read`]: libc::read
    /// [`ErrorKind::InvalidArgument`]: crate::ErrorKind::InvalidArgument
    pub fn read_events<'a>(&mut self, buffer: &'a mut [u8])
        -> Result<Events<'a>>
    {
        let num_bytes = read_into_buffer(**self.fd, buffer);

        let num_bytes = match num_bytes {
            0 => {
                return Err(Error::from_io(
                    Syscall::Read,
                    io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "`read` returned `0`, signaling end-of-file",
                    ),
                    ErrorContext::Queue,
                ));
            }
            -1 => {
                let error = io::Error::last_os_error();
                if error.kind() == io::ErrorKind::WouldBlock {
                    trace!("no events available");
                    return Ok(Events::new(Arc::downgrade(&self.fd), buffer, 0));
                }
                return Err(Error::from_io(Syscall::Read, error, ErrorContext::Queue));
            }
            _ if num_bytes < 0 => {
                return Err(Error::from_io(
                    Syscall::Read,
                    io::Error::new(
                        io::ErrorKind::Other,
                        format!("unexpected return value from `read`: {}", num_bytes),
                    ),
                    ErrorContext::Queue,
                ));
            }
            _ => num_bytes as usize,
        };

        trace!(num_bytes, "read events");

        let buffer: &'a [u8] = buffer;
        let paths = self.update_table(Events::new(Arc::downgrade(&self.fd), buffer, num_bytes));

        Ok(Events::new(Arc::downgrade(&self.fd), buffer, num_bytes).with_paths(paths))
    }

    /// Returns the number of bytes of events waiting to be read
    ///
    /// Useful to only read once a certain amount of events has piled up.
    pub fn bytes_available(&self) -> Result<usize> {
        bytes_queued(**self.fd)
            .ok_or_else(|| Error::last_os_error(Syscall::Ioctl, ErrorContext::Queue))
    }

    /// Closes the inotify instance
    ///
    /// Closes the file descriptor referring to the inotify instance. The user
    /// usually doesn't have to call this function, as the underlying inotify
    /// instance is closed automatically, when [`Inotify`] and every [`Watches`]
    /// obtained from it are dropped.
    ///
    /// All watches of this instance are gone afterwards. Any [`Watches`] still
    /// around will fail every further operation with an
    /// [`ErrorKind::InvalidArgument`] error.
    ///
    /// # Errors
    ///
    /// Translates the error from the call to [`close`]. The file descriptor is
    /// released either way.
    ///
    /// # Examples
    ///
    /// ```
    /// use inotify_watch::Inotify;
    ///
    /// let inotify = Inotify::init()
    ///     .expect("Failed to initialize an inotify instance");
    ///
    /// inotify.close()
    ///     .expect("Failed to close inotify instance");
    /// ```
    ///
    /// [`close`]: libc::close
    /// [`ErrorKind::InvalidArgument`]: crate::ErrorKind::InvalidArgument
    pub fn close(self) -> Result<()> {
        let mut table = lock(&self.table);
        let num_watches = table.by_wd.len();
        table.close();

        let result = match self.fd.close_now() {
            0 => Ok(()),
            _ => Err(Error::last_os_error(Syscall::Close, ErrorContext::Instance)),
        };
        debug!(fd = **self.fd, num_watches, "closed inotify instance");

        result
    }

    /// Resolves the watched path of every event, then drops the watches that
    /// the events report as removed
    fn update_table(&self, events: Events<'_>) -> HashMap<c_int, PathBuf> {
        let mut table = lock(&self.table);
        let mut paths = HashMap::new();

        for event in events {
            if event.mask.contains(EventMask::Q_OVERFLOW) {
                warn!("inotify event queue overflowed, events were lost");
                continue;
            }
            if let Some(entry) = table.by_wd.get(&event.wd.id) {
                paths
                    .entry(event.wd.id)
                    .or_insert_with(|| entry.path.clone());
            }
            if event.mask.contains(EventMask::IGNORED) {
                if let Some(entry) = table.forget(event.wd.id) {
                    debug!(
                        wd = event.wd.id,
                        path = %entry.path.display(),
                        "watch was removed"
                    );
                }
            }
        }

        paths
    }
}

/// Switches the queue back to non-blocking reads
///
/// Events a blocking read consumed are gone from the kernel queue, so a
/// failure here is only logged. Returns whether the switch succeeded.
fn restore_nonblocking(fd: RawFd) -> bool {
    if set_nonblocking(fd, true) == -1 {
        let error = Error::last_os_error(Syscall::Fcntl, ErrorContext::Queue);
        warn!(fd, error = %error, "failed to make inotify queue non-blocking again");
        return false;
    }

    true
}

impl AsRawFd for Inotify {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.fd.fd
    }
}

impl AsFd for Inotify {
    #[inline]
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}
