use std::{
    collections::HashMap,
    ffi::{OsStr, OsString},
    fmt::{self, Display},
    mem,
    os::raw::c_int,
    os::unix::ffi::OsStrExt,
    path::PathBuf,
    sync::Weak,
};

use inotify_sys as ffi;

use crate::consts;
use crate::fd_guard::FdGuard;
use crate::watches::WatchDescriptor;


/// Size of the fixed part of a kernel event record
///
/// Every record the kernel queues starts with a `struct inotify_event`: the
/// watch descriptor (`i32`), the event mask, the cookie and the length of the
/// name that follows (each `u32`), in native byte order. `len` bytes of
/// NUL-padded name come right after that header, so a record occupies
/// `EVENT_HEADER_SIZE + len` bytes.
pub const EVENT_HEADER_SIZE: usize = mem::size_of::<ffi::inotify_event>();


/// Iterator over inotify events
///
/// Allows for iteration over the events returned by
/// [`Inotify::read_events_blocking`] or [`Inotify::read_events`].
///
/// [`Inotify::read_events_blocking`]: crate::Inotify::read_events_blocking
/// [`Inotify::read_events`]: crate::Inotify::read_events
#[derive(Debug)]
pub struct Events<'a> {
    fd: Weak<FdGuard>,
    buffer: &'a [u8],
    num_bytes: usize,
    pos: usize,
    paths: HashMap<c_int, PathBuf>,
}

impl<'a> Events<'a> {
    pub(crate) fn new(fd: Weak<FdGuard>, buffer: &'a [u8], num_bytes: usize) -> Self {
        Events {
            fd,
            buffer,
            num_bytes,
            pos: 0,
            paths: HashMap::new(),
        }
    }

    /// Attaches the watched path of each watch descriptor to its events
    pub(crate) fn with_paths(mut self, paths: HashMap<c_int, PathBuf>) -> Self {
        self.paths = paths;
        self
    }
}

impl<'a> Iterator for Events<'a> {
    type Item = Event<&'a OsStr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos < self.num_bytes {
            let (step, mut event) = Event::from_buffer(
                self.fd.clone(),
                &self.buffer[self.pos..self.num_bytes],
            )?;
            self.pos += step;
            event.path = self.paths.get(&event.wd.id).cloned();

            Some(event)
        } else {
            None
        }
    }
}

/// An inotify event
///
/// A file system event that describes a change that the user previously
/// registered interest in. To watch for events, call [`Watches::add`]. To
/// retrieve events, call [`Inotify::read_events_blocking`] or
/// [`Inotify::read_events`].
///
/// [`Watches::add`]: crate::Watches::add
/// [`Inotify::read_events_blocking`]: crate::Inotify::read_events_blocking
/// [`Inotify::read_events`]: crate::Inotify::read_events
#[derive(Clone, Debug)]
pub struct Event<S> {
    /// Identifies the watch this event originates from
    ///
    /// This [`WatchDescriptor`] is equal to the one that [`Watches::add`]
    /// returned when interest for this event was registered. The
    /// [`WatchDescriptor`] can be used to remove the watch using
    /// [`Watches::remove`], thereby preventing future events of this type
    /// from being created.
    ///
    /// Once an event with [`EventMask::IGNORED`] has been seen for a watch,
    /// its descriptor is no longer valid.
    ///
    /// [`Watches::add`]: crate::Watches::add
    /// [`Watches::remove`]: crate::Watches::remove
    pub wd: WatchDescriptor,

    /// Indicates what kind of event this is
    pub mask: EventMask,

    /// Connects related events to each other
    ///
    /// When a file is renamed, this results two events: [`MOVED_FROM`] and
    /// [`MOVED_TO`]. The `cookie` field will be the same for both of them,
    /// thereby making is possible to connect the event pair. The two events
    /// are not guaranteed to arrive in the same read.
    ///
    /// [`MOVED_FROM`]: EventMask::MOVED_FROM
    /// [`MOVED_TO`]: EventMask::MOVED_TO
    pub cookie: u32,

    /// The name of the file the event originates from
    ///
    /// This field is set only if the subject of the event is a file or directory in a
    /// watched directory. If the event concerns a file or directory that is
    /// watched directly, `name` will be `None`.
    pub name: Option<S>,

    /// The watched path the event originates from
    ///
    /// This is the path the watch was added for, as it was recorded when the
    /// event was read. It stays available for the last events of a watch,
    /// up to and including [`EventMask::IGNORED`], after the watch itself is
    /// gone. `None` for [`EventMask::Q_OVERFLOW`], for watches the instance
    /// doesn't know about, and for the events of a watch that was already
    /// taken out with [`Watches::remove`].
    ///
    /// [`Watches::remove`]: crate::Watches::remove
    pub path: Option<PathBuf>,
}

impl<S> Event<S>
    where S: AsRef<OsStr>
{
    /// Returns the path of the file the event is about
    ///
    /// That is [`Event::path`] joined with [`Event::name`], if the event
    /// originates from an object inside a watched directory.
    pub fn full_path(&self) -> Option<PathBuf> {
        let path = self.path.as_ref()?;
        match &self.name {
            Some(name) => {
                let name: &OsStr = name.as_ref();
                Some(path.join(name))
            }
            None       => Some(path.clone()),
        }
    }
}

impl<'a> Event<&'a OsStr> {
    fn new(fd: Weak<FdGuard>, event: &ffi::inotify_event, name: &'a OsStr) -> Self {
        // Bits this crate doesn't know about are kept, not reinterpreted.
        let mask = EventMask::from_bits_retain(event.mask);

        let wd = crate::WatchDescriptor { id: event.wd, fd };

        let name = if name.is_empty() { None } else { Some(name) };

        Event {
            wd,
            mask,
            cookie: event.cookie,
            name,
            path: None,
        }
    }

    /// Create an `Event` from a buffer
    ///
    /// Expects a full `inotify_event` plus its name at the beginning of
    /// `buffer`.
    ///
    /// Returns the number of bytes used from the buffer, and the event, or
    /// `None` if `buffer` is too short to hold a complete record.
    pub(crate) fn from_buffer(fd: Weak<FdGuard>, buffer: &'a [u8]) -> Option<(usize, Self)> {
        // Make sure that the buffer is big enough to contain an event, without
        // the name. Otherwise we can't safely convert it to an `inotify_event`.
        if buffer.len() < EVENT_HEADER_SIZE {
            return None;
        }

        let ffi_event_ptr = buffer.as_ptr() as *const ffi::inotify_event;

        // We have a pointer to an `inotify_event`, pointing to the beginning of
        // `buffer`. We just checked that there are enough bytes for one, so we
        // can read it. `read_unaligned()` is needed since the byte buffer has
        // alignment 1, while `inotify_event` has a higher alignment.
        let ffi_event = unsafe { ffi_event_ptr.read_unaligned() };

        // The kernel never splits a record across reads, but a buffer handed
        // to us might still be cut short.
        let bytes_consumed = EVENT_HEADER_SIZE + ffi_event.len as usize;
        if buffer.len() < bytes_consumed {
            return None;
        }

        // The name is padded with '\0' up to the alignment boundary. Here we
        // remove those additional bytes.
        let name = &buffer[EVENT_HEADER_SIZE..bytes_consumed];
        let name = name.split(|b| *b == 0).next().unwrap_or(&[]);

        let event = Event::new(fd, &ffi_event, OsStr::from_bytes(name));

        Some((bytes_consumed, event))
    }

    /// Returns an owned copy of the event.
    #[must_use = "cloning is often expensive and is not expected to have side effects"]
    pub fn to_owned(&self) -> EventOwned {
        Event {
            wd: self.wd.clone(),
            mask: self.mask,
            cookie: self.cookie,
            name: self.name.map(OsStr::to_os_string),
            path: self.path.clone(),
        }
    }
}

/// An owned version of `Event`
pub type EventOwned = Event<OsString>;

bitflags! {
    /// Indicates the type of an event
    ///
    /// This struct can be retrieved from an [`Event`] via its `mask` field.
    /// You can determine the [`Event`]'s type by comparing the `EventMask` to
    /// its associated constants.
    #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
    pub struct EventMask: u32 {
        /// File was accessed
        ///
        /// When watching a directory, this event is only triggered for objects
        /// inside the directory, not the directory itself.
        ///
        /// See [`inotify_sys::IN_ACCESS`].
        const ACCESS = ffi::IN_ACCESS;

        /// Metadata (permissions, timestamps, ...) changed
        ///
        /// See [`inotify_sys::IN_ATTRIB`].
        const ATTRIB = ffi::IN_ATTRIB;

        /// File opened for writing was closed
        ///
        /// See [`inotify_sys::IN_CLOSE_WRITE`].
        const CLOSE_WRITE = ffi::IN_CLOSE_WRITE;

        /// File or directory not opened for writing was closed
        ///
        /// See [`inotify_sys::IN_CLOSE_NOWRITE`].
        const CLOSE_NOWRITE = ffi::IN_CLOSE_NOWRITE;

        /// File/directory created in watched directory
        ///
        /// See [`inotify_sys::IN_CREATE`].
        const CREATE = ffi::IN_CREATE;

        /// File/directory deleted from watched directory
        const DELETE = ffi::IN_DELETE;

        /// Watched file/directory was deleted
        ///
        /// See [`inotify_sys::IN_DELETE_SELF`].
        const DELETE_SELF = ffi::IN_DELETE_SELF;

        /// File was modified
        ///
        /// See [`inotify_sys::IN_MODIFY`].
        const MODIFY = ffi::IN_MODIFY;

        /// Watched file/directory was moved
        ///
        /// See [`inotify_sys::IN_MOVE_SELF`].
        const MOVE_SELF = ffi::IN_MOVE_SELF;

        /// File was renamed/moved; watched directory contained old name
        ///
        /// See [`inotify_sys::IN_MOVED_FROM`].
        const MOVED_FROM = ffi::IN_MOVED_FROM;

        /// File was renamed/moved; watched directory contains new name
        ///
        /// See [`inotify_sys::IN_MOVED_TO`].
        const MOVED_TO = ffi::IN_MOVED_TO;

        /// File or directory was opened
        ///
        /// See [`inotify_sys::IN_OPEN`].
        const OPEN = ffi::IN_OPEN;

        /// Watch was removed
        ///
        /// This event will be generated, if the watch was removed explicitly
        /// (via [`Watches::remove`]), or automatically (because the file was
        /// deleted or the file system was unmounted).
        ///
        /// See [`inotify_sys::IN_IGNORED`].
        ///
        /// [`Watches::remove`]: crate::Watches::remove
        const IGNORED = ffi::IN_IGNORED;

        /// Event related to a directory
        ///
        /// The subject of the event is a directory.
        ///
        /// See [`inotify_sys::IN_ISDIR`].
        const ISDIR = ffi::IN_ISDIR;

        /// Event queue overflowed
        ///
        /// The event queue has overflowed and events have presumably been lost.
        ///
        /// See [`inotify_sys::IN_Q_OVERFLOW`].
        const Q_OVERFLOW = ffi::IN_Q_OVERFLOW;

        /// File system was unmounted
        ///
        /// The file system that contained the watched object has been
        /// unmounted. An event with [`EventMask::IGNORED`] will subsequently be
        /// generated for the same watch descriptor.
        ///
        /// See [`inotify_sys::IN_UNMOUNT`].
        const UNMOUNT = ffi::IN_UNMOUNT;
    }
}

impl Display for EventMask {
    /// Formats the mask as its kernel flag names, e.g. `IN_CREATE | IN_ISDIR`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = consts::decode_mask(self.bits());
        if names.is_empty() {
            return f.write_str("0");
        }
        f.write_str(&names.join(" | "))
    }
}
