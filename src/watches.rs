use std::{
    cmp::Ordering,
    collections::HashMap,
    ffi::CString,
    hash::{
        Hash,
        Hasher,
    },
    os::raw::c_int,
    os::unix::ffi::OsStrExt,
    path::{
        Component,
        Path,
        PathBuf,
    },
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        Weak,
    },
};

use inotify_sys as ffi;
use tracing::{
    debug,
    trace,
};

use crate::error::{
    Error,
    ErrorContext,
    Result,
    Syscall,
};
use crate::fd_guard::FdGuard;

bitflags! {
    /// Describes a file system watch
    ///
    /// Passed to [`Watches::add`], to describe what file system events
    /// to watch for, and how to do that.
    ///
    /// # Examples
    ///
    /// `WatchMask` constants can be passed to [`Watches::add`] as is. For
    /// example, here's how to create a watch that triggers an event when a file
    /// is accessed:
    ///
    /// ``` rust
    /// # use inotify_watch::{
    /// #     Inotify,
    /// #     WatchMask,
    /// # };
    /// #
    /// # let inotify = Inotify::init().unwrap();
    /// #
    /// # // Create a temporary file, so `Watches::add` won't return an error.
    /// # use std::fs::File;
    /// # File::create("/tmp/inotify-watch-test-file")
    /// #     .expect("Failed to create test file");
    /// #
    /// inotify.watches().add("/tmp/inotify-watch-test-file", WatchMask::ACCESS)
    ///    .expect("Error adding watch");
    /// ```
    ///
    /// You can also combine multiple `WatchMask` constants. Here we add a watch
    /// this is triggered both when files are created or deleted in a directory:
    ///
    /// ``` rust
    /// # use inotify_watch::{
    /// #     Inotify,
    /// #     WatchMask,
    /// # };
    /// #
    /// # let inotify = Inotify::init().unwrap();
    /// inotify.watches().add("/tmp/", WatchMask::CREATE | WatchMask::DELETE)
    ///    .expect("Error adding watch");
    /// ```
    #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
    pub struct WatchMask: u32 {
        /// File was accessed
        ///
        /// When watching a directory, this event is only triggered for objects
        /// inside the directory, not the directory itself.
        ///
        /// See [`inotify_sys::IN_ACCESS`].
        const ACCESS = ffi::IN_ACCESS;

        /// Metadata (permissions, timestamps, ...) changed
        ///
        /// When watching a directory, this event can be triggered for the
        /// directory itself, as well as objects inside the directory.
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
        ///
        /// See [`inotify_sys::IN_DELETE`].
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

        /// Watch for all events
        ///
        /// This constant is simply a convenient combination of the following
        /// other constants:
        ///
        /// - [`ACCESS`](Self::ACCESS)
        /// - [`ATTRIB`](Self::ATTRIB)
        /// - [`CLOSE_WRITE`](Self::CLOSE_WRITE)
        /// - [`CLOSE_NOWRITE`](Self::CLOSE_NOWRITE)
        /// - [`CREATE`](Self::CREATE)
        /// - [`DELETE`](Self::DELETE)
        /// - [`DELETE_SELF`](Self::DELETE_SELF)
        /// - [`MODIFY`](Self::MODIFY)
        /// - [`MOVE_SELF`](Self::MOVE_SELF)
        /// - [`MOVED_FROM`](Self::MOVED_FROM)
        /// - [`MOVED_TO`](Self::MOVED_TO)
        /// - [`OPEN`](Self::OPEN)
        ///
        /// See [`inotify_sys::IN_ALL_EVENTS`].
        const ALL_EVENTS = ffi::IN_ALL_EVENTS;

        /// Watch for all move events
        ///
        /// Combines [`MOVED_FROM`](Self::MOVED_FROM) and
        /// [`MOVED_TO`](Self::MOVED_TO).
        ///
        /// See [`inotify_sys::IN_MOVE`].
        const MOVE = ffi::IN_MOVE;

        /// Watch for all close events
        ///
        /// Combines [`CLOSE_WRITE`](Self::CLOSE_WRITE) and
        /// [`CLOSE_NOWRITE`](Self::CLOSE_NOWRITE).
        ///
        /// See [`inotify_sys::IN_CLOSE`].
        const CLOSE = ffi::IN_CLOSE;

        /// Don't dereference the path if it is a symbolic link
        ///
        /// See [`inotify_sys::IN_DONT_FOLLOW`].
        const DONT_FOLLOW = ffi::IN_DONT_FOLLOW;

        /// Filter events for directory entries that have been unlinked
        ///
        /// See [`inotify_sys::IN_EXCL_UNLINK`].
        const EXCL_UNLINK = ffi::IN_EXCL_UNLINK;

        /// If a watch for the inode exists, amend it instead of replacing it
        ///
        /// See [`inotify_sys::IN_MASK_ADD`].
        const MASK_ADD = ffi::IN_MASK_ADD;

        /// Only receive one event, then remove the watch
        ///
        /// See [`inotify_sys::IN_ONESHOT`].
        const ONESHOT = ffi::IN_ONESHOT;

        /// Only watch path, if it is a directory
        ///
        /// See [`inotify_sys::IN_ONLYDIR`].
        const ONLYDIR = ffi::IN_ONLYDIR;
    }
}


/// Interface for adding and removing watches
///
/// Obtained from [`Inotify::watches`]. All clones refer to the same watch
/// table; adding and removing watches is serialized across them.
///
/// [`Inotify::watches`]: crate::Inotify::watches
#[derive(Clone, Debug)]
pub struct Watches {
    pub(crate) fd   : Arc<FdGuard>,
    pub(crate) table: Arc<Mutex<WatchTable>>,
}

impl Watches {
    /// Init watches with an inotify file descriptor
    pub(crate) fn new(fd: Arc<FdGuard>, table: Arc<Mutex<WatchTable>>)
        -> Self
    {
        Watches {
            fd,
            table,
        }
    }

    /// Adds or updates a watch for the given path
    ///
    /// Adds a new watch or updates an existing one for the file referred to by
    /// `path`. Returns a watch descriptor that can be used to refer to this
    /// watch later.
    ///
    /// The `mask` argument defines what kind of changes the file should be
    /// watched for, and how to do that. See the documentation of [`WatchMask`]
    /// for details. If `path` is already watched, its mask is replaced by
    /// `mask`, unless `mask` contains [`WatchMask::MASK_ADD`], in which case
    /// the new bits are added to the existing mask. See also
    /// [`Watches::add_additive`].
    ///
    /// If this method is used to add a new watch, a new [`WatchDescriptor`] is
    /// returned. If it is used to update an existing watch, a
    /// [`WatchDescriptor`] that equals the previously returned
    /// [`WatchDescriptor`] for that watch is returned instead.
    ///
    /// Registering a watch does not generate any events by itself.
    ///
    /// # Attention: Updating watches and hardlinks
    ///
    /// The kernel keeps one watch per inode, not per path. Adding a watch for
    /// a different path that links to an already watched inode updates that
    /// watch, and returns its [`WatchDescriptor`]. The watch table then
    /// records the watch under the most recently added path.
    ///
    /// A watch the kernel dropped on its own (its file was deleted, or the
    /// filesystem unmounted) stays in the table until the matching
    /// [`EventMask::IGNORED`] event is read through [`Inotify::read_events`].
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::InvalidArgument`] error without calling into
    /// the kernel if `path` is empty or contains a NUL byte, if `mask`
    /// contains unknown bits, or if `mask` selects no events at all.
    ///
    /// Otherwise translates the error from [`inotify_add_watch`]:
    /// [`ErrorKind::NotFound`] if `path` doesn't exist,
    /// [`ErrorKind::Permission`] if it may not be read, and
    /// [`ErrorKind::Resource`] if the watch limit is exhausted. The error
    /// carries `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use inotify_watch::{
    ///     Inotify,
    ///     WatchMask,
    /// };
    ///
    /// let inotify = Inotify::init()
    ///     .expect("Failed to initialize an inotify instance");
    ///
    /// # // Create a temporary file, so `Watches::add` won't return an error.
    /// # use std::fs::File;
    /// # File::create("/tmp/inotify-watch-test-file")
    /// #     .expect("Failed to create test file");
    /// #
    /// inotify.watches().add("/tmp/inotify-watch-test-file", WatchMask::MODIFY)
    ///     .expect("Failed to add file watch");
    ///
    /// // Handle events for the file here
    /// ```
    ///
    /// [`inotify_add_watch`]: inotify_sys::inotify_add_watch
    /// [`EventMask::IGNORED`]: crate::EventMask::IGNORED
    /// [`Inotify::read_events`]: crate::Inotify::read_events
    /// [`ErrorKind::InvalidArgument`]: crate::ErrorKind::InvalidArgument
    /// [`ErrorKind::NotFound`]: crate::ErrorKind::NotFound
    /// [`ErrorKind::Permission`]: crate::ErrorKind::Permission
    /// [`ErrorKind::Resource`]: crate::ErrorKind::Resource
    pub fn add<P>(&mut self, path: P, mask: WatchMask)
        -> Result<WatchDescriptor>
        where P: AsRef<Path>
    {
        let path    = path.as_ref();
        let context = || ErrorContext::Path(path.to_path_buf());

        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument(context(), "path is empty"));
        }
        if WatchMask::from_bits(mask.bits()).is_none() {
            return Err(Error::invalid_argument(
                context(),
                "mask contains unknown flags",
            ));
        }
        if !mask.intersects(WatchMask::ALL_EVENTS) {
            return Err(Error::invalid_argument(
                context(),
                "mask does not select any events",
            ));
        }

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| Error::invalid_argument(
                context(),
                "path contains a NUL byte",
            ))?;

        let mut table = lock(&self.table);
        if table.closed {
            return Err(Error::closed(context()));
        }

        let wd = unsafe {
            ffi::inotify_add_watch(
                **self.fd,
                c_path.as_ptr() as *const _,
                mask.bits(),
            )
        };

        if wd == -1 {
            let error = Error::last_os_error(Syscall::AddWatch, context());
            debug!(path = %path.display(), error = %error, "failed to add watch");
            return Err(error);
        }

        let effective = table.record(wd, normalize(path), mask);
        debug!(
            wd,
            path = %path.display(),
            mask = ?effective,
            "added watch"
        );

        Ok(WatchDescriptor { id: wd, fd: Arc::downgrade(&self.fd) })
    }

    /// Adds a watch, or adds `mask` to the mask of an existing one
    ///
    /// Same as calling [`Watches::add`] with [`WatchMask::MASK_ADD`] set in
    /// `mask`. No bits are ever removed from an existing watch.
    pub fn add_additive<P>(&mut self, path: P, mask: WatchMask)
        -> Result<WatchDescriptor>
        where P: AsRef<Path>
    {
        self.add(path, mask | WatchMask::MASK_ADD)
    }

    /// Stops watching a file
    ///
    /// Removes the watch represented by the provided [`WatchDescriptor`] by
    /// calling [`inotify_rm_watch`]. [`WatchDescriptor`]s can be obtained via
    /// [`Watches::add`], or from the `wd` field of [`Event`].
    ///
    /// Removing a watch makes the kernel queue an event with
    /// [`EventMask::IGNORED`] for it. The same happens if a watch goes away on
    /// its own, because the watched file was deleted or its file system was
    /// unmounted.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::NotFound`] error, carrying the watch's id, if
    /// the [`WatchDescriptor`] did not originate from this inotify instance,
    /// or if the watch doesn't exist anymore. The latter is to be expected
    /// when the watch was removed implicitly, and usually means the watch can
    /// be treated as gone.
    ///
    /// # Examples
    ///
    /// ```
    /// use inotify_watch::{
    ///     Inotify,
    ///     WatchMask,
    /// };
    ///
    /// let inotify = Inotify::init()
    ///     .expect("Failed to initialize an inotify instance");
    /// let mut watches = inotify.watches();
    ///
    /// # std::fs::File::create("/tmp/inotify-watch-remove-example")
    /// #     .expect("Failed to create test file");
    /// let wd = watches.add("/tmp/inotify-watch-remove-example", WatchMask::MODIFY)
    ///     .expect("Failed to add file watch");
    ///
    /// watches.remove(wd.clone()).expect("Failed to remove watch");
    /// assert!(watches.remove(wd).unwrap_err().is_not_found());
    /// ```
    ///
    /// [`inotify_rm_watch`]: inotify_sys::inotify_rm_watch
    /// [`Event`]: crate::Event
    /// [`EventMask::IGNORED`]: crate::EventMask::IGNORED
    /// [`ErrorKind::NotFound`]: crate::ErrorKind::NotFound
    pub fn remove(&mut self, wd: WatchDescriptor) -> Result<()> {
        if !self.owns(&wd) {
            return Err(Error::foreign_watch(wd.id));
        }

        let mut table = lock(&self.table);
        if table.closed {
            return Err(Error::closed(ErrorContext::Watch(wd.id)));
        }

        let result = match unsafe { ffi::inotify_rm_watch(**self.fd, wd.id) } {
            0  => Ok(()),
            -1 => Err(Error::last_os_error(
                Syscall::RmWatch,
                ErrorContext::Watch(wd.id),
            )),
            code => Err(Error::from_io(
                Syscall::RmWatch,
                std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!(
                        "unexpected return code from inotify_rm_watch ({})",
                        code,
                    ),
                ),
                ErrorContext::Watch(wd.id),
            )),
        };

        // Whether the kernel still knew the watch or not, it is gone now.
        table.forget(wd.id);

        match &result {
            Ok(())     => debug!(wd = wd.id, "removed watch"),
            Err(error) => debug!(wd = wd.id, error = %error, "failed to remove watch"),
        }

        result
    }

    /// Returns the watch registered for `path`, along with its mask
    ///
    /// `path` is compared after lexical normalization, so `/tmp/dir/` and
    /// `/tmp//dir` both find a watch added for `/tmp/dir`.
    pub fn path<P>(&self, path: P) -> Option<(WatchDescriptor, WatchMask)>
        where P: AsRef<Path>
    {
        let table = lock(&self.table);
        let id    = *table.by_path.get(&normalize(path.as_ref()))?;
        let entry = table.by_wd.get(&id)?;

        Some((self.descriptor(id), entry.mask))
    }

    /// Returns the path and mask of the given watch
    ///
    /// Returns `None` if the watch has been removed, or if `wd` doesn't
    /// belong to this inotify instance.
    pub fn wd(&self, wd: &WatchDescriptor) -> Option<(PathBuf, WatchMask)> {
        if !self.owns(wd) {
            return None;
        }

        lock(&self.table)
            .by_wd
            .get(&wd.id)
            .map(|entry| (entry.path.clone(), entry.mask))
    }

    /// Returns a snapshot of all active watches, ordered by id
    pub fn entries(&self) -> Vec<WatchEntry> {
        let table = lock(&self.table);

        let mut entries: Vec<_> = table.by_wd
            .iter()
            .map(|(&id, entry)| WatchEntry {
                wd  : self.descriptor(id),
                path: entry.path.clone(),
                mask: entry.mask,
            })
            .collect();
        entries.sort_by(|a, b| a.wd.cmp(&b.wd));

        entries
    }

    /// Returns the number of active watches
    pub fn len(&self) -> usize {
        lock(&self.table).by_wd.len()
    }

    /// Returns `true` if there are no active watches
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn owns(&self, wd: &WatchDescriptor) -> bool {
        Weak::ptr_eq(&wd.fd, &Arc::downgrade(&self.fd))
    }

    fn descriptor(&self, id: c_int) -> WatchDescriptor {
        WatchDescriptor { id, fd: Arc::downgrade(&self.fd) }
    }
}


/// An active watch, as recorded in the watch table
///
/// Returned by [`Watches::entries`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchEntry {
    /// Identifies the watch
    pub wd: WatchDescriptor,

    /// The path the watch was last added or updated for
    pub path: PathBuf,

    /// The events the watch is active for
    pub mask: WatchMask,
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableEntry {
    pub(crate) path: PathBuf,
    pub(crate) mask: WatchMask,
}

/// Watches known to one inotify instance
///
/// Mirrors the kernel's view as far as it can be known without reading
/// events: entries are added by [`Watches::add`], and dropped by
/// [`Watches::remove`], by reading an [`EventMask::IGNORED`] event, or when
/// the instance is closed.
///
/// [`EventMask::IGNORED`]: crate::EventMask::IGNORED
#[derive(Debug, Default)]
pub(crate) struct WatchTable {
    pub(crate) closed : bool,
    pub(crate) by_wd  : HashMap<c_int, TableEntry>,
    pub(crate) by_path: HashMap<PathBuf, c_int>,
}

impl WatchTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a successful `inotify_add_watch`
    ///
    /// Returns the mask the watch is now active for.
    pub(crate) fn record(&mut self, id: c_int, path: PathBuf, mask: WatchMask)
        -> WatchMask
    {
        let requested = mask - WatchMask::MASK_ADD;

        // The kernel merges masks per inode, so the existing mask for `id` is
        // the one to extend, whichever path it was recorded under.
        let effective = match self.by_wd.get(&id) {
            Some(entry) if mask.contains(WatchMask::MASK_ADD) => {
                entry.mask | requested
            }
            _ => requested,
        };

        // A different id for a known path means the old watch went away
        // without us seeing its `IGNORED` event yet.
        if let Some(&stale) = self.by_path.get(&path) {
            if stale != id {
                trace!(wd = stale, path = %path.display(), "dropping stale watch");
                self.by_wd.remove(&stale);
            }
        }
        if let Some(previous) = self.by_wd.remove(&id) {
            if previous.path != path {
                self.by_path.remove(&previous.path);
            }
        }

        self.by_path.insert(path.clone(), id);
        self.by_wd.insert(id, TableEntry { path, mask: effective });

        effective
    }

    /// Drops the entry for `id`, returning it if there was one
    pub(crate) fn forget(&mut self, id: c_int) -> Option<TableEntry> {
        let entry = self.by_wd.remove(&id)?;
        if self.by_path.get(&entry.path) == Some(&id) {
            self.by_path.remove(&entry.path);
        }
        Some(entry)
    }

    /// Marks the instance as closed and drops every entry
    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.by_wd.clear();
        self.by_path.clear();
    }
}


pub(crate) fn lock(table: &Mutex<WatchTable>) -> MutexGuard<'_, WatchTable> {
    // Table updates can't panic halfway, so a poisoned table is still
    // consistent.
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut components = path.components().peekable();

    // `Path::components` keeps a leading `.`, but `./x` names the same file
    // as `x`.
    if components.peek() == Some(&Component::CurDir) {
        let cur_dir = components.next();
        if components.peek().is_none() {
            return cur_dir.into_iter().collect();
        }
    }

    components.collect()
}


/// Represents a watch on an inode
///
/// Can be obtained from [`Watches::add`] or from an [`Event`]. A watch
/// descriptor can be used to get inotify to stop watching an inode by passing
/// it to [`Watches::remove`].
///
/// Watch descriptors can't be constructed by hand, and are only accepted by
/// the inotify instance that issued them.
///
/// [`Event`]: crate::Event
#[derive(Clone, Debug)]
pub struct WatchDescriptor{
    pub(crate) id: c_int,
    pub(crate) fd: Weak<FdGuard>,
}

impl WatchDescriptor {
    /// Getter method for a watcher's id.
    ///
    /// Can be used to distinguish events for files with the same name.
    pub fn get_watch_descriptor_id(&self) -> c_int {
        self.id
    }
}

impl Eq for WatchDescriptor {}

impl PartialEq for WatchDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.fd.upgrade().is_some()
            && Weak::ptr_eq(&self.fd, &other.fd)
    }
}

impl Ord for WatchDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl PartialOrd for WatchDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for WatchDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Only `self.id` is hashed, as `self.fd` is a weak pointer that might
        // no longer be available. Descriptors from different instances that
        // share an id merely collide.
        self.id.hash(state);
    }
}


#[cfg(test)]
mod tests {
    use std::path::{
        Path,
        PathBuf,
    };

    use super::{
        normalize,
        WatchMask,
        WatchTable,
    };


    fn mask_of(table: &WatchTable, path: &str) -> Option<WatchMask> {
        let id = table.by_path.get(Path::new(path))?;
        table.by_wd.get(id).map(|entry| entry.mask)
    }

    #[test]
    fn record_should_replace_mask_of_existing_watch() {
        let mut table = WatchTable::new();

        table.record(1, "/tmp/x".into(), WatchMask::MODIFY);
        let mask = table.record(1, "/tmp/x".into(), WatchMask::ATTRIB);

        assert_eq!(mask, WatchMask::ATTRIB);
        assert_eq!(mask_of(&table, "/tmp/x"), Some(WatchMask::ATTRIB));
        assert_eq!(table.by_wd.len(), 1);
    }

    #[test]
    fn record_should_union_mask_when_additive() {
        let mut table = WatchTable::new();

        table.record(1, "/tmp/x".into(), WatchMask::MODIFY);
        let mask = table.record(
            1,
            "/tmp/x".into(),
            WatchMask::ATTRIB | WatchMask::MASK_ADD,
        );

        assert_eq!(mask, WatchMask::MODIFY | WatchMask::ATTRIB);
        assert!(!mask.contains(WatchMask::MASK_ADD));
    }

    #[test]
    fn record_should_drop_stale_watch_for_same_path() {
        let mut table = WatchTable::new();

        table.record(1, "/tmp/x".into(), WatchMask::MODIFY);
        // The file was deleted and recreated, and got a fresh watch.
        let mask = table.record(
            2,
            "/tmp/x".into(),
            WatchMask::ATTRIB | WatchMask::MASK_ADD,
        );

        assert_eq!(mask, WatchMask::ATTRIB);
        assert!(!table.by_wd.contains_key(&1));
        assert_eq!(table.by_path.get(Path::new("/tmp/x")), Some(&2));
    }

    #[test]
    fn record_should_move_watch_to_latest_path_of_same_inode() {
        let mut table = WatchTable::new();

        table.record(1, "/tmp/a".into(), WatchMask::MODIFY);
        let mask = table.record(
            1,
            "/tmp/hardlink-to-a".into(),
            WatchMask::OPEN | WatchMask::MASK_ADD,
        );

        assert_eq!(mask, WatchMask::MODIFY | WatchMask::OPEN);
        assert_eq!(mask_of(&table, "/tmp/a"), None);
        assert_eq!(
            table.by_wd[&1].path,
            PathBuf::from("/tmp/hardlink-to-a"),
        );
    }

    #[test]
    fn forget_should_remove_both_directions() {
        let mut table = WatchTable::new();
        table.record(1, "/tmp/x".into(), WatchMask::MODIFY);

        let entry = table.forget(1).expect("entry should exist");

        assert_eq!(entry.path, PathBuf::from("/tmp/x"));
        assert!(table.by_wd.is_empty());
        assert!(table.by_path.is_empty());
        assert_eq!(table.forget(1), None);
    }

    #[test]
    fn close_should_forget_everything() {
        let mut table = WatchTable::new();
        table.record(1, "/tmp/x".into(), WatchMask::MODIFY);
        table.record(2, "/tmp/y".into(), WatchMask::MODIFY);

        table.close();

        assert!(table.closed);
        assert!(table.by_wd.is_empty());
        assert!(table.by_path.is_empty());
    }

    #[test]
    fn normalize_should_collapse_redundant_components() {
        assert_eq!(normalize(Path::new("/tmp//x/./y/")), PathBuf::from("/tmp/x/y"));
        assert_eq!(normalize(Path::new("/tmp/x/../y")), PathBuf::from("/tmp/x/../y"));
    }

    #[test]
    fn normalize_should_drop_leading_current_dir() {
        assert_eq!(normalize(Path::new("./x")), PathBuf::from("x"));
        assert_eq!(normalize(Path::new(".//x/")), PathBuf::from("x"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
        assert_eq!(normalize(Path::new(".")), PathBuf::from("."));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn aggregates_should_equal_their_components() {
        assert_eq!(
            WatchMask::CLOSE,
            WatchMask::CLOSE_WRITE | WatchMask::CLOSE_NOWRITE,
        );
        assert_eq!(WatchMask::MOVE, WatchMask::MOVED_FROM | WatchMask::MOVED_TO);
    }
}
