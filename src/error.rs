//! Structured errors for inotify operations
//!
//! Every failing call is reported as exactly one [`Error`], which carries the
//! [`ErrorKind`], the `errno` value the kernel reported (if a syscall was made
//! at all), and the [`ErrorContext`] the failure is attributed to.

use std::{
    fmt,
    io,
    path::{
        Path,
        PathBuf,
    },
};

use libc::c_int;
use thiserror::Error;


/// Result type used throughout this crate
pub type Result<T> = std::result::Result<T, Error>;


/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A kernel resource is exhausted
    ///
    /// Too many open files, too many inotify instances or watches, or the
    /// kernel ran out of memory.
    Resource,

    /// The path does not exist, or the watch is unknown to the instance
    NotFound,

    /// The caller lacks the rights to watch the path
    Permission,

    /// The arguments were malformed, or the instance is no longer usable
    InvalidArgument,

    /// Anything the classes above don't cover
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Resource        => "resource exhausted",
            ErrorKind::NotFound        => "not found",
            ErrorKind::Permission      => "permission denied",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Other           => "inotify error",
        };
        f.write_str(name)
    }
}


/// What an [`Error`] is about
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorContext {
    /// The inotify instance itself (creating or closing it)
    Instance,

    /// The path passed when adding a watch
    Path(PathBuf),

    /// The id of the watch passed when removing it
    Watch(c_int),

    /// The event queue, while reading events
    Queue,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorContext::Instance   => f.write_str("inotify instance"),
            ErrorContext::Path(path) => write!(f, "path `{}`", path.display()),
            ErrorContext::Watch(id)  => write!(f, "watch {}", id),
            ErrorContext::Queue      => f.write_str("event queue"),
        }
    }
}


/// The syscall an `errno` value came from
///
/// Some `errno` values mean different things depending on the call. Most
/// notably, `EINVAL` from `inotify_rm_watch` means the watch descriptor is
/// unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Syscall {
    Init,
    AddWatch,
    RmWatch,
    Read,
    Ioctl,
    Fcntl,
    Close,
}


/// An error from an inotify operation
#[derive(Debug, Error)]
#[error("{kind} ({context}): {source}")]
pub struct Error {
    kind   : ErrorKind,
    errno  : Option<i32>,
    context: ErrorContext,
    source : io::Error,
}

impl Error {
    /// Translates the current `errno` after `syscall` failed
    pub(crate) fn last_os_error(syscall: Syscall, context: ErrorContext)
        -> Self
    {
        Self::from_io(syscall, io::Error::last_os_error(), context)
    }

    /// Translates an `io::Error` that was produced by `syscall`
    pub(crate) fn from_io(
        syscall: Syscall,
        source : io::Error,
        context: ErrorContext,
    )
        -> Self
    {
        let errno = source.raw_os_error();
        let kind  = match errno {
            Some(errno) => kind_for(syscall, errno),
            None        => ErrorKind::Other,
        };

        Error {
            kind,
            errno,
            context,
            source,
        }
    }

    /// An argument was rejected before any syscall was made
    pub(crate) fn invalid_argument(context: ErrorContext, message: &str)
        -> Self
    {
        Error {
            kind   : ErrorKind::InvalidArgument,
            errno  : None,
            context,
            source : io::Error::new(io::ErrorKind::InvalidInput, message),
        }
    }

    /// The instance was closed through another handle
    pub(crate) fn closed(context: ErrorContext) -> Self {
        Error {
            kind   : ErrorKind::InvalidArgument,
            errno  : Some(libc::EBADF),
            context,
            source : io::Error::new(
                io::ErrorKind::InvalidInput,
                "inotify instance has been closed",
            ),
        }
    }

    /// The watch descriptor was not issued by this instance
    pub(crate) fn foreign_watch(id: c_int) -> Self {
        Error {
            kind   : ErrorKind::NotFound,
            errno  : None,
            context: ErrorContext::Watch(id),
            source : io::Error::new(
                io::ErrorKind::NotFound,
                "watch descriptor does not belong to this inotify instance",
            ),
        }
    }

    /// The classification of this error
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The `errno` value reported by the kernel
    ///
    /// `None` if the error was detected before any syscall was made.
    pub fn errno(&self) -> Option<i32> {
        self.errno
    }

    /// What this error is about
    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// The path that could not be watched, if this error came from adding a
    /// watch
    pub fn path(&self) -> Option<&Path> {
        match &self.context {
            ErrorContext::Path(path) => Some(path),
            _                        => None,
        }
    }

    /// The id of the watch that could not be removed, if this error came from
    /// removing a watch
    pub fn watch_id(&self) -> Option<c_int> {
        match self.context {
            ErrorContext::Watch(id) => Some(id),
            _                       => None,
        }
    }

    /// Whether this is an [`ErrorKind::NotFound`] error
    ///
    /// When removing a watch, this usually means the watch is already gone,
    /// because the watched file was deleted or its file system unmounted.
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Whether this is an [`ErrorKind::Resource`] error
    pub fn is_resource(&self) -> bool {
        self.kind == ErrorKind::Resource
    }

    /// Whether this is an [`ErrorKind::Permission`] error
    pub fn is_permission(&self) -> bool {
        self.kind == ErrorKind::Permission
    }

    /// Whether this is an [`ErrorKind::InvalidArgument`] error
    pub fn is_invalid_argument(&self) -> bool {
        self.kind == ErrorKind::InvalidArgument
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        let kind = match error.kind {
            ErrorKind::NotFound        => io::ErrorKind::NotFound,
            ErrorKind::Permission      => io::ErrorKind::PermissionDenied,
            ErrorKind::InvalidArgument => io::ErrorKind::InvalidInput,
            ErrorKind::Resource        => io::ErrorKind::Other,
            ErrorKind::Other           => error.source.kind(),
        };
        io::Error::new(kind, error)
    }
}


fn kind_for(syscall: Syscall, errno: c_int) -> ErrorKind {
    match (syscall, errno) {
        (Syscall::RmWatch, libc::EINVAL) => ErrorKind::NotFound,

        (_, libc::ENOENT) => ErrorKind::NotFound,

        (_, libc::EACCES)
        | (_, libc::EPERM) => ErrorKind::Permission,

        (_, libc::EMFILE)
        | (_, libc::ENFILE)
        | (_, libc::ENOMEM)
        | (_, libc::ENOSPC) => ErrorKind::Resource,

        (_, libc::EINVAL)
        | (_, libc::EBADF)
        | (_, libc::EFAULT)
        | (_, libc::ENOTDIR)
        | (_, libc::ENAMETOOLONG)
        | (_, libc::ELOOP)
        | (_, libc::EEXIST) => ErrorKind::InvalidArgument,

        _ => ErrorKind::Other,
    }
}


#[cfg(test)]
mod tests {
    use std::{
        io,
        path::Path,
    };

    use super::{
        Error,
        ErrorContext,
        ErrorKind,
        Syscall,
    };


    fn errno_error(syscall: Syscall, errno: i32, context: ErrorContext)
        -> Error
    {
        Error::from_io(syscall, io::Error::from_raw_os_error(errno), context)
    }

    #[test]
    fn add_watch_errors_should_carry_the_path() {
        let error = errno_error(
            Syscall::AddWatch,
            libc::ENOENT,
            ErrorContext::Path("/no/such/path".into()),
        );

        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.errno(), Some(libc::ENOENT));
        assert_eq!(error.path(), Some(Path::new("/no/such/path")));
        assert_eq!(error.watch_id(), None);
    }

    #[test]
    fn einval_from_rm_watch_should_mean_not_found() {
        let error = errno_error(
            Syscall::RmWatch,
            libc::EINVAL,
            ErrorContext::Watch(7),
        );

        assert!(error.is_not_found());
        assert_eq!(error.watch_id(), Some(7));
    }

    #[test]
    fn einval_elsewhere_should_mean_invalid_argument() {
        for syscall in &[Syscall::Init, Syscall::AddWatch, Syscall::Read] {
            let error = errno_error(*syscall, libc::EINVAL, ErrorContext::Queue);
            assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn errno_values_should_map_to_kinds() {
        let cases = [
            (libc::EMFILE , ErrorKind::Resource),
            (libc::ENFILE , ErrorKind::Resource),
            (libc::ENOSPC , ErrorKind::Resource),
            (libc::ENOMEM , ErrorKind::Resource),
            (libc::EACCES , ErrorKind::Permission),
            (libc::EPERM  , ErrorKind::Permission),
            (libc::ENOTDIR, ErrorKind::InvalidArgument),
            (libc::EIO    , ErrorKind::Other),
        ];

        for &(errno, kind) in &cases {
            let error = errno_error(
                Syscall::AddWatch,
                errno,
                ErrorContext::Path("/tmp".into()),
            );
            assert_eq!(error.kind(), kind, "errno {}", errno);
        }
    }

    #[test]
    fn errors_without_syscall_should_have_no_errno() {
        let error = Error::invalid_argument(
            ErrorContext::Path("".into()),
            "empty path",
        );
        assert!(error.is_invalid_argument());
        assert_eq!(error.errno(), None);

        let error = Error::foreign_watch(3);
        assert!(error.is_not_found());
        assert_eq!(error.errno(), None);
    }

    #[test]
    fn display_should_mention_context() {
        let error = errno_error(
            Syscall::AddWatch,
            libc::EACCES,
            ErrorContext::Path("/root/secret".into()),
        );
        let message = error.to_string();

        assert!(message.starts_with("permission denied (path `/root/secret`)"));
    }

    #[test]
    fn conversion_into_io_error_should_keep_kind() {
        let error: io::Error = Error::foreign_watch(1).into();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }
}
