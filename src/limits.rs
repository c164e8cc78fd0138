//! Kernel limits for inotify
//!
//! The kernel caps how many events may queue up per instance, how many
//! instances a user may create, and how many watches a user may add. Hitting
//! the latter two shows up as [`ErrorKind::Resource`] errors.
//!
//! [`ErrorKind::Resource`]: crate::ErrorKind::Resource

use std::{
    fs,
    path::Path,
};

use tracing::trace;


/// Where the kernel exposes the inotify limits
pub const PROCFS_PATH: &str = "/proc/sys/fs/inotify";


/// The inotify limits of the running system
///
/// Each value is `None` if it could not be read, which usually means the
/// kernel was built without inotify support.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    /// Events that may be queued per instance before [`IN_Q_OVERFLOW`]
    ///
    /// [`IN_Q_OVERFLOW`]: crate::consts::IN_Q_OVERFLOW
    pub max_queued_events: Option<u32>,

    /// Instances a single user may have open
    pub max_user_instances: Option<u32>,

    /// Watches a single user may have across all instances
    pub max_user_watches: Option<u32>,
}

impl Limits {
    /// Reads the limits from [`PROCFS_PATH`]
    pub fn read() -> Self {
        Self::read_from(PROCFS_PATH)
    }

    /// Reads the limits from the files in `dir`
    pub fn read_from<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();

        Limits {
            max_queued_events : read_value(dir, "max_queued_events"),
            max_user_instances: read_value(dir, "max_user_instances"),
            max_user_watches  : read_value(dir, "max_user_watches"),
        }
    }
}

fn read_value(dir: &Path, name: &str) -> Option<u32> {
    let path = dir.join(name);

    match fs::read_to_string(&path) {
        Ok(contents) => contents.trim().parse().ok(),
        Err(error)   => {
            trace!(path = %path.display(), error = %error, "failed to read limit");
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::Limits;


    #[test]
    fn read_from_should_parse_values() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("max_queued_events"), "16384\n").unwrap();
        fs::write(dir.path().join("max_user_instances"), "128\n").unwrap();
        fs::write(dir.path().join("max_user_watches"), "8192\n").unwrap();

        assert_eq!(
            Limits::read_from(dir.path()),
            Limits {
                max_queued_events : Some(16384),
                max_user_instances: Some(128),
                max_user_watches  : Some(8192),
            },
        );
    }

    #[test]
    fn missing_or_malformed_values_should_be_none() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("max_user_watches"), "many").unwrap();

        assert_eq!(Limits::read_from(dir.path()), Limits::default());
    }
}
