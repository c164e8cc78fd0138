//! Inotify watch instances with a watch table
//!
//! [Inotify][wiki] is a linux kernel mechanism for monitoring
//! changes to filesystems' contents.
//!
//! > The inotify API provides a mechanism for monitoring filesystem
//! > events. Inotify can be used to monitor individual files, or to
//! > monitor directories. When a directory is monitored, inotify will
//! > return events for the directory itself, and for files inside the
//! > directory.
//!
//! This crate wraps one inotify instance per [`Inotify`], and keeps track of
//! the watches registered on it: which path each [`WatchDescriptor`] stands
//! for, and which events it is active for. Failures are reported as an
//! [`Error`] that says what went wrong, and which path or watch it concerns.
//!
//! See the [man page][inotify7] for usage information
//! of the C version, which this crate follows closely.
//!
//! # Example
//!
//! ```
//! use inotify_watch::{
//!     Inotify,
//!     WatchMask,
//! };
//!
//! let mut inotify = Inotify::init()
//!     .expect("Failed to initialize inotify");
//!
//! let mut watches = inotify.watches();
//! let wd = watches
//!     .add("/tmp", WatchMask::CREATE | WatchMask::DELETE)
//!     .expect("Failed to add watch");
//!
//! // Adding the same path again updates the existing watch.
//! watches
//!     .add_additive("/tmp", WatchMask::MODIFY)
//!     .expect("Failed to update watch");
//! let (_, mask) = watches.wd(&wd).expect("Watch is active");
//! assert_eq!(mask, WatchMask::CREATE | WatchMask::DELETE | WatchMask::MODIFY);
//!
//! let mut buffer = [0u8; 4096];
//! for event in inotify.read_events(&mut buffer).expect("Failed to read events") {
//!     println!("{}: {:?}", event.mask, event.name);
//! }
//! ```
//!
//! [wiki]: https://en.wikipedia.org/wiki/Inotify
//! [inotify7]: http://man7.org/linux/man-pages/man7/inotify.7.html

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]


#[macro_use]
extern crate bitflags;

pub mod consts;
mod error;
mod events;
mod fd_guard;
mod inotify;
pub mod limits;
mod util;
mod watches;

pub use crate::error::{
    Error,
    ErrorContext,
    ErrorKind,
    Result,
};
pub use crate::events::{
    Event,
    EventMask,
    EventOwned,
    Events,
    EVENT_HEADER_SIZE,
};
pub use crate::inotify::Inotify;
pub use crate::limits::Limits;
pub use crate::watches::{
    WatchDescriptor,
    WatchEntry,
    WatchMask,
    Watches,
};
