//! Raw inotify flag values
//!
//! These are the bit values of the kernel's inotify ABI, under the names the
//! kernel uses for them. [`WatchMask`] and [`EventMask`] wrap the same values
//! in typed bitflags; use these constants where a bare `u32` is needed, for
//! example when decoding kernel event records by hand.
//!
//! [`WatchMask`]: crate::WatchMask
//! [`EventMask`]: crate::EventMask

pub use inotify_sys::{
    IN_ACCESS,
    IN_MODIFY,
    IN_ATTRIB,
    IN_CLOSE_WRITE,
    IN_CLOSE_NOWRITE,
    IN_OPEN,
    IN_MOVED_FROM,
    IN_MOVED_TO,
    IN_CREATE,
    IN_DELETE,
    IN_DELETE_SELF,
    IN_MOVE_SELF,

    IN_UNMOUNT,
    IN_Q_OVERFLOW,
    IN_IGNORED,

    IN_ONLYDIR,
    IN_DONT_FOLLOW,
    IN_EXCL_UNLINK,
    IN_MASK_ADD,
    IN_ISDIR,
    IN_ONESHOT,

    IN_CLOSE,
    IN_MOVE,
    IN_ALL_EVENTS,
};


/// Every single-bit flag, in ascending bit order
pub const FLAG_NAMES: &[(u32, &str)] = &[
    (IN_ACCESS       , "IN_ACCESS"),
    (IN_MODIFY       , "IN_MODIFY"),
    (IN_ATTRIB       , "IN_ATTRIB"),
    (IN_CLOSE_WRITE  , "IN_CLOSE_WRITE"),
    (IN_CLOSE_NOWRITE, "IN_CLOSE_NOWRITE"),
    (IN_OPEN         , "IN_OPEN"),
    (IN_MOVED_FROM   , "IN_MOVED_FROM"),
    (IN_MOVED_TO     , "IN_MOVED_TO"),
    (IN_CREATE       , "IN_CREATE"),
    (IN_DELETE       , "IN_DELETE"),
    (IN_DELETE_SELF  , "IN_DELETE_SELF"),
    (IN_MOVE_SELF    , "IN_MOVE_SELF"),
    (IN_UNMOUNT      , "IN_UNMOUNT"),
    (IN_Q_OVERFLOW   , "IN_Q_OVERFLOW"),
    (IN_IGNORED      , "IN_IGNORED"),
    (IN_ONLYDIR      , "IN_ONLYDIR"),
    (IN_DONT_FOLLOW  , "IN_DONT_FOLLOW"),
    (IN_EXCL_UNLINK  , "IN_EXCL_UNLINK"),
    (IN_MASK_ADD     , "IN_MASK_ADD"),
    (IN_ISDIR        , "IN_ISDIR"),
    (IN_ONESHOT      , "IN_ONESHOT"),
];

/// Returns the names of the flags set in `mask`
///
/// Only single-bit flags are reported, so `IN_CLOSE` shows up as
/// `IN_CLOSE_WRITE` and `IN_CLOSE_NOWRITE`. Bits that have no name are
/// skipped.
///
/// ```
/// use inotify_watch::consts::{decode_mask, IN_ISDIR, IN_CREATE};
///
/// assert_eq!(decode_mask(IN_CREATE | IN_ISDIR), ["IN_CREATE", "IN_ISDIR"]);
/// ```
pub fn decode_mask(mask: u32) -> Vec<&'static str> {
    FLAG_NAMES
        .iter()
        .filter(|(bit, _)| mask & bit != 0)
        .map(|&(_, name)| name)
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;


    const REQUESTABLE: &[u32] = &[
        IN_ACCESS,
        IN_MODIFY,
        IN_ATTRIB,
        IN_CLOSE_WRITE,
        IN_CLOSE_NOWRITE,
        IN_OPEN,
        IN_MOVED_FROM,
        IN_MOVED_TO,
        IN_CREATE,
        IN_DELETE,
        IN_DELETE_SELF,
        IN_MOVE_SELF,
    ];

    #[test]
    fn values_should_match_the_kernel_abi() {
        assert_eq!(IN_ACCESS       , 0x0000_0001);
        assert_eq!(IN_MODIFY       , 0x0000_0002);
        assert_eq!(IN_ATTRIB       , 0x0000_0004);
        assert_eq!(IN_CLOSE_WRITE  , 0x0000_0008);
        assert_eq!(IN_CLOSE_NOWRITE, 0x0000_0010);
        assert_eq!(IN_OPEN         , 0x0000_0020);
        assert_eq!(IN_MOVED_FROM   , 0x0000_0040);
        assert_eq!(IN_MOVED_TO     , 0x0000_0080);
        assert_eq!(IN_CREATE       , 0x0000_0100);
        assert_eq!(IN_DELETE       , 0x0000_0200);
        assert_eq!(IN_DELETE_SELF  , 0x0000_0400);
        assert_eq!(IN_MOVE_SELF    , 0x0000_0800);
        assert_eq!(IN_UNMOUNT      , 0x0000_2000);
        assert_eq!(IN_Q_OVERFLOW   , 0x0000_4000);
        assert_eq!(IN_IGNORED      , 0x0000_8000);
        assert_eq!(IN_ONLYDIR      , 0x0100_0000);
        assert_eq!(IN_DONT_FOLLOW  , 0x0200_0000);
        assert_eq!(IN_EXCL_UNLINK  , 0x0400_0000);
        assert_eq!(IN_MASK_ADD     , 0x2000_0000);
        assert_eq!(IN_ISDIR        , 0x4000_0000);
        assert_eq!(IN_ONESHOT      , 0x8000_0000);
    }

    #[test]
    fn requestable_flags_should_be_disjoint() {
        for (i, a) in REQUESTABLE.iter().enumerate() {
            assert_eq!(a.count_ones(), 1);
            for b in &REQUESTABLE[i + 1..] {
                assert_eq!(a & b, 0, "{:#x} overlaps {:#x}", a, b);
            }
        }
    }

    #[test]
    fn aggregates_should_equal_their_components() {
        assert_eq!(IN_CLOSE, IN_CLOSE_WRITE | IN_CLOSE_NOWRITE);
        assert_eq!(IN_MOVE , IN_MOVED_FROM | IN_MOVED_TO);
        assert_eq!(
            IN_ALL_EVENTS,
            REQUESTABLE.iter().fold(0, |mask, flag| mask | flag),
        );
    }

    #[test]
    fn flag_names_should_be_sorted_and_single_bit() {
        for window in FLAG_NAMES.windows(2) {
            assert!(window[0].0 < window[1].0);
        }
        for (bit, _) in FLAG_NAMES {
            assert_eq!(bit.count_ones(), 1);
        }
    }

    #[test]
    fn decode_mask_should_expand_aggregates_and_skip_unknown_bits() {
        assert_eq!(
            decode_mask(IN_CLOSE | 0x0000_1000),
            ["IN_CLOSE_WRITE", "IN_CLOSE_NOWRITE"],
        );
        assert!(decode_mask(0).is_empty());
    }
}
