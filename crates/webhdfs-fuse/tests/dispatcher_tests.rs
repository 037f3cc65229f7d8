//! Dispatcher behaviour against an in-memory namespace.

mod common;

use common::*;
use std::thread::sleep;
use std::time::Duration;
use webhdfs_core::ClientError;
use webhdfs_fuse::{FsError, Outcome};
use webhdfs_mount::ListingEntry;
use webhdfs_mount::attr::MODE_FILE;

fn names(listing: &[ListingEntry]) -> Vec<&str> {
    listing.iter().map(|entry| entry.name.as_str()).collect()
}

// ============================================================================
// Attributes and caching
// ============================================================================

#[test]
fn test_get_attributes_is_served_from_cache() {
    let storage = MemoryStorage::new();
    storage.add_file("/data.csv", b"a,b,c\n");
    let d = dispatcher(&storage);

    let first = d.get_attributes(&path("/data.csv")).unwrap();
    let second = d.get_attributes(&path("/data.csv")).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.size, 6);
    assert_eq!(first.mode, MODE_FILE | 0o644);
    assert_eq!(storage.calls(Op::Status), 1);
}

#[test]
fn test_cached_attributes_hide_remote_changes_until_invalidated() {
    let storage = MemoryStorage::new();
    storage.add_file("/f", b"1234");
    let d = dispatcher(&storage);

    assert_eq!(d.get_attributes(&path("/f")).unwrap().size, 4);
    storage.set_contents("/f", b"123456789");
    assert_eq!(d.get_attributes(&path("/f")).unwrap().size, 4);

    d.cache().invalidate(&path("/f"));
    assert_eq!(d.get_attributes(&path("/f")).unwrap().size, 9);
    assert_eq!(storage.calls(Op::Status), 2);
}

#[test]
fn test_negative_cache_short_circuits() {
    let storage = MemoryStorage::new();
    let d = dispatcher(&storage);

    let err = d.get_attributes(&path("/missing")).unwrap_err();
    assert!(matches!(err, FsError::NotFound(_)));
    assert_eq!(err.to_errno(), libc::ENOENT);

    // Appears remotely, but the negative entry is still fresh.
    storage.add_file("/missing", b"x");
    assert!(d.get_attributes(&path("/missing")).unwrap_err().is_not_found());
    assert_eq!(storage.calls(Op::Status), 1);
    assert!(d.cache().is_negatively_cached(&path("/missing")));

    d.cache().invalidate(&path("/missing"));
    assert_eq!(d.get_attributes(&path("/missing")).unwrap().size, 1);
    assert_eq!(storage.calls(Op::Status), 2);
}

#[test]
fn test_expired_entry_is_fetched_once() {
    let storage = MemoryStorage::new();
    storage.add_file("/f", b"abc");
    let d = dispatcher_with_ttl(&storage, Duration::from_millis(50));

    d.get_attributes(&path("/f")).unwrap();
    sleep(Duration::from_millis(80));

    d.get_attributes(&path("/f")).unwrap();
    d.get_attributes(&path("/f")).unwrap();
    assert_eq!(storage.calls(Op::Status), 2);
}

#[test]
fn test_expired_negative_entry_is_rechecked() {
    let storage = MemoryStorage::new();
    let d = dispatcher_with_ttl(&storage, Duration::from_millis(50));

    assert!(d.get_attributes(&path("/late")).is_err());
    storage.add_file("/late", b"hello");
    sleep(Duration::from_millis(80));

    assert_eq!(d.get_attributes(&path("/late")).unwrap().size, 5);
}

#[test]
fn test_unknown_owner_falls_back_to_nobody() {
    let storage = MemoryStorage::new();
    storage.add_file_owned("/theirs", b"", "mallory", "intruders");
    storage.add_file("/mine", b"");
    let d = dispatcher(&storage);

    let theirs = d.get_attributes(&path("/theirs")).unwrap();
    assert_eq!(theirs.uid, NOBODY_ID);
    assert_eq!(theirs.gid, NOGROUP_GID);

    // Same answer the second time, from the memo.
    d.cache().clear();
    let again = d.get_attributes(&path("/theirs")).unwrap();
    assert_eq!((again.uid, again.gid), (theirs.uid, theirs.gid));

    let mine = d.get_attributes(&path("/mine")).unwrap();
    assert_eq!(mine.uid, ALICE_UID);
    assert_eq!(mine.gid, STAFF_GID);
}

// ============================================================================
// Listings
// ============================================================================

#[test]
fn test_listing_warms_child_attributes() {
    let storage = MemoryStorage::new();
    storage.add_dir("/dir");
    storage.add_file("/dir/a", b"aaaa");
    storage.add_dir("/dir/sub");
    let d = dispatcher(&storage);

    let listing = d.list_directory(&path("/dir")).unwrap();
    assert_eq!(
        &listing[..],
        [ListingEntry::new("a", false), ListingEntry::new("sub", true)]
    );

    let a = d.get_attributes(&path("/dir/a")).unwrap();
    let sub = d.get_attributes(&path("/dir/sub")).unwrap();
    assert_eq!(a.size, 4);
    assert!(sub.is_dir());
    assert_eq!(storage.calls(Op::Status), 0);

    d.list_directory(&path("/dir")).unwrap();
    assert_eq!(storage.calls(Op::Listing), 1);
}

#[test]
fn test_listing_excludes_dot_entries() {
    let storage = MemoryStorage::new();
    storage.add_dir("/empty");
    let d = dispatcher(&storage);

    assert!(d.list_directory(&path("/empty")).unwrap().is_empty());
}

#[test]
fn test_invalidate_drops_parent_listing() {
    let storage = MemoryStorage::new();
    storage.add_dir("/dir");
    storage.add_file("/dir/a", b"");
    let d = dispatcher(&storage);

    d.list_directory(&path("/dir")).unwrap();
    d.cache().invalidate(&path("/dir/a"));

    assert!(d.cache().get_attributes(&path("/dir/a")).is_none());
    assert!(d.cache().get_listing(&path("/dir")).is_none());

    d.list_directory(&path("/dir")).unwrap();
    assert_eq!(storage.calls(Op::Listing), 2);
}

#[test]
fn test_listing_a_file_is_not_a_directory() {
    let storage = MemoryStorage::new();
    storage.add_file("/f", b"");
    let d = dispatcher(&storage);

    let err = d.list_directory(&path("/f")).unwrap_err();
    assert!(matches!(
        err,
        FsError::Client(ClientError::NotADirectory { .. })
    ));
    assert_eq!(err.to_errno(), libc::ENOTDIR);
}

#[test]
fn test_listing_missing_directory() {
    let storage = MemoryStorage::new();
    let d = dispatcher(&storage);

    let err = d.list_directory(&path("/nope")).unwrap_err();
    assert_eq!(err.to_errno(), libc::ENOENT);
}

// ============================================================================
// Read
// ============================================================================

#[test]
fn test_read_range() {
    let storage = MemoryStorage::new();
    storage.add_file("/f", b"hello world");
    let d = dispatcher(&storage);

    assert_eq!(&d.read(&path("/f"), 5, 6).unwrap()[..], b"world");
    assert_eq!(&d.read(&path("/f"), 100, 0).unwrap()[..], b"hello world");
}

#[test]
fn test_read_at_or_past_eof_skips_remote() {
    let storage = MemoryStorage::new();
    storage.add_file("/f", b"hello");
    let d = dispatcher(&storage);

    assert!(d.read(&path("/f"), 10, 5).unwrap().is_empty());
    assert!(d.read(&path("/f"), 10, 500).unwrap().is_empty());
    assert!(d.read(&path("/f"), 0, 0).unwrap().is_empty());
    assert_eq!(storage.calls(Op::Read), 0);
}

#[test]
fn test_read_missing_file() {
    let storage = MemoryStorage::new();
    let d = dispatcher(&storage);

    assert!(d.read(&path("/ghost"), 10, 0).unwrap_err().is_not_found());
}

// ============================================================================
// Write policy (100-byte file)
// ============================================================================

fn hundred_byte_file() -> (std::sync::Arc<MemoryStorage>, TestDispatcher) {
    let storage = MemoryStorage::new();
    storage.add_file("/log", &[b'x'; 100]);
    let d = dispatcher(&storage);
    (storage, d)
}

#[test]
fn test_write_at_end_appends_everything() {
    let (storage, d) = hundred_byte_file();

    assert_eq!(d.write(&path("/log"), &[b'y'; 10], 100).unwrap(), 10);
    assert_eq!(storage.appended(), vec![vec![b'y'; 10]]);
    assert_eq!(d.get_attributes(&path("/log")).unwrap().size, 110);
}

#[test]
fn test_overlapping_write_appends_new_tail() {
    let (storage, d) = hundred_byte_file();
    let mut data = vec![b'x'; 10];
    data.extend_from_slice(b"0123456789");

    assert_eq!(d.write(&path("/log"), &data, 90).unwrap(), 20);
    assert_eq!(storage.appended(), vec![b"0123456789".to_vec()]);
    assert_eq!(storage.contents("/log").unwrap().len(), 110);
}

#[test]
fn test_write_ending_at_eof_is_a_noop() {
    let (storage, d) = hundred_byte_file();

    assert_eq!(d.write(&path("/log"), &[b'x'; 10], 90).unwrap(), 10);
    assert_eq!(storage.calls(Op::Append), 0);
}

#[test]
fn test_write_inside_file_is_rejected() {
    let (storage, d) = hundred_byte_file();

    let err = d.write(&path("/log"), &[b'z'; 10], 0).unwrap_err();
    assert!(matches!(err, FsError::NotSupported { .. }));
    assert_eq!(err.to_errno(), libc::ENOTSUP);
    assert_eq!(storage.calls(Op::Append), 0);
    assert_eq!(storage.contents("/log").unwrap(), vec![b'x'; 100]);
}

#[test]
fn test_write_leaving_a_hole_is_rejected() {
    let (storage, d) = hundred_byte_file();

    let err = d.write(&path("/log"), &[b'z'; 10], 101).unwrap_err();
    assert_eq!(err.to_errno(), libc::ENOTSUP);
    assert_eq!(storage.calls(Op::Append), 0);
}

#[test]
fn test_write_policy_cases() {
    let cases: [(u64, Option<usize>); 4] = [(100, Some(10)), (50, None), (105, None), (95, Some(5))];
    for (offset, appended) in cases {
        let (storage, d) = hundred_byte_file();
        let result = d.write(&path("/log"), &[b'n'; 10], offset);
        match appended {
            Some(n) => {
                assert_eq!(result.unwrap(), 10, "offset {offset}");
                assert_eq!(storage.appended(), vec![vec![b'n'; n]], "offset {offset}");
            }
            None => {
                assert!(
                    matches!(result, Err(FsError::NotSupported { .. })),
                    "offset {offset}"
                );
                assert_eq!(storage.calls(Op::Append), 0, "offset {offset}");
            }
        }
    }
}

#[test]
fn test_write_uses_fresh_size() {
    let (storage, d) = hundred_byte_file();
    d.get_attributes(&path("/log")).unwrap();
    // Someone else appended; the cached size is stale.
    storage.set_contents("/log", &[b'x'; 120]);

    assert_eq!(d.write(&path("/log"), b"tail", 120).unwrap(), 4);
    assert_eq!(storage.contents("/log").unwrap().len(), 124);
}

#[test]
fn test_sequential_writes_build_the_file() {
    let storage = MemoryStorage::new();
    let d = dispatcher(&storage);
    d.create(&path("/out"), 0o100_644).unwrap();

    let mut offset = 0;
    for chunk in [&b"first "[..], b"second ", b"third"] {
        offset += d.write(&path("/out"), chunk, offset).unwrap() as u64;
    }
    assert_eq!(storage.contents("/out").unwrap(), b"first second third");
}

// ============================================================================
// Namespace mutations
// ============================================================================

#[test]
fn test_create_clears_negative_entry() {
    let storage = MemoryStorage::new();
    let d = dispatcher(&storage);
    assert!(d.get_attributes(&path("/new")).is_err());

    d.create(&path("/new"), 0o100_640).unwrap();

    let attr = d.get_attributes(&path("/new")).unwrap();
    assert_eq!(attr.size, 0);
    assert_eq!(attr.permissions(), 0o640);
    assert_eq!(storage.permission("/new").unwrap().bits(), 0o640);
}

#[test]
fn test_create_refreshes_parent_listing() {
    let storage = MemoryStorage::new();
    storage.add_dir("/dir");
    let d = dispatcher(&storage);
    assert!(d.list_directory(&path("/dir")).unwrap().is_empty());

    d.create(&path("/dir/fresh"), 0o644).unwrap();

    assert_eq!(names(&d.list_directory(&path("/dir")).unwrap()), ["fresh"]);
}

#[test]
fn test_mkdir_visible_in_parent_listing() {
    let storage = MemoryStorage::new();
    let d = dispatcher(&storage);
    d.list_directory(&path("/")).unwrap();

    d.mkdir(&path("/projects"), 0o750).unwrap();

    assert_eq!(names(&d.list_directory(&path("/")).unwrap()), ["projects"]);
    let attr = d.get_attributes(&path("/projects")).unwrap();
    assert!(attr.is_dir());
    assert_eq!(attr.permissions(), 0o750);
}

#[test]
fn test_unlink_removes_file() {
    let storage = MemoryStorage::new();
    storage.add_file("/doomed", b"bye");
    let d = dispatcher(&storage);
    d.get_attributes(&path("/doomed")).unwrap();

    d.unlink(&path("/doomed")).unwrap();

    assert!(!storage.exists("/doomed"));
    assert!(d.get_attributes(&path("/doomed")).unwrap_err().is_not_found());
}

#[test]
fn test_unlink_missing_is_not_found() {
    let storage = MemoryStorage::new();
    let d = dispatcher(&storage);

    let err = d.unlink(&path("/never")).unwrap_err();
    assert_eq!(err.to_errno(), libc::ENOENT);
}

#[test]
fn test_rmdir_is_recursive() {
    let storage = MemoryStorage::new();
    storage.add_dir("/tree");
    storage.add_file("/tree/leaf", b"");
    let d = dispatcher(&storage);
    d.list_directory(&path("/tree")).unwrap();

    d.rmdir(&path("/tree")).unwrap();

    assert!(!storage.exists("/tree/leaf"));
    assert!(d.cache().get_listing(&path("/tree")).is_none());
    assert!(d.list_directory(&path("/")).unwrap().is_empty());
}

#[test]
fn test_rename_within_directory() {
    let storage = MemoryStorage::new();
    storage.add_dir("/dir");
    storage.add_file("/dir/old", b"payload");
    let d = dispatcher(&storage);
    d.list_directory(&path("/dir")).unwrap();

    let new_path = d.rename(&path("/dir/old"), "new").unwrap();

    assert_eq!(new_path, path("/dir/new"));
    assert_eq!(names(&d.list_directory(&path("/dir")).unwrap()), ["new"]);

    storage.reset_calls();
    assert!(d.get_attributes(&path("/dir/old")).unwrap_err().is_not_found());
    assert_eq!(storage.calls(Op::Status), 1);
    assert_eq!(d.get_attributes(&path("/dir/new")).unwrap().size, 7);
}

#[test]
fn test_rename_clears_stale_negative_destination() {
    let storage = MemoryStorage::new();
    storage.add_file("/a", b"");
    let d = dispatcher(&storage);
    assert!(d.get_attributes(&path("/b")).is_err());

    d.rename(&path("/a"), "b").unwrap();

    assert!(d.get_attributes(&path("/b")).is_ok());
}

#[test]
fn test_refused_rename_is_no_space() {
    let storage = MemoryStorage::new();
    storage.add_file("/a", b"");
    storage.add_file("/b", b"");
    let d = dispatcher(&storage);

    let err = d.rename(&path("/a"), "b").unwrap_err();
    assert!(matches!(err, FsError::NoSpace { .. }));
    assert_eq!(err.to_errno(), libc::ENOSPC);

    storage.refuse_renames();
    assert_eq!(
        d.rename(&path("/a"), "c").unwrap_err().to_errno(),
        libc::ENOSPC
    );
    assert!(storage.exists("/a"));
}

// ============================================================================
// Unsupported metadata changes
// ============================================================================

#[test]
fn test_chmod_and_chown_are_ignored() {
    let storage = MemoryStorage::new();
    storage.add_file("/f", b"");
    let d = dispatcher(&storage);

    assert_eq!(d.chmod(&path("/f"), 0o600), Outcome::Ignored);
    assert_eq!(d.chown(&path("/f"), Some(0), Some(0)), Outcome::Ignored);
    assert_eq!(storage.total_calls(), 0);
    assert_eq!(storage.permission("/f").unwrap().bits(), 0o644);
}

#[test]
fn test_truncate_to_zero_recreates() {
    let storage = MemoryStorage::new();
    storage.add_file("/f", b"old contents");
    let d = dispatcher(&storage);

    assert_eq!(d.truncate(&path("/f"), 0).unwrap(), Outcome::Applied);

    assert!(storage.contents("/f").unwrap().is_empty());
    assert_eq!(storage.permission("/f").unwrap().bits(), 0o644);
    assert_eq!(d.get_attributes(&path("/f")).unwrap().size, 0);
}

#[test]
fn test_truncate_to_zero_keeps_special_bits() {
    let storage = MemoryStorage::new();
    storage.add_file("/shared", b"scratch");
    storage.set_permission("/shared", 0o3775);
    let d = dispatcher(&storage);

    assert_eq!(d.truncate(&path("/shared"), 0).unwrap(), Outcome::Applied);

    assert_eq!(storage.permission("/shared").unwrap().bits(), 0o3775);
    assert_eq!(d.get_attributes(&path("/shared")).unwrap().permissions(), 0o3775);
}

#[test]
fn test_truncate_to_current_size_is_ignored() {
    let storage = MemoryStorage::new();
    storage.add_file("/f", b"12345");
    let d = dispatcher(&storage);

    assert_eq!(d.truncate(&path("/f"), 5).unwrap(), Outcome::Ignored);
    assert_eq!(storage.calls(Op::Create), 0);
}

#[test]
fn test_truncate_to_other_size_is_not_supported() {
    let storage = MemoryStorage::new();
    storage.add_file("/f", b"12345");
    let d = dispatcher(&storage);

    assert_eq!(
        d.truncate(&path("/f"), 2).unwrap_err().to_errno(),
        libc::ENOTSUP
    );
    assert_eq!(storage.contents("/f").unwrap(), b"12345");
}

#[test]
fn test_cache_statistics_track_hits() {
    let storage = MemoryStorage::new();
    storage.add_file("/f", b"");
    let d = dispatcher(&storage);

    d.get_attributes(&path("/f")).unwrap();
    d.get_attributes(&path("/f")).unwrap();
    d.get_attributes(&path("/f")).unwrap();

    let stats = d.cache().stats();
    assert_eq!(stats.attributes.hit_count(), 2);
    assert_eq!(stats.attributes.miss_count(), 1);
}
