//! Owner and group name resolution.
//!
//! HDFS reports ownership by name. The mount maps those names to local
//! numeric ids through the system account database, falling back to the
//! conventional unprivileged accounts when a name is unknown locally.
//! Resolution never fails and every answer is memoized for the life of the
//! process.

use dashmap::DashMap;
use nix::unistd::{Group, User};

/// Local user used for owners the system does not know.
pub const FALLBACK_USER: &str = "nobody";

/// Group names tried, in order, after the requested group.
pub const FALLBACK_GROUPS: [&str; 2] = ["nogroup", "nobody"];

/// Source of name to id mappings.
pub trait AccountLookup {
    /// Numeric uid of a user, if the name exists.
    fn uid_of(&self, name: &str) -> Option<u32>;

    /// Numeric gid of a group, if the name exists.
    fn gid_of(&self, name: &str) -> Option<u32>;
}

/// The host's account database (`getpwnam_r` / `getgrnam_r`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAccounts;

impl AccountLookup for SystemAccounts {
    fn uid_of(&self, name: &str) -> Option<u32> {
        match User::from_name(name) {
            Ok(user) => user.map(|u| u.uid.as_raw()),
            Err(e) => {
                tracing::debug!(name, error = %e, "User lookup failed");
                None
            }
        }
    }

    fn gid_of(&self, name: &str) -> Option<u32> {
        match Group::from_name(name) {
            Ok(group) => group.map(|g| g.gid.as_raw()),
            Err(e) => {
                tracing::debug!(name, error = %e, "Group lookup failed");
                None
            }
        }
    }
}

/// Memoizing owner/group resolver.
///
/// ```
/// use webhdfs_mount::identity::IdentityResolver;
///
/// let resolver = IdentityResolver::system();
/// assert_eq!(resolver.owner_to_uid("root"), 0);
/// ```
pub struct IdentityResolver<A = SystemAccounts> {
    accounts: A,
    uids: DashMap<String, u32>,
    gids: DashMap<String, u32>,
}

impl IdentityResolver<SystemAccounts> {
    /// Resolver backed by the host's account database.
    pub fn system() -> Self {
        Self::new(SystemAccounts)
    }
}

impl<A: AccountLookup> IdentityResolver<A> {
    /// Resolver backed by `accounts`.
    pub fn new(accounts: A) -> Self {
        Self {
            accounts,
            uids: DashMap::new(),
            gids: DashMap::new(),
        }
    }

    /// Numeric uid for an HDFS owner name.
    ///
    /// Unknown names map to the uid of `nobody`, or 0 if that does not exist either.
    pub fn owner_to_uid(&self, name: &str) -> u32 {
        if let Some(uid) = self.uids.get(name) {
            return *uid;
        }
        let uid = self
            .accounts
            .uid_of(name)
            .or_else(|| self.accounts.uid_of(FALLBACK_USER))
            .unwrap_or(0);
        self.uids.insert(name.to_string(), uid);
        uid
    }

    /// Numeric gid for an HDFS group name.
    ///
    /// Tries the name itself, then `nogroup`, then `nobody`, then 0.
    pub fn group_to_gid(&self, name: &str) -> u32 {
        if let Some(gid) = self.gids.get(name) {
            return *gid;
        }
        let gid = std::iter::once(name)
            .chain(FALLBACK_GROUPS)
            .find_map(|candidate| self.accounts.gid_of(candidate))
            .unwrap_or(0);
        self.gids.insert(name.to_string(), gid);
        gid
    }

    /// Number of memoized owner and group names.
    pub fn memo_sizes(&self) -> (usize, usize) {
        (self.uids.len(), self.gids.len())
    }
}
