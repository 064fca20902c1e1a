use serde::{Deserialize, Serialize};

pub const WILDCARD: &str = "*";

/// Permissions is a bitmask of capabilities carried by an API key.
/// All bits set is the wildcard and grants every capability, including
/// ones added after the key was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(u32);

impl Permissions {
    pub const STORAGE_READ: Permissions = Permissions(1 << 0); // 1
    pub const STORAGE_WRITE: Permissions = Permissions(1 << 1); // 2
    pub const KEYS_MANAGE: Permissions = Permissions(1 << 2); // 4
    pub const ALL: Permissions = Permissions(u32::MAX);

    const NAMED: [(Permissions, &'static str); 3] = [
        (Self::STORAGE_READ, "storage:read"),
        (Self::STORAGE_WRITE, "storage:write"),
        (Self::KEYS_MANAGE, "keys:manage"),
    ];

    #[must_use]
    pub const fn is_wildcard(self) -> bool {
        self.0 == u32::MAX
    }

    /// Returns true if this set contains every bit of `required`.
    #[must_use]
    pub const fn has(self, required: Permissions) -> bool {
        self.0 & required.0 == required.0
    }

    /// Returns the capability strings for this bitmask; the wildcard is `["*"]`.
    #[must_use]
    pub fn to_strings(self) -> Vec<&'static str> {
        if self.is_wildcard() {
            return vec![WILDCARD];
        }
        Self::NAMED
            .iter()
            .filter(|(perm, _)| self.has(*perm))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Name of a single capability, used in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        Self::NAMED
            .iter()
            .find(|(perm, _)| *perm == self)
            .map(|(_, name)| *name)
            .unwrap_or(WILDCARD)
    }
}

impl From<i64> for Permissions {
    fn from(bits: i64) -> Self {
        Self(bits as u32)
    }
}

impl From<Permissions> for i64 {
    fn from(p: Permissions) -> Self {
        i64::from(p.0)
    }
}
