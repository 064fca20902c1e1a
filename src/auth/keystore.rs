use std::sync::Arc;

use chrono::Utc;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use super::key::{generate_secret, is_well_formed};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{ApiKey, Identity, Permissions};

const MAX_KEY_NAME_LEN: usize = 100;
const MIN_REVOKE_PREFIX_LEN: usize = 6;

/// Issues, validates and revokes API keys.
///
/// Secrets are stored and compared verbatim. The master credential is held
/// here, never in the store, and always resolves to `Identity::admin()`.
pub struct KeyStore {
    store: Arc<dyn Store>,
    master_key: String,
}

impl KeyStore {
    pub fn new(store: Arc<dyn Store>, master_key: impl Into<String>) -> Self {
        Self {
            store,
            master_key: master_key.into(),
        }
    }

    /// Mints a key owned by `owner`. The returned record is the only place
    /// the full secret is ever handed out.
    pub fn issue(&self, owner: &Identity, name: &str) -> Result<ApiKey> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::BadRequest("Name is required".to_string()));
        }
        if name.len() > MAX_KEY_NAME_LEN {
            return Err(Error::BadRequest(format!(
                "Name cannot exceed {MAX_KEY_NAME_LEN} characters"
            )));
        }

        let key = ApiKey {
            secret: generate_secret(),
            owner_id: owner.user_id.clone(),
            owner_email: owner.email.clone(),
            owner_name: owner.display_name.clone(),
            name: name.to_string(),
            permissions: Permissions::ALL,
            created_at: Utc::now(),
            last_used_at: None,
        };

        self.store.create_api_key(&key)?;

        info!(owner = %key.owner_id, key = %key.preview(), "issued API key");
        Ok(key)
    }

    /// Resolves a raw credential to the identity it stands for.
    pub fn validate(&self, secret: &str) -> Result<Identity> {
        if !self.master_key.is_empty()
            && bool::from(secret.as_bytes().ct_eq(self.master_key.as_bytes()))
        {
            return Ok(Identity::admin());
        }

        if !is_well_formed(secret) {
            return Err(Error::InvalidCredential);
        }

        let key = self
            .store
            .get_api_key(secret)?
            .ok_or(Error::InvalidCredential)?;

        if let Err(e) = self.store.update_api_key_last_used(&key.secret) {
            warn!("Failed to update API key last_used_at: {e}");
        }

        Ok(key.identity())
    }

    /// Returns true if `identity` may perform an operation needing `required`.
    #[must_use]
    pub fn authorize(identity: &Identity, required: Permissions) -> bool {
        identity.is_admin || identity.permissions.has(required)
    }

    pub fn require(identity: &Identity, required: Permissions) -> Result<()> {
        if Self::authorize(identity, required) {
            Ok(())
        } else {
            Err(Error::MissingCapability(required.name()))
        }
    }

    /// Keys visible to `caller`: every key for the admin, otherwise only the
    /// caller's own.
    pub fn list(&self, caller: &Identity) -> Result<Vec<ApiKey>> {
        let owner = (!caller.is_admin).then_some(caller.user_id.as_str());
        self.store.list_api_keys(owner)
    }

    /// Revokes the single key whose secret starts with `prefix`.
    ///
    /// Non-admin callers only match their own keys. Naming another owner's
    /// key is Forbidden only when the full secret is supplied; any shorter
    /// prefix reads as NotFound.
    ///
    /// `current_secret` is the credential authenticating this call; revoking
    /// it is rejected.
    pub fn revoke(&self, caller: &Identity, current_secret: &str, prefix: &str) -> Result<ApiKey> {
        let prefix = prefix.trim().trim_end_matches("...");
        if prefix.len() < MIN_REVOKE_PREFIX_LEN {
            return Err(Error::BadRequest(format!(
                "Key prefix must be at least {MIN_REVOKE_PREFIX_LEN} characters"
            )));
        }

        let owner = (!caller.is_admin).then_some(caller.user_id.as_str());
        let mut matches = self.store.find_api_keys_by_prefix(prefix, owner)?;

        let target = match matches.len() {
            0 => {
                if owner.is_some() && self.store.get_api_key(prefix)?.is_some() {
                    return Err(Error::Forbidden);
                }
                return Err(Error::NotFound("API key"));
            }
            1 => matches.remove(0),
            _ => {
                return Err(Error::BadRequest(
                    "Key prefix is ambiguous; supply more characters".to_string(),
                ));
            }
        };

        if target.secret == current_secret {
            return Err(Error::BadRequest(
                "Cannot revoke the key used to authenticate this request".to_string(),
            ));
        }

        if !self.store.delete_api_key(&target.secret)? {
            return Err(Error::NotFound("API key"));
        }

        info!(owner = %target.owner_id, key = %target.preview(), "revoked API key");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::SqliteStore;

    const MASTER: &str = "master-secret";

    fn keystore() -> KeyStore {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        KeyStore::new(Arc::new(store), MASTER)
    }

    fn user(id: &str) -> Identity {
        Identity::user(id, Some(format!("{id}@example.com")))
    }

    #[test]
    fn test_master_credential_is_admin() {
        let keys = keystore();
        let identity = keys.validate(MASTER).unwrap();
        assert!(identity.is_admin);
        assert!(keys.list(&identity).unwrap().is_empty());
    }

    #[test]
    fn test_master_credential_must_match_exactly() {
        let keys = keystore();
        for near in ["master-secre", "master-secret ", "Master-secret", "master-secrez"] {
            assert!(matches!(keys.validate(near), Err(Error::InvalidCredential)));
        }
    }

    #[test]
    fn test_empty_master_key_never_matches() {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        let keys = KeyStore::new(Arc::new(store), "");
        assert!(matches!(keys.validate(""), Err(Error::InvalidCredential)));
    }

    #[test]
    fn test_issue_binds_key_to_issuer() {
        let keys = keystore();
        let key = keys.issue(&user("u1"), "laptop").unwrap();

        assert_eq!(key.owner_id, "u1");
        assert!(key.permissions.is_wildcard());

        let identity = keys.validate(&key.secret).unwrap();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.email.as_deref(), Some("u1@example.com"));
        assert!(!identity.is_admin);
    }

    #[test]
    fn test_issue_requires_name() {
        let keys = keystore();
        let err = keys.issue(&user("u1"), "   ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_validate_unknown_key() {
        let keys = keystore();
        let unknown = generate_secret();
        assert!(matches!(
            keys.validate(&unknown),
            Err(Error::InvalidCredential)
        ));
        assert!(matches!(keys.validate("garbage"), Err(Error::InvalidCredential)));
    }

    #[test]
    fn test_validate_refreshes_last_used() {
        let keys = keystore();
        let key = keys.issue(&user("u1"), "ci").unwrap();
        assert!(key.last_used_at.is_none());

        keys.validate(&key.secret).unwrap();
        let listed = keys.list(&user("u1")).unwrap();
        assert!(listed[0].last_used_at.is_some());
    }

    #[test]
    fn test_authorize() {
        let mut limited = user("u1");
        limited.permissions = Permissions::STORAGE_READ;

        assert!(KeyStore::authorize(&limited, Permissions::STORAGE_READ));
        assert!(!KeyStore::authorize(&limited, Permissions::STORAGE_WRITE));
        assert!(KeyStore::authorize(&user("u1"), Permissions::KEYS_MANAGE));

        let mut admin = Identity::admin();
        admin.permissions = Permissions::default();
        assert!(KeyStore::authorize(&admin, Permissions::STORAGE_WRITE));

        let err = KeyStore::require(&limited, Permissions::STORAGE_WRITE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_list_is_owner_scoped() {
        let keys = keystore();
        keys.issue(&user("u1"), "a").unwrap();
        keys.issue(&user("u1"), "b").unwrap();
        keys.issue(&user("u2"), "c").unwrap();

        assert_eq!(keys.list(&user("u1")).unwrap().len(), 2);
        assert_eq!(keys.list(&user("u2")).unwrap().len(), 1);
        assert_eq!(keys.list(&Identity::admin()).unwrap().len(), 3);
    }

    #[test]
    fn test_revoke_by_prefix() {
        let keys = keystore();
        let current = keys.issue(&user("u1"), "current").unwrap();
        let other = keys.issue(&user("u1"), "other").unwrap();

        let revoked = keys
            .revoke(&user("u1"), &current.secret, &other.secret[..20])
            .unwrap();
        assert_eq!(revoked.name, "other");
        assert!(matches!(
            keys.validate(&other.secret),
            Err(Error::InvalidCredential)
        ));
    }

    #[test]
    fn test_revoke_accepts_preview() {
        let keys = keystore();
        let current = keys.issue(&user("u1"), "current").unwrap();
        let other = keys.issue(&user("u1"), "other").unwrap();

        let revoked = keys
            .revoke(&user("u1"), &current.secret, &other.preview())
            .unwrap();
        assert_eq!(revoked.secret, other.secret);
    }

    #[test]
    fn test_revoke_self_rejected() {
        let keys = keystore();
        let current = keys.issue(&user("u1"), "current").unwrap();

        let err = keys
            .revoke(&user("u1"), &current.secret, &current.secret)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(keys.validate(&current.secret).is_ok());
    }

    #[test]
    fn test_revoke_other_owner_forbidden() {
        let keys = keystore();
        let mine = keys.issue(&user("u1"), "mine").unwrap();
        let theirs = keys.issue(&user("u2"), "theirs").unwrap();

        let err = keys
            .revoke(&user("u1"), &mine.secret, &theirs.secret)
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden));
        assert!(keys.validate(&theirs.secret).is_ok());

        keys.revoke(&Identity::admin(), MASTER, &theirs.secret)
            .unwrap();
        assert!(keys.validate(&theirs.secret).is_err());
    }

    #[test]
    fn test_revoke_other_owner_prefix_reads_as_missing() {
        let keys = keystore();
        let mine = keys.issue(&user("u1"), "mine").unwrap();
        let theirs = keys.issue(&user("u2"), "theirs").unwrap();

        for len in [6, 8, 10, 40, theirs.secret.len() - 1] {
            let err = keys
                .revoke(&user("u1"), &mine.secret, &theirs.secret[..len])
                .unwrap_err();
            assert!(matches!(err, Error::NotFound(_)), "prefix of {len} chars: {err:?}");
        }
        assert!(keys.validate(&theirs.secret).is_ok());
    }

    #[test]
    fn test_revoke_prefix_only_counts_own_keys() {
        let keys = keystore();
        let mine = keys.issue(&user("u1"), "mine").unwrap();
        for (secret, owner) in [("cx_shared111", "u1"), ("cx_shared222", "u2")] {
            keys.store
                .create_api_key(&ApiKey {
                    secret: secret.to_string(),
                    owner_id: owner.to_string(),
                    owner_email: None,
                    owner_name: None,
                    name: "crafted".to_string(),
                    permissions: Permissions::ALL,
                    created_at: Utc::now(),
                    last_used_at: None,
                })
                .unwrap();
        }

        let revoked = keys
            .revoke(&user("u1"), &mine.secret, "cx_shared")
            .unwrap();
        assert_eq!(revoked.secret, "cx_shared111");

        let err = keys
            .revoke(&user("u1"), &mine.secret, "cx_shared")
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(keys.list(&user("u2")).unwrap().len(), 1);
    }

    #[test]
    fn test_revoke_missing_and_short_prefix() {
        let keys = keystore();
        let current = keys.issue(&user("u1"), "current").unwrap();

        let err = keys
            .revoke(&user("u1"), &current.secret, "cx_zzzzzz")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = keys.revoke(&user("u1"), &current.secret, "cx_").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
