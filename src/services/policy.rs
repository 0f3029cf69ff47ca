use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use crate::constants::env as env_keys;
use crate::services::logger::Logger;
use crate::utils::feature_flags::is_flag_enabled;

/// A set of profile ids, or the unrestricted marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSet {
    All,
    Only(BTreeSet<String>),
}

impl ProfileSet {
    pub fn none() -> Self {
        ProfileSet::Only(BTreeSet::new())
    }

    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProfileSet::Only(ids.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, profile_id: &str) -> bool {
        match self {
            ProfileSet::All => true,
            ProfileSet::Only(ids) => ids.contains(profile_id),
        }
    }

    pub fn union(&self, other: &ProfileSet) -> ProfileSet {
        match (self, other) {
            (ProfileSet::All, _) | (_, ProfileSet::All) => ProfileSet::All,
            (ProfileSet::Only(a), ProfileSet::Only(b)) => {
                ProfileSet::Only(a.union(b).cloned().collect())
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            ProfileSet::All => "ALL".to_string(),
            ProfileSet::Only(ids) => {
                let quoted: Vec<String> = ids.iter().map(|id| format!("'{}'", id)).collect();
                format!("[{}]", quoted.join(", "))
            }
        }
    }
}

/// Parses a comma-separated profile list.
///
/// Unset or blank input is unrestricted, as is `ALL`. `NONE` is an explicit
/// empty set. Items are trimmed and empty items dropped.
pub fn parse_profile_list(raw: Option<&str>) -> ProfileSet {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return ProfileSet::All;
    };
    if raw.eq_ignore_ascii_case("ALL") {
        return ProfileSet::All;
    }
    if raw.eq_ignore_ascii_case("NONE") {
        return ProfileSet::none();
    }
    ProfileSet::only(
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty()),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicyConfig {
    pub readable: ProfileSet,
    pub writable: ProfileSet,
    pub read_only: bool,
}

impl Default for AccessPolicyConfig {
    fn default() -> Self {
        Self {
            readable: ProfileSet::All,
            writable: ProfileSet::All,
            read_only: false,
        }
    }
}

impl AccessPolicyConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            readable: parse_profile_list(lookup(env_keys::READABLE_PROFILES).as_deref()),
            writable: parse_profile_list(lookup(env_keys::WRITABLE_PROFILES).as_deref()),
            read_only: is_flag_enabled(&lookup, env_keys::READ_ONLY),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl AccessKind {
    pub fn for_method(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "POST" | "PUT" | "PATCH" | "DELETE" => AccessKind::Write,
            _ => AccessKind::Read,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    ReadOnlyMode,
    WriteDenied(String),
    ReadDenied(String),
}

impl DenialReason {
    pub fn message(&self) -> String {
        match self {
            DenialReason::ReadOnlyMode => {
                "Write operation denied: server is in read-only mode".to_string()
            }
            DenialReason::WriteDenied(id) => format!("Write access denied for profile: {}", id),
            DenialReason::ReadDenied(id) => format!("Read access denied for profile: {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(DenialReason),
}

/// Decisions derived from an [`AccessPolicyConfig`]. Immutable; a reload
/// builds a new one.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    config: AccessPolicyConfig,
    writable: ProfileSet,
    readable: ProfileSet,
}

impl AccessPolicy {
    pub fn new(config: AccessPolicyConfig) -> Self {
        let writable = if config.read_only {
            ProfileSet::none()
        } else {
            config.writable.clone()
        };
        let readable = match &config.readable {
            ProfileSet::All => ProfileSet::All,
            restricted => restricted.union(&writable),
        };
        Self {
            config,
            writable,
            readable,
        }
    }

    pub fn effective_writable(&self) -> &ProfileSet {
        &self.writable
    }

    pub fn effective_readable(&self) -> &ProfileSet {
        &self.readable
    }

    pub fn can_read(&self, profile_id: &str) -> bool {
        self.readable.contains(profile_id)
    }

    pub fn can_write(&self, profile_id: &str) -> bool {
        !self.config.read_only && self.writable.contains(profile_id)
    }

    pub fn check(&self, profile_id: &str, kind: AccessKind) -> AccessDecision {
        match kind {
            AccessKind::Write if self.config.read_only => {
                AccessDecision::Denied(DenialReason::ReadOnlyMode)
            }
            AccessKind::Write if !self.can_write(profile_id) => {
                AccessDecision::Denied(DenialReason::WriteDenied(profile_id.to_string()))
            }
            AccessKind::Read if !self.can_read(profile_id) => {
                AccessDecision::Denied(DenialReason::ReadDenied(profile_id.to_string()))
            }
            _ => AccessDecision::Allowed,
        }
    }

    pub fn log_summary(&self, logger: &Logger) {
        if self.config.read_only {
            logger.info(
                "Read-only mode is ENABLED - all write operations are disabled",
                None,
            );
        }
        match &self.readable {
            ProfileSet::All => logger.info("All profiles are readable (no restrictions)", None),
            readable => logger.info(
                &format!("Readable profiles restricted to: {}", readable.describe()),
                None,
            ),
        }
        if self.config.read_only {
            return;
        }
        match &self.writable {
            ProfileSet::All => logger.info("All profiles are writable (no restrictions)", None),
            writable => logger.info(
                &format!("Writable profiles restricted to: {}", writable.describe()),
                None,
            ),
        }
    }
}

/// Shared, swappable reference to the current policy. Readers take a
/// snapshot `Arc`; a reload replaces the reference without touching the old
/// policy, so calls already in flight keep the one they started with.
#[derive(Debug, Clone)]
pub struct PolicyHandle {
    current: Arc<RwLock<Arc<AccessPolicy>>>,
}

impl PolicyHandle {
    pub fn new(policy: AccessPolicy) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(policy))),
        }
    }

    pub fn snapshot(&self) -> Arc<AccessPolicy> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, policy: AccessPolicy) -> Arc<AccessPolicy> {
        let next = Arc::new(policy);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }
}
