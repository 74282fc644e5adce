//! Process-wide record of whether the extended codec set is present.
//!
//! The registry is probed lazily on first use and cached. Readers take a
//! [`Capability`] snapshot; writers ([`reinitialize`], [`install`]) replace
//! the snapshot under a write lock, so concurrent first use never observes
//! a half-written entry.

use std::fmt;
use std::sync::{PoisonError, RwLock};

/// A `(major, minor, patch)` version triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub const fn as_tuple(self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<(u32, u32, u32)> for Version {
    fn from((major, minor, patch): (u32, u32, u32)) -> Self {
        Self::new(major, minor, patch)
    }
}

/// One registry entry.
///
/// `version` is `None` exactly when `available` is false; a missing version
/// means the extended codecs are absent, never "version unknown".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Capability {
    available: bool,
    version: Option<Version>,
}

impl Capability {
    pub const fn available(version: Version) -> Self {
        Self {
            available: true,
            version: Some(version),
        }
    }

    pub const fn unavailable() -> Self {
        Self {
            available: false,
            version: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Whether this snapshot meets `required`.
    pub fn satisfies(&self, required: Version) -> bool {
        self.version.is_some_and(|v| v >= required)
    }

    /// `Ok` if `required` is met, otherwise `CapabilityUnavailable`.
    pub(crate) fn require(
        &self,
        required: Version,
        operation: &'static str,
    ) -> Result<(), crate::SurfaceError> {
        if self.satisfies(required) {
            Ok(())
        } else {
            Err(crate::SurfaceError::CapabilityUnavailable {
                operation,
                required,
                available: self.version,
            })
        }
    }
}

/// Minimum extended version for any extended operation.
pub const EXTENDED_MIN_VERSION: Version = Version::new(0, 1, 0);

/// Minimum extended version for decoding animations.
pub const ANIMATION_MIN_VERSION: Version = Version::new(0, 1, 0);

/// Minimum extended version for sized vector decoding.
pub const SIZED_VECTOR_MIN_VERSION: Version = Version::new(0, 1, 0);

static REGISTRY: RwLock<Option<Capability>> = RwLock::new(None);

/// Probe for the extended codec set.
///
/// The extended decoders are compiled in with the `extended` feature; the
/// reported version is this crate's version.
fn probe() -> Capability {
    if !cfg!(feature = "extended") {
        return Capability::unavailable();
    }
    let part = |s: &str| s.parse::<u32>().unwrap_or(0);
    Capability::available(Version::new(
        part(env!("CARGO_PKG_VERSION_MAJOR")),
        part(env!("CARGO_PKG_VERSION_MINOR")),
        part(env!("CARGO_PKG_VERSION_PATCH")),
    ))
}

fn log_entry(cap: &Capability, event: &str) {
    tracing::info!(
        available = cap.available,
        version = ?cap.version.map(Version::as_tuple),
        "extended codec capability {event}"
    );
}

/// Initialize the registry if needed and return the cached entry.
///
/// Idempotent: only the first call probes.
pub fn initialize() -> Capability {
    if let Some(cap) = *REGISTRY.read().unwrap_or_else(PoisonError::into_inner) {
        return cap;
    }
    let mut slot = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    // Another thread may have won the race between the two locks.
    if let Some(cap) = *slot {
        return cap;
    }
    let cap = probe();
    log_entry(&cap, "initialized");
    *slot = Some(cap);
    cap
}

/// Re-probe and replace the cached entry.
pub fn reinitialize() -> Capability {
    let cap = probe();
    *REGISTRY.write().unwrap_or_else(PoisonError::into_inner) = Some(cap);
    log_entry(&cap, "reinitialized");
    cap
}

/// Replace the cached entry with `cap`, e.g. after a plugin load or unload.
pub fn install(cap: Capability) {
    *REGISTRY.write().unwrap_or_else(PoisonError::into_inner) = Some(cap);
    log_entry(&cap, "installed");
}

/// Current snapshot, initializing on first use.
pub fn snapshot() -> Capability {
    initialize()
}

pub fn is_extended_available() -> bool {
    snapshot().is_available()
}

/// Extended codec version, `None` when unavailable.
pub fn extended_version() -> Option<Version> {
    snapshot().version()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering() {
        assert!(Version::new(1, 0, 0) > Version::new(0, 9, 9));
        assert!(Version::new(0, 2, 0) > Version::new(0, 1, 7));
        assert_eq!(Version::new(2, 0, 1).to_string(), "2.0.1");
    }

    #[test]
    fn unavailable_never_satisfies() {
        let cap = Capability::unavailable();
        assert!(!cap.satisfies(Version::new(0, 0, 0)));
        assert_eq!(cap.version(), None);
        let err = cap.require(Version::new(0, 1, 0), "test").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::CapabilityUnavailable);
    }

    #[test]
    fn available_below_requirement() {
        let cap = Capability::available(Version::new(0, 1, 0));
        assert!(cap.satisfies(Version::new(0, 1, 0)));
        assert!(!cap.satisfies(Version::new(0, 2, 0)));
    }

    #[test]
    fn probe_matches_feature() {
        let cap = probe();
        assert_eq!(cap.is_available(), cfg!(feature = "extended"));
        assert_eq!(cap.version().is_some(), cap.is_available());
    }
}
