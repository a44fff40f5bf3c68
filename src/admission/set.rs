//! # All-or-nothing admission across named gates.
//!
//! An [`AdmissionSet`] guards one action with a collection of named
//! [`KeyedSemaphore`]s. A request runs only if **every** gate admits it.
//!
//! ## Architecture
//! ```text
//! try_acquire_all(ctx, payload)
//!     │
//!     ├──► gate ""      (global)   key = ""              ─► try_acquire
//!     ├──► gate "tenant"           key = key_fn(payload) ─► try_acquire
//!     └──► gate "user"             key = key_fn(payload) ─► try_acquire
//!              │
//!              ├─ all admit   → Ok(AdmissionPermit)  (remembers every (gate, key))
//!              └─ one denies  → release gates acquired so far, Err(AdmissionDenied)
//! ```
//!
//! ## Rules
//! - Gates are visited in group-name order (`""` first), the same order on every call.
//! - A denied call leaves the total held-slot count unchanged.
//! - A set with no gates always grants ([`AdmissionSet::is_unrestricted`]).
//! - The permit releases each gate exactly once, on [`AdmissionPermit::release`] or on drop.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::key_fn::KeyFnRef;
use super::keyed::KeyedSemaphore;

/// Name of the reserved global group.
pub const GLOBAL_GROUP: &str = "";

/// One gate of an admission set.
struct Gate<P> {
    semaphore: Arc<KeyedSemaphore>,
    key_fn: Option<KeyFnRef<P>>,
}

impl<P> Gate<P>
where
    P: Send + Sync + 'static,
{
    fn key(&self, ctx: &CancellationToken, payload: &P) -> String {
        match &self.key_fn {
            Some(f) => f.key(ctx, payload),
            None => String::new(),
        }
    }
}

/// Named collection of gates that must all admit before an action runs.
pub struct AdmissionSet<P> {
    gates: BTreeMap<String, Gate<P>>,
}

impl<P> AdmissionSet<P>
where
    P: Send + Sync + 'static,
{
    /// Creates an empty (unrestricted) set.
    pub fn new() -> Self {
        Self {
            gates: BTreeMap::new(),
        }
    }

    /// Installs or replaces the global gate: `capacity` holders in total, no partitioning.
    pub fn add_global_limit(&mut self, capacity: usize) {
        self.add_group(GLOBAL_GROUP, capacity, None);
    }

    /// Installs or replaces the gate named `name`.
    ///
    /// Without a key function every payload maps to the same implicit key, so the
    /// group behaves like a global limit tracked independently under `name`.
    pub fn add_group(
        &mut self,
        name: impl Into<String>,
        capacity: usize,
        key_fn: Option<KeyFnRef<P>>,
    ) {
        self.gates.insert(
            name.into(),
            Gate {
                semaphore: Arc::new(KeyedSemaphore::new(capacity)),
                key_fn,
            },
        );
    }

    /// Returns `true` if no gate is configured, i.e. every request is granted.
    #[inline]
    pub fn is_unrestricted(&self) -> bool {
        self.gates.is_empty()
    }

    /// Returns the number of configured gates.
    #[inline]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Returns `true` if no gate is configured.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Returns the configured group names in visiting order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.gates.keys().map(String::as_str)
    }

    /// Returns the gate for `name`, if configured.
    pub fn group(&self, name: &str) -> Option<&KeyedSemaphore> {
        self.gates.get(name).map(|g| g.semaphore.as_ref())
    }

    /// Returns the number of slots currently held across every gate.
    pub fn total_held(&self) -> usize {
        self.gates.values().map(|g| g.semaphore.total_held()).sum()
    }

    /// Tries to acquire every gate for this request.
    ///
    /// On the first denial, gates acquired earlier in this call are released and
    /// the denying group and key are returned. Never blocks.
    pub fn try_acquire_all(
        &self,
        ctx: &CancellationToken,
        payload: &P,
    ) -> Result<AdmissionPermit, AdmissionDenied> {
        if self.gates.is_empty() {
            return Ok(AdmissionPermit::unrestricted());
        }

        let mut permit = AdmissionPermit::with_capacity(self.gates.len());
        for (name, gate) in &self.gates {
            let key = gate.key(ctx, payload);
            if !gate.semaphore.try_acquire(&key) {
                permit.release();
                return Err(AdmissionDenied {
                    group: name.clone(),
                    key,
                });
            }
            permit.held.push((Arc::clone(&gate.semaphore), key));
        }
        Ok(permit)
    }
}

impl<P> Default for AdmissionSet<P>
where
    P: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for AdmissionSet<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (name, gate) in &self.gates {
            map.entry(name, &gate.semaphore.capacity());
        }
        map.finish()
    }
}

/// Which gate refused a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("admission denied by group '{group}' for key '{key}'")]
pub struct AdmissionDenied {
    /// Name of the denying group (`""` for the global limit).
    pub group: String,
    /// Partition key the request mapped to in that group.
    pub key: String,
}

/// Proof of admission: the slots held for one running request.
///
/// Releasing is idempotent; each gate is released at most once no matter how
/// often [`release`](Self::release) is called. Dropping the permit releases it.
#[must_use = "dropping the permit releases the admission immediately"]
pub struct AdmissionPermit {
    held: Vec<(Arc<KeyedSemaphore>, String)>,
    released: AtomicBool,
}

impl AdmissionPermit {
    /// A permit holding nothing (granted by an unrestricted set).
    pub fn unrestricted() -> Self {
        Self::with_capacity(0)
    }

    fn with_capacity(n: usize) -> Self {
        Self {
            held: Vec::with_capacity(n),
            released: AtomicBool::new(false),
        }
    }

    /// Moves every slot held by `other` into this permit.
    pub fn absorb(&mut self, mut other: AdmissionPermit) {
        self.held.append(&mut other.held);
    }

    /// Number of gates this permit holds a slot in.
    pub fn held_gates(&self) -> usize {
        self.held.len()
    }

    /// Returns `true` once the permit has been released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Releases every held slot exactly once; later calls are no-ops.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        for (semaphore, key) in self.held.iter().rev() {
            semaphore.release(key);
        }
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for AdmissionPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionPermit")
            .field("held_gates", &self.held.len())
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_user() -> Option<KeyFnRef<(&'static str, &'static str)>> {
        Some(Arc::new(
            |_: &CancellationToken, p: &(&'static str, &'static str)| p.0.to_string(),
        ))
    }

    fn by_kind() -> Option<KeyFnRef<(&'static str, &'static str)>> {
        Some(Arc::new(
            |_: &CancellationToken, p: &(&'static str, &'static str)| p.1.to_string(),
        ))
    }

    #[test]
    fn global_limit_is_shared_by_all_payloads() {
        let ctx = CancellationToken::new();
        let mut set = AdmissionSet::<&'static str>::new();
        set.add_global_limit(2);

        let p1 = set.try_acquire_all(&ctx, &"data1").unwrap();
        let p2 = set.try_acquire_all(&ctx, &"data2").unwrap();
        let denied = set.try_acquire_all(&ctx, &"data3").unwrap_err();
        assert_eq!(denied.group, GLOBAL_GROUP);

        p1.release();
        p2.release();
        assert!(set.try_acquire_all(&ctx, &"data4").is_ok());
    }

    #[test]
    fn keyed_group_partitions_by_payload() {
        let ctx = CancellationToken::new();
        let mut set = AdmissionSet::new();
        set.add_group("user", 1, by_user());

        let _u1 = set.try_acquire_all(&ctx, &("u1", "a")).unwrap();
        let denied = set.try_acquire_all(&ctx, &("u1", "b")).unwrap_err();
        assert_eq!(
            denied,
            AdmissionDenied {
                group: "user".into(),
                key: "u1".into()
            }
        );
        assert!(set.try_acquire_all(&ctx, &("u2", "a")).is_ok());
    }

    #[test]
    fn group_without_key_fn_is_tracked_apart_from_global() {
        let ctx = CancellationToken::new();
        let mut set = AdmissionSet::<()>::new();
        set.add_group("single", 1, None);

        let held = set.try_acquire_all(&ctx, &()).unwrap();
        assert!(set.try_acquire_all(&ctx, &()).is_err());
        assert!(set.group(GLOBAL_GROUP).is_none());
        assert_eq!(set.group("single").map(|g| g.held("")), Some(1));
        drop(held);
        assert_eq!(set.total_held(), 0);
    }

    #[test]
    fn empty_set_always_grants() {
        let ctx = CancellationToken::new();
        let set = AdmissionSet::<()>::new();
        assert!(set.is_unrestricted());
        for _ in 0..100 {
            let permit = set.try_acquire_all(&ctx, &()).unwrap();
            assert_eq!(permit.held_gates(), 0);
            drop(permit);
        }
    }

    #[test]
    fn zero_capacity_group_denies_everything() {
        let ctx = CancellationToken::new();
        let mut set = AdmissionSet::new();
        set.add_group("blocked", 0, by_user());
        assert!(!set.is_unrestricted());
        assert!(set.try_acquire_all(&ctx, &("u1", "a")).is_err());
    }

    #[test]
    fn denial_rolls_back_partial_acquisition() {
        let ctx = CancellationToken::new();
        let mut set = AdmissionSet::new();
        // "kind" is visited before "user".
        set.add_group("kind", 1, by_kind());
        set.add_group("user", 2, by_user());

        let _first = set.try_acquire_all(&ctx, &("u1", "report")).unwrap();
        let before = set.total_held();

        // "kind" admits (different kind), "user" admits, so this one runs.
        let _second = set.try_acquire_all(&ctx, &("u1", "export")).unwrap();
        assert_eq!(set.total_held(), before + 2);

        // "kind" admits ("import" is free), "user" denies (u1 already has 2).
        let before = set.total_held();
        let denied = set.try_acquire_all(&ctx, &("u1", "import")).unwrap_err();
        assert_eq!(denied.group, "user");
        assert_eq!(set.total_held(), before);
        assert_eq!(set.group("kind").map(|g| g.held("import")), Some(0));
    }

    #[test]
    fn release_is_idempotent() {
        let ctx = CancellationToken::new();
        let mut set = AdmissionSet::<()>::new();
        set.add_global_limit(1);

        let permit = set.try_acquire_all(&ctx, &()).unwrap();
        let other = {
            permit.release();
            set.try_acquire_all(&ctx, &()).unwrap()
        };

        // A second release of the first permit must not free `other`'s slot.
        permit.release();
        drop(permit);
        assert_eq!(other.held_gates(), 1);
        assert!(!other.is_released());
        assert!(set.try_acquire_all(&ctx, &()).is_err());
    }

    #[test]
    fn absorbed_permit_is_released_with_its_owner() {
        let ctx = CancellationToken::new();
        let mut a = AdmissionSet::<()>::new();
        a.add_global_limit(1);
        let mut b = AdmissionSet::<()>::new();
        b.add_group("engine", 1, None);

        let mut permit = a.try_acquire_all(&ctx, &()).unwrap();
        permit.absorb(b.try_acquire_all(&ctx, &()).unwrap());
        assert_eq!(permit.held_gates(), 2);
        assert_eq!(a.total_held() + b.total_held(), 2);

        drop(permit);
        assert_eq!(a.total_held() + b.total_held(), 0);
    }
}
