//! Interface descriptor registry.
//!
//! Every `#[com_interface]` interface gets a static [`InterfaceDescriptor`]
//! recording its GUID, its own methods in declaration order, and a link to
//! its base descriptor. The single-inheritance chain always terminates at
//! the root `IUnknown` descriptor.
//!
//! The full set of GUIDs an interface satisfies (its own plus every
//! ancestor's) is computed on first use and memoized process-wide; both
//! `QueryInterface` directions rely on this set being stable.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::trace;

use crate::com::GUID;

/// Signature summary for one interface method: enough to name a slot and
/// sanity-check table agreement, not a full type description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSig {
    /// Method name as declared on the interface
    pub name: &'static str,
    /// Number of explicit arguments (excluding the implicit object pointer)
    pub arity: usize,
}

/// Static identity record for one interface type.
///
/// Descriptors are emitted once per interface by `#[com_interface]`, so two
/// lookups for the same interface always return the same `&'static`
/// reference; cache hits are observable by pointer identity.
pub struct InterfaceDescriptor {
    /// Interface name, for diagnostics
    pub name: &'static str,
    /// The interface's own GUID
    pub iid: GUID,
    /// Methods declared by this interface itself (base methods excluded),
    /// in declaration order
    pub methods: &'static [MethodSig],
    /// Accessor for the base interface's descriptor; `None` only for the root
    pub base: Option<fn() -> &'static InterfaceDescriptor>,
}

/// Memoized per-descriptor GUID sets, guarded for concurrent first use.
static IID_SETS: Lazy<Mutex<HashMap<usize, &'static [GUID]>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

impl InterfaceDescriptor {
    /// Descriptor of the base interface, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&'static InterfaceDescriptor> {
        self.base.map(|base| base())
    }

    /// True for the root interface descriptor.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.base.is_none()
    }

    /// Number of ancestors above this interface (0 for the root).
    #[must_use]
    pub fn depth(&'static self) -> usize {
        self.lineage().len() - 1
    }

    /// Ancestor chain ordered root-first, ending with this interface.
    #[must_use]
    pub fn lineage(&'static self) -> Vec<&'static InterfaceDescriptor> {
        let mut chain = Vec::new();
        let mut cursor = Some(self);
        while let Some(desc) = cursor {
            chain.push(desc);
            cursor = desc.parent();
        }
        chain.reverse();
        chain
    }

    /// The full set of GUIDs this interface satisfies: its own IID plus
    /// every ancestor's, leaf-first. Computed once and cached.
    #[must_use]
    pub fn satisfied_iids(&'static self) -> &'static [GUID] {
        let key = self as *const InterfaceDescriptor as usize;
        let mut sets = IID_SETS.lock();
        if let Some(&cached) = sets.get(&key) {
            return cached;
        }

        let mut iids = Vec::new();
        let mut cursor = Some(self);
        while let Some(desc) = cursor {
            iids.push(desc.iid);
            cursor = desc.parent();
        }
        trace!(interface = self.name, count = iids.len(), "computed IID set");
        let leaked: &'static [GUID] = Box::leak(iids.into_boxed_slice());
        sets.insert(key, leaked);
        leaked
    }

    /// Whether a `QueryInterface` for `riid` should succeed on this
    /// interface. Byte-exact GUID comparison against the cached set.
    #[must_use]
    pub fn satisfies(&'static self, riid: &GUID) -> bool {
        self.satisfied_iids().contains(riid)
    }
}

impl std::fmt::Debug for InterfaceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceDescriptor")
            .field("name", &self.name)
            .field("iid", &self.iid)
            .field("methods", &self.methods.len())
            .field("base", &self.parent().map(|p| p.name))
            .finish()
    }
}
