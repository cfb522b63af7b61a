//! Method-table resolver.
//!
//! Flattens an interface's single-inheritance chain into the ordered slot
//! list that both interop directions must agree on: ancestor methods first
//! (root to leaf), each level's methods in declaration order. The index of
//! a method in the flattened table equals its offset in the native function
//! table, which is why resolution must be deterministic and is memoized.
//!
//! The `#[com_interface]` macro produces the same layout statically by
//! embedding the base vtable struct as the first field; the resolver is the
//! runtime source of truth for slot numbering and lets callers cross-check
//! the two (see [`FlatMethodTable::len`] vs `VTableLayout::SLOT_COUNT`).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::trace;

use crate::com::ComInterface;
use crate::descriptor::{InterfaceDescriptor, MethodSig};

/// One entry of a flattened method table.
#[derive(Debug, Clone, Copy)]
pub struct MethodSlot {
    /// Slot offset in the native function table
    pub index: usize,
    /// Name of the interface that declared this method
    pub declared_by: &'static str,
    /// The method signature summary
    pub sig: &'static MethodSig,
}

/// Flattened, index-stable method table for one interface.
///
/// Slot 0-2 are always the root lifetime methods; each descendant
/// interface's methods follow in declaration order. Never reordered once
/// built: repeated resolution returns the identical `&'static` table.
pub struct FlatMethodTable {
    interface: &'static str,
    slots: Vec<MethodSlot>,
}

impl FlatMethodTable {
    /// Name of the interface this table was resolved for.
    #[must_use]
    pub fn interface_name(&self) -> &'static str {
        self.interface
    }

    /// Total number of slots (sum of own-method counts across the chain).
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&MethodSlot> {
        self.slots.get(index)
    }

    /// Slot offset of the method named `name`, if the chain declares it.
    #[must_use]
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .find(|slot| slot.sig.name == name)
            .map(|slot| slot.index)
    }

    /// Iterate over slots in table order.
    pub fn iter(&self) -> impl Iterator<Item = &MethodSlot> {
        self.slots.iter()
    }
}

impl std::fmt::Debug for FlatMethodTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatMethodTable")
            .field("interface", &self.interface)
            .field("slots", &self.slots.len())
            .finish()
    }
}

/// Memoized tables keyed by descriptor address, guarded for concurrent
/// first use so a table is only ever built once per interface.
static TABLES: Lazy<Mutex<HashMap<usize, &'static FlatMethodTable>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Resolve the flattened method table for interface `I`.
#[must_use]
pub fn resolve<I: ComInterface>() -> &'static FlatMethodTable {
    resolve_descriptor(I::descriptor())
}

/// Resolve the flattened method table for a descriptor.
///
/// Walks the ancestor chain root-first and concatenates each level's own
/// methods in declaration order. Deterministic: the same descriptor always
/// yields the same table, returned by reference identity on cache hits.
#[must_use]
pub fn resolve_descriptor(desc: &'static InterfaceDescriptor) -> &'static FlatMethodTable {
    let key = desc as *const InterfaceDescriptor as usize;
    let mut tables = TABLES.lock();
    if let Some(&cached) = tables.get(&key) {
        return cached;
    }

    let mut slots = Vec::new();
    for level in desc.lineage() {
        for sig in level.methods {
            slots.push(MethodSlot {
                index: slots.len(),
                declared_by: level.name,
                sig,
            });
        }
    }
    trace!(
        interface = desc.name,
        slots = slots.len(),
        "resolved method table"
    );

    let leaked: &'static FlatMethodTable = Box::leak(Box::new(FlatMethodTable {
        interface: desc.name,
        slots,
    }));
    tables.insert(key, leaked);
    leaked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::com::GUID;

    static ROOT: InterfaceDescriptor = InterfaceDescriptor {
        name: "IRoot",
        iid: GUID::new(0xA000_0000, 0, 0, [0; 8]),
        methods: &[
            MethodSig {
                name: "query_interface",
                arity: 2,
            },
            MethodSig {
                name: "add_ref",
                arity: 0,
            },
            MethodSig {
                name: "release",
                arity: 0,
            },
        ],
        base: None,
    };

    static STREAM: InterfaceDescriptor = InterfaceDescriptor {
        name: "IStream",
        iid: GUID::new(0xB000_0000, 0, 0, [0; 8]),
        methods: &[
            MethodSig {
                name: "read",
                arity: 2,
            },
            MethodSig {
                name: "write",
                arity: 2,
            },
        ],
        base: Some(|| &ROOT),
    };

    static SEEKABLE: InterfaceDescriptor = InterfaceDescriptor {
        name: "ISeekableStream",
        iid: GUID::new(0xC000_0000, 0, 0, [0; 8]),
        methods: &[MethodSig {
            name: "seek",
            arity: 1,
        }],
        base: Some(|| &STREAM),
    };

    #[test]
    fn slots_are_root_first_in_declaration_order() {
        let table = resolve_descriptor(&SEEKABLE);
        assert_eq!(table.len(), 6);
        let names: Vec<_> = table.iter().map(|s| s.sig.name).collect();
        assert_eq!(
            names,
            ["query_interface", "add_ref", "release", "read", "write", "seek"]
        );
        // Each level occupies a contiguous run right after its base
        assert_eq!(table.get(0).unwrap().declared_by, "IRoot");
        assert_eq!(table.get(2).unwrap().declared_by, "IRoot");
        assert_eq!(table.get(3).unwrap().declared_by, "IStream");
        assert_eq!(table.get(5).unwrap().declared_by, "ISeekableStream");
        // Slot indices equal positions
        for (position, slot) in table.iter().enumerate() {
            assert_eq!(slot.index, position);
        }
    }

    #[test]
    fn base_table_is_a_prefix_of_the_derived_table() {
        let base = resolve_descriptor(&STREAM);
        let derived = resolve_descriptor(&SEEKABLE);
        assert_eq!(base.len(), 5);
        for (slot, derived_slot) in base.iter().zip(derived.iter()) {
            assert_eq!(slot.sig.name, derived_slot.sig.name);
            assert_eq!(slot.index, derived_slot.index);
        }
    }

    #[test]
    fn resolution_is_deterministic_and_cached() {
        let first = resolve_descriptor(&SEEKABLE);
        let second = resolve_descriptor(&SEEKABLE);
        assert!(std::ptr::eq(first, second));
        let first_names: Vec<_> = first.iter().map(|s| s.sig.name).collect();
        let second_names: Vec<_> = second.iter().map(|s| s.sig.name).collect();
        assert_eq!(first_names, second_names);
    }

    #[test]
    fn slot_lookup_by_name() {
        let table = resolve_descriptor(&SEEKABLE);
        assert_eq!(table.slot_of("query_interface"), Some(0));
        assert_eq!(table.slot_of("write"), Some(4));
        assert_eq!(table.slot_of("seek"), Some(5));
        assert_eq!(table.slot_of("flush"), None);
    }

    #[test]
    fn root_table_is_just_the_lifetime_methods() {
        let table = resolve_descriptor(&ROOT);
        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
        assert_eq!(table.interface_name(), "IRoot");
    }
}
