//! The runtime method-table resolver against macro-generated interfaces:
//! the flattened slot order must match the static vtable layout exactly.

use combridge::proc::com_interface;
use combridge::{resolve, ComInterface, IUnknown, VTableLayout};

#[com_interface("3d7f1a92-58c4-4e06-b21d-9a6e03f5c871")]
pub trait IList {
    fn count(&self) -> usize;
    fn item(&self, index: usize) -> *mut std::ffi::c_void;
}

#[com_interface("6b2e9c04-d135-47fa-8e60-2c58b1a7f493", extends(IList))]
pub trait ISortedList {
    fn find(&self, key: u64) -> usize;
    fn insert_sorted(&self, key: u64) -> usize;
}

#[test]
fn resolved_order_is_ancestors_first_declaration_order() {
    let table = resolve::<ISortedList>();
    let names: Vec<_> = table.iter().map(|s| s.sig.name).collect();
    assert_eq!(
        names,
        [
            "query_interface",
            "add_ref",
            "release",
            "count",
            "item",
            "find",
            "insert_sorted"
        ]
    );
}

#[test]
fn resolved_length_matches_static_slot_count() {
    assert_eq!(
        resolve::<IUnknown>().len(),
        <IUnknown as VTableLayout>::SLOT_COUNT
    );
    assert_eq!(resolve::<IList>().len(), <IList as VTableLayout>::SLOT_COUNT);
    assert_eq!(
        resolve::<ISortedList>().len(),
        <ISortedList as VTableLayout>::SLOT_COUNT
    );
}

#[test]
fn base_table_is_a_prefix() {
    let base = resolve::<IList>();
    let derived = resolve::<ISortedList>();
    for (b, d) in base.iter().zip(derived.iter()) {
        assert_eq!(b.index, d.index);
        assert_eq!(b.sig.name, d.sig.name);
        assert_eq!(b.declared_by, d.declared_by);
    }
}

#[test]
fn declaring_interface_is_tracked_per_slot() {
    let table = resolve::<ISortedList>();
    assert_eq!(table.get(0).unwrap().declared_by, "IUnknown");
    assert_eq!(table.get(3).unwrap().declared_by, "IList");
    assert_eq!(table.get(6).unwrap().declared_by, "ISortedList");
}

#[test]
fn repeated_resolution_returns_the_same_table() {
    let first = resolve::<ISortedList>();
    let second = resolve::<ISortedList>();
    assert!(std::ptr::eq(first, second));
    // Resolving through the descriptor hits the same cache entry
    let via_descriptor = combridge::resolve_descriptor(ISortedList::descriptor());
    assert!(std::ptr::eq(first, via_descriptor));
}

#[test]
fn slot_lookup_by_name() {
    let table = resolve::<ISortedList>();
    assert_eq!(table.slot_of("release"), Some(2));
    assert_eq!(table.slot_of("item"), Some(4));
    assert_eq!(table.slot_of("insert_sorted"), Some(6));
    assert_eq!(table.slot_of("remove"), None);
    assert_eq!(table.interface_name(), "ISortedList");
}
