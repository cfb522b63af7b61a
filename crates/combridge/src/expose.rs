//! Exposing Rust objects to native callers.
//!
//! An exposed object is published as an [`ExposureRecord`]: a two-word,
//! `#[repr(C)]` allocation whose first word is the function-table pointer
//! and whose second word is an opaque handle back to the Rust side. Native
//! code treats the record's address exactly like one of its own object
//! pointers; the generated thunks recover the Rust object through the
//! handle, never through field offsets.
//!
//! Lifetime follows the reference count and nothing else:
//!
//! - count 0 (unreferenced): no record allocated, no pin held
//! - `add_ref` on the 0 -> 1 edge allocates the record and pins the shared
//!   cell by leaking a clone of its `Rc` behind the handle
//! - `release` back to 0 frees the record and drops the pin, exactly once;
//!   the exposure is then terminal
//!
//! Over-release and post-release `add_ref` are caller bugs: they trip debug
//! assertions and are no-ops returning 0 in release builds.

use std::cell::{Cell, UnsafeCell};
use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr;
use std::rc::Rc;

use tracing::trace;

use crate::com::{ComError, ComInterface, GUID, HRESULT, RefCount, E_NOINTERFACE, E_POINTER, S_OK};
use crate::descriptor::InterfaceDescriptor;
use crate::proxy::ComPtr;

/// Trait connecting an implementation type to the static function table
/// built for it by `#[com_implement]`.
///
/// # Safety
/// The returned vtable's thunks must forward every slot of `I`'s flattened
/// table into `Self`, and must only ever be installed in records whose
/// handle points at an `ExposureShared<Self>`.
pub unsafe trait ExposeAs<I: ComInterface> {
    /// Static function table whose thunks forward into this type.
    fn exposed_vtable() -> &'static I::VTable;
}

/// Native-visible record: first word = table pointer, second word = opaque
/// handle. Bit-compatible with the native library's own object layout.
#[repr(C)]
pub struct ExposureRecord {
    vtable: *const c_void,
    handle: *const ExposureHead,
}

/// Type-erased prefix of [`ExposureShared`]. The lifetime thunks only ever
/// touch this header, so they are shared by every exposure regardless of
/// the concrete object type.
#[repr(C)]
pub struct ExposureHead {
    refs: RefCount,
    released: Cell<bool>,
    record: Cell<*mut ExposureRecord>,
    descriptor: &'static InterfaceDescriptor,
    vtable: *const c_void,
    drop_pin: unsafe fn(*const ExposureHead),
}

/// The pinned cell: header first (so the handle doubles as a header
/// pointer), then the exposed object itself. The object sits behind an
/// `UnsafeCell`: native callers mutate it through thunk-held `&mut`
/// references while the cell is shared via `Rc`.
#[repr(C)]
pub struct ExposureShared<T> {
    head: ExposureHead,
    value: UnsafeCell<T>,
}

/// A Rust object published to native code behind interface `I`.
///
/// Holds the shared cell alive for direct Rust-side access independent of
/// the native reference count; the count alone governs the native-visible
/// record and the pin.
pub struct Exposure<I: ComInterface, T: ExposeAs<I>> {
    shared: Rc<ExposureShared<T>>,
    _interface: PhantomData<fn() -> I>,
}

impl<I: ComInterface, T: ExposeAs<I>> Exposure<I, T> {
    /// Wrap `value` for exposure behind interface `I`.
    ///
    /// No native-visible memory is allocated yet; that happens on the first
    /// [`Exposure::add_ref`]. A type that does not implement the interface
    /// chain fails the `ExposeAs` bound at compile time, before any
    /// allocation can occur.
    #[must_use]
    pub fn new(value: T) -> Self {
        let vtable =
            <T as ExposeAs<I>>::exposed_vtable() as *const I::VTable as *const c_void;
        let shared = Rc::new(ExposureShared {
            head: ExposureHead {
                refs: RefCount::new(),
                released: Cell::new(false),
                record: Cell::new(ptr::null_mut()),
                descriptor: I::descriptor(),
                vtable,
                drop_pin: drop_pin::<T>,
            },
            value: UnsafeCell::new(value),
        });
        Self {
            shared,
            _interface: PhantomData,
        }
    }

    /// Increment the external reference count, allocating the record and
    /// the pin on the 0 -> 1 transition. Returns the new count.
    pub fn add_ref(&self) -> u32 {
        let head = &self.shared.head;
        if head.released.get() {
            debug_assert!(false, "add_ref on released exposure");
            return 0;
        }
        if head.refs.get() == 0 {
            let pin = Rc::into_raw(Rc::clone(&self.shared)) as *const ExposureHead;
            let record = Box::into_raw(Box::new(ExposureRecord {
                vtable: head.vtable,
                handle: pin,
            }));
            head.record.set(record);
            trace!(
                interface = head.descriptor.name,
                "allocated exposure record"
            );
        }
        head.refs.increment()
    }

    /// Decrement the external reference count; reaching 0 frees the record
    /// and drops the pin exactly once. Returns the new count.
    pub fn release(&self) -> u32 {
        unsafe { head_release(&self.shared.head as *const ExposureHead) }
    }

    /// Current external reference count.
    #[must_use]
    pub fn ref_count(&self) -> u32 {
        self.shared.head.refs.get()
    }

    /// True once the count has returned to zero and teardown has run.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.shared.head.released.get()
    }

    /// The exposed object, for direct Rust-side calls.
    ///
    /// Native calls into the same object may mutate it, so the reference
    /// must not be held across a call through the record.
    #[must_use]
    pub fn object(&self) -> &T {
        // No thunk-held &mut is live here: thunk borrows end with the
        // forwarded call and the model is single-threaded.
        unsafe { &*self.shared.value.get() }
    }

    /// Address native code should use as the object pointer. Null while
    /// the exposure is unreferenced or after final release; the record is
    /// valid exactly as long as the count is positive.
    #[must_use]
    pub fn record_ptr(&self) -> *mut c_void {
        self.shared.head.record.get() as *mut c_void
    }

    /// Take a counted native-side reference and wrap it in a [`ComPtr`].
    ///
    /// The returned pointer releases its reference on drop, so the
    /// round trip `acquire` -> call -> drop leaves the count unchanged.
    pub fn acquire(&self) -> Result<ComPtr<I>, ComError> {
        if self.is_released() {
            return Err(ComError::Released);
        }
        self.add_ref();
        // Record exists now; from_raw adopts the reference just taken.
        unsafe { ComPtr::from_raw(self.record_ptr()) }
    }
}

/// Drops the pinning `Rc` clone leaked on the 0 -> 1 transition. Stored as
/// a function pointer in the header so teardown can run type-erased.
unsafe fn drop_pin<T>(head: *const ExposureHead) {
    unsafe {
        drop(Rc::from_raw(head as *const ExposureShared<T>));
    }
}

unsafe fn head_add_ref(head: *const ExposureHead) -> u32 {
    let head = unsafe { &*head };
    if head.released.get() {
        debug_assert!(false, "add_ref on released exposure");
        return 0;
    }
    head.refs.increment()
}

unsafe fn head_release(head_ptr: *const ExposureHead) -> u32 {
    let head = unsafe { &*head_ptr };
    if head.released.get() || head.refs.get() == 0 {
        debug_assert!(false, "over-release of exposed object");
        return 0;
    }
    let refs = head.refs.decrement();
    if refs == 0 {
        unsafe { teardown(head_ptr) };
    }
    refs
}

/// Runs exactly once, on the edge where the count returns to zero: frees
/// the record allocation and releases the pin. The header may be gone once
/// the pin drops, so everything needed is read out first.
unsafe fn teardown(head_ptr: *const ExposureHead) {
    let head = unsafe { &*head_ptr };
    head.released.set(true);
    let record = head.record.replace(ptr::null_mut());
    let drop_pin = head.drop_pin;
    trace!(interface = head.descriptor.name, "exposure teardown");
    unsafe {
        if !record.is_null() {
            drop(Box::from_raw(record));
        }
        drop_pin(head_ptr);
    }
}

unsafe fn head_of(this: *mut c_void) -> *const ExposureHead {
    unsafe { (*(this as *const ExposureRecord)).handle }
}

/// Recover the exposed object from a record pointer.
///
/// # Safety
/// `this` must be a live [`ExposureRecord`] whose handle points at an
/// `ExposureShared<T>` for exactly this `T`. Used by generated thunks.
#[doc(hidden)]
pub unsafe fn exposed_object_ptr<T>(this: *mut c_void) -> *mut T {
    unsafe {
        let shared = head_of(this) as *const ExposureShared<T>;
        (*shared).value.get()
    }
}

// =============================================================================
// Shared lifetime thunks (slots 0-2 of every exposed object's table)
// =============================================================================

/// Slot 0: answer for the exposed interface's own GUID or any ancestor's
/// GUID with the same record pointer; `E_NOINTERFACE` otherwise, leaving
/// the reference count unchanged.
///
/// # Safety
/// `this` must be a live [`ExposureRecord`] pointer.
pub unsafe extern "C" fn query_interface_thunk(
    this: *mut c_void,
    riid: *const GUID,
    ppv: *mut *mut c_void,
) -> HRESULT {
    unsafe {
        if ppv.is_null() {
            return E_POINTER;
        }
        if riid.is_null() {
            *ppv = ptr::null_mut();
            return E_POINTER;
        }
        let head = &*head_of(this);
        let requested = *riid;
        if head.descriptor.satisfies(&requested) {
            head_add_ref(head as *const ExposureHead);
            *ppv = this;
            S_OK
        } else {
            trace!(
                interface = head.descriptor.name,
                riid = %requested,
                "query_interface miss"
            );
            *ppv = ptr::null_mut();
            E_NOINTERFACE
        }
    }
}

/// Slot 1: increment the exposure's reference count.
///
/// # Safety
/// `this` must be a live [`ExposureRecord`] pointer.
pub unsafe extern "C" fn add_ref_thunk(this: *mut c_void) -> u32 {
    unsafe { head_add_ref(head_of(this)) }
}

/// Slot 2: decrement the exposure's reference count, tearing down on the
/// final release. The record must not be used again once this returns 0.
///
/// # Safety
/// `this` must be a live [`ExposureRecord`] pointer.
pub unsafe extern "C" fn release_thunk(this: *mut c_void) -> u32 {
    unsafe { head_release(head_of(this)) }
}

// =============================================================================
// Root-level chaining macros used by #[com_implement]
// =============================================================================

/// Forwarders for the root interface: nothing to generate, the lifetime
/// thunks are shared library functions rather than per-struct wrappers.
#[macro_export]
macro_rules! iunknown_forwarders {
    ($struct_name:ident, $struct_type:ty, $interface_name:ident) => {};
}

/// Base vtable initializer for the root interface: installs the shared
/// lifetime thunks at slots 0-2.
#[macro_export]
macro_rules! iunknown_base_vtable {
    ($struct_name:ident, $interface_name:ident) => {
        $crate::IUnknownVTable {
            query_interface: $crate::expose::query_interface_thunk,
            add_ref: $crate::expose::add_ref_thunk,
            release: $crate::expose::release_thunk,
        }
    };
}
