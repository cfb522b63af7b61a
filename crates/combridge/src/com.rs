//! Core COM-style ABI types: GUIDs, HRESULTs, and the root `IUnknown`
//! interface every other interface chains up to.
//!
//! ## Key Types
//! - [`GUID`] - 128-bit globally unique identifier for interfaces
//! - [`HRESULT`] - 32-bit result code crossing the boundary unchanged
//! - [`IUnknownVTable`] - base function table for all interfaces
//! - [`RefCount`] - plain (non-atomic) per-object reference counter

use std::cell::Cell;
use std::ffi::c_void;

use crate::descriptor::{InterfaceDescriptor, MethodSig};

// =============================================================================
// GUID - Globally Unique Identifier
// =============================================================================

/// 128-bit globally unique identifier (GUID/UUID/IID).
///
/// Used for interface identification. Format: `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}`.
/// The field split (one u32, two u16, eight u8) matches the native library's
/// identifiers, so comparisons are byte-exact.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GUID {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl GUID {
    /// Create a new GUID from components
    #[must_use]
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// The nil/zero GUID
    pub const ZERO: GUID = GUID::new(0, 0, 0, [0; 8]);
}

impl std::fmt::Debug for GUID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7]
        )
    }
}

impl std::fmt::Display for GUID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7]
        )
    }
}

// =============================================================================
// HRESULT - result codes
// =============================================================================

/// COM-style result type. 0 (`S_OK`) indicates success, negative values indicate errors.
pub type HRESULT = i32;

/// Success
pub const S_OK: HRESULT = 0;
/// Success, but returned false
pub const S_FALSE: HRESULT = 1;
/// No such interface supported
pub const E_NOINTERFACE: HRESULT = 0x8000_4002_u32 as i32;
/// Invalid pointer
pub const E_POINTER: HRESULT = 0x8000_4003_u32 as i32;
/// Unspecified failure
pub const E_FAIL: HRESULT = 0x8000_4005_u32 as i32;
/// Out of memory
pub const E_OUTOFMEMORY: HRESULT = 0x8007_000E_u32 as i32;
/// Invalid argument
pub const E_INVALIDARG: HRESULT = 0x8007_0057_u32 as i32;
/// Not implemented
pub const E_NOTIMPL: HRESULT = 0x8000_4001_u32 as i32;

/// Check if an HRESULT indicates success (non-negative)
#[inline]
#[must_use]
pub const fn succeeded(hr: HRESULT) -> bool {
    hr >= 0
}

/// Check if an HRESULT indicates failure (negative)
#[inline]
#[must_use]
pub const fn failed(hr: HRESULT) -> bool {
    hr < 0
}

/// Severity bit of an HRESULT (1 = failure)
#[inline]
#[must_use]
pub const fn severity(hr: HRESULT) -> u32 {
    (hr as u32) >> 31
}

/// 15-bit facility field of an HRESULT
#[inline]
#[must_use]
pub const fn facility(hr: HRESULT) -> u32 {
    ((hr as u32) >> 16) & 0x7FFF
}

/// Low 16-bit code field of an HRESULT
#[inline]
#[must_use]
pub const fn code(hr: HRESULT) -> u32 {
    (hr as u32) & 0xFFFF
}

/// Assemble an HRESULT from severity, facility, and code fields
#[inline]
#[must_use]
pub const fn make_hresult(is_failure: bool, facility: u32, code: u32) -> HRESULT {
    let sev = if is_failure { 1u32 << 31 } else { 0 };
    (sev | ((facility & 0x7FFF) << 16) | (code & 0xFFFF)) as i32
}

// =============================================================================
// ComError - Rust-facing error surface
// =============================================================================

/// Rust-side view of a failed bridge operation.
///
/// Contract violations at construction time (null pointers, released
/// exposures) surface here immediately; failures reported by a native call
/// keep their raw [`HRESULT`] in [`ComError::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ComError {
    /// `QueryInterface` reported the interface is not supported.
    #[error("no such interface: {0:?}")]
    NoInterface(GUID),
    /// A null pointer was passed where a valid object pointer is required.
    #[error("null interface pointer")]
    NullPointer,
    /// The exposure's reference count already returned to zero.
    #[error("exposure already released")]
    Released,
    /// A native call returned a failure code other than `E_NOINTERFACE`.
    #[error("call failed with HRESULT {0:#010X}")]
    Failed(HRESULT),
}

/// Convert an [`HRESULT`] into a `Result`, passing the code through unchanged.
#[inline]
pub fn check(hr: HRESULT) -> Result<HRESULT, ComError> {
    if failed(hr) {
        Err(ComError::Failed(hr))
    } else {
        Ok(hr)
    }
}

// =============================================================================
// VTableLayout / ComInterface - traits implemented by generated interfaces
// =============================================================================

/// Trait describing the flattened function-table layout of an interface.
///
/// Automatically implemented by `#[com_interface]`. `SLOT_COUNT` is the total
/// number of slots including every ancestor's methods.
pub trait VTableLayout {
    /// Total number of vtable slots (base slots + own slots)
    const SLOT_COUNT: usize;
    /// The vtable struct type
    type VTable: 'static;
}

/// Trait for interface types with a GUID identity and a descriptor.
///
/// Automatically implemented by `#[com_interface]`.
pub trait ComInterface: VTableLayout + 'static {
    /// The interface ID (IID) for this interface.
    const IID: GUID;

    /// Static descriptor for this interface: its GUID, its own methods in
    /// declaration order, and a link to the base descriptor.
    fn descriptor() -> &'static InterfaceDescriptor;
}

// =============================================================================
// IUnknown - root interface
// =============================================================================

/// IUnknown interface ID
pub const IID_IUNKNOWN: GUID = GUID::new(
    0x00000000,
    0x0000,
    0x0000,
    [0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46],
);

/// Base function table shared by every interface.
///
/// Slots 0-2 of any interface's table are always these three lifetime
/// methods; the native platform's C calling convention is used throughout,
/// with the object pointer as the implicit first argument.
#[repr(C)]
pub struct IUnknownVTable {
    pub query_interface: unsafe extern "C" fn(
        this: *mut c_void,
        riid: *const GUID,
        ppv: *mut *mut c_void,
    ) -> HRESULT,
    pub add_ref: unsafe extern "C" fn(this: *mut c_void) -> u32,
    pub release: unsafe extern "C" fn(this: *mut c_void) -> u32,
}

/// Root interface wrapper: a view over any object whose first machine word
/// points at an [`IUnknownVTable`]-prefixed function table.
#[repr(C)]
pub struct IUnknown {
    vtable: *const IUnknownVTable,
}

impl IUnknown {
    /// Get the interface ID (GUID) for this interface
    #[inline]
    #[must_use]
    pub const fn iid() -> &'static GUID {
        &IID_IUNKNOWN
    }

    /// Get the vtable
    #[inline]
    #[must_use]
    pub fn vtable(&self) -> &IUnknownVTable {
        unsafe { &*self.vtable }
    }

    /// Wrap a raw object pointer for calling methods.
    ///
    /// # Safety
    /// - `ptr` must point to a valid object whose first word is a pointer to
    ///   an `IUnknownVTable`-prefixed function table
    /// - The returned reference must not outlive the underlying object
    #[inline]
    pub unsafe fn from_ptr<'a>(ptr: *mut c_void) -> &'a Self {
        unsafe { &*(ptr as *const Self) }
    }

    /// Wrap a raw object pointer for calling methods (mutable).
    ///
    /// # Safety
    /// - Same as [`IUnknown::from_ptr`], and no other references to the
    ///   object may exist concurrently
    #[inline]
    pub unsafe fn from_ptr_mut<'a>(ptr: *mut c_void) -> &'a mut Self {
        unsafe { &mut *(ptr as *mut Self) }
    }

    /// Query for another interface by GUID (slot 0).
    ///
    /// # Safety
    /// - `riid` must point to a valid GUID
    /// - `ppv` must point to a valid, writable pointer location
    #[inline]
    pub unsafe fn query_interface(&self, riid: *const GUID, ppv: *mut *mut c_void) -> HRESULT {
        unsafe { ((*self.vtable).query_interface)(self as *const Self as *mut c_void, riid, ppv) }
    }

    /// Increment the reference count (slot 1). Returns the new count.
    ///
    /// # Safety
    /// The object behind this wrapper must still be alive.
    #[inline]
    pub unsafe fn add_ref(&self) -> u32 {
        unsafe { ((*self.vtable).add_ref)(self as *const Self as *mut c_void) }
    }

    /// Decrement the reference count (slot 2). Returns the new count.
    ///
    /// # Safety
    /// The object behind this wrapper must still be alive; after the count
    /// reaches zero the wrapper must not be used again.
    #[inline]
    pub unsafe fn release(&self) -> u32 {
        unsafe { ((*self.vtable).release)(self as *const Self as *mut c_void) }
    }
}

impl VTableLayout for IUnknown {
    const SLOT_COUNT: usize = 3;
    type VTable = IUnknownVTable;
}

static IUNKNOWN_DESCRIPTOR: InterfaceDescriptor = InterfaceDescriptor {
    name: "IUnknown",
    iid: IID_IUNKNOWN,
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

impl ComInterface for IUnknown {
    const IID: GUID = IID_IUNKNOWN;

    fn descriptor() -> &'static InterfaceDescriptor {
        &IUNKNOWN_DESCRIPTOR
    }
}

// =============================================================================
// RefCount - per-object reference counter
// =============================================================================

/// Plain reference counter for boundary objects.
///
/// Deliberately not atomic: the wrapped native library is single-threaded
/// and the counter is never shared across threads. Starts at zero (the
/// unreferenced state); the owner of the counter performs teardown when it
/// returns to zero.
#[repr(transparent)]
pub struct RefCount(Cell<u32>);

impl RefCount {
    /// Create a new reference counter with count = 0
    #[must_use]
    pub const fn new() -> Self {
        Self(Cell::new(0))
    }

    /// Increment the reference count. Returns the new count.
    #[inline]
    pub fn increment(&self) -> u32 {
        let count = self.0.get() + 1;
        self.0.set(count);
        count
    }

    /// Decrement the reference count. Returns the new count.
    ///
    /// Decrementing past zero is a caller bug: it trips a debug assertion
    /// and saturates at zero in release builds.
    #[inline]
    pub fn decrement(&self) -> u32 {
        let count = self.0.get();
        debug_assert!(count > 0, "over-release: reference count underflow");
        let count = count.saturating_sub(1);
        self.0.set(count);
        count
    }

    /// Get the current reference count.
    #[inline]
    #[must_use]
    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}
