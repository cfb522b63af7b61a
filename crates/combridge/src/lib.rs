//! COM-style ABI bridge for Rust
//!
//! This crate lets Rust interoperate bidirectionally with a native,
//! C-style virtual-dispatch object model: interfaces identified by 128-bit
//! GUIDs, single-inheritance chains flattened into a contiguous
//! function-pointer table, manual `AddRef`/`Release` counting, and
//! `QueryInterface`-style dynamic casting.
//!
//! ## Calling into native objects
//! ```ignore
//! use combridge::proc::com_interface;
//!
//! #[com_interface("12345678-1234-1234-1234-123456789abc")]
//! pub trait IBlob {
//!     fn buffer_size(&self) -> usize;
//! }
//!
//! let blob: ComPtr<IBlob> = unsafe { ComPtr::from_raw(native_ptr)? };
//! let size = unsafe { blob.buffer_size() };
//! ```
//!
//! ## Exposing Rust objects to native code
//! ```ignore
//! use combridge::proc::com_implement;
//!
//! #[com_implement(IBlob)]
//! impl MemoryBlob {
//!     fn buffer_size(&self) -> usize { self.bytes.len() }
//! }
//!
//! let exposure = Exposure::<IBlob, MemoryBlob>::new(blob);
//! exposure.add_ref();                 // allocates the native-visible record
//! let ptr = exposure.record_ptr();    // first word = function-table pointer
//! ```
//!
//! Both directions are generated at compile time, once per interface;
//! the slot order is the flattened ancestor-then-self order that
//! [`table::resolve`] computes, so the two sides always agree on indices.

pub mod com;
pub mod descriptor;
pub mod expose;
pub mod proxy;
pub mod table;

/// Proc-macro attributes - re-exports from the combridge-macro crate
pub mod proc {
    pub use combridge_macro::{com_implement, com_interface};
}

pub use com::{
    check, code, facility, failed, make_hresult, severity, succeeded, ComError, ComInterface,
    IUnknown, IUnknownVTable, RefCount, VTableLayout, E_FAIL, E_INVALIDARG, E_NOINTERFACE,
    E_NOTIMPL, E_OUTOFMEMORY, E_POINTER, GUID, HRESULT, IID_IUNKNOWN, S_FALSE, S_OK,
};
pub use descriptor::{InterfaceDescriptor, MethodSig};
pub use expose::{ExposeAs, Exposure};
pub use proxy::ComPtr;
pub use table::{resolve, resolve_descriptor, FlatMethodTable, MethodSlot};

// Re-export paste for use by the generated forwarder macros
#[doc(hidden)]
pub use paste::paste;
