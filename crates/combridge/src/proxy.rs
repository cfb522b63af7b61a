//! Calling into native objects.
//!
//! The per-method dispatch lives in the wrapper structs that
//! `#[com_interface]` generates (load the object pointer, dereference the
//! table, call the slot with `this` first). This module supplies the
//! runtime half: [`ComPtr`], an owning smart pointer over a native object
//! pointer that maps `Clone`/`Drop` onto `AddRef`/`Release` so exactly one
//! authoritative count lives at the boundary.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::{self, NonNull};

use tracing::trace;

use crate::com::{succeeded, ComError, ComInterface, GUID, IUnknown, E_NOINTERFACE};

/// Owning, typed pointer to a native object implementing interface `I`.
///
/// `I` is a wrapper struct generated by `#[com_interface]`; dereferencing a
/// `ComPtr<I>` yields that wrapper, whose unsafe methods dispatch through
/// the object's function table.
///
/// A `ComPtr` always owns exactly one reference: it releases on drop and
/// adds a reference on clone. Construction from a null pointer fails with
/// [`ComError::NullPointer`] - a caller contract violation, not a result
/// code.
pub struct ComPtr<I: ComInterface> {
    ptr: NonNull<c_void>,
    _marker: PhantomData<*const I>,
}

impl<I: ComInterface> ComPtr<I> {
    /// Adopt an existing counted reference (does not `AddRef`).
    ///
    /// # Safety
    /// - `ptr`, if non-null, must point to a valid native object whose
    ///   function table matches `I`'s flattened layout
    /// - The caller transfers one reference to the returned pointer
    pub unsafe fn from_raw(ptr: *mut c_void) -> Result<Self, ComError> {
        match NonNull::new(ptr) {
            Some(ptr) => Ok(Self {
                ptr,
                _marker: PhantomData,
            }),
            None => Err(ComError::NullPointer),
        }
    }

    /// Borrow a reference the caller keeps: `AddRef`s before wrapping.
    ///
    /// # Safety
    /// Same validity requirements as [`ComPtr::from_raw`], except the
    /// caller's reference is left untouched.
    pub unsafe fn from_raw_borrowed(ptr: *mut c_void) -> Result<Self, ComError> {
        let this = unsafe { Self::from_raw(ptr)? };
        unsafe { this.as_unknown().add_ref() };
        Ok(this)
    }

    /// The underlying object pointer. The pointer stays owned by this
    /// `ComPtr`; it remains valid only while the `ComPtr` is alive.
    #[must_use]
    pub fn as_raw(&self) -> *mut c_void {
        self.ptr.as_ptr()
    }

    /// Give up ownership without releasing; the caller now owns the
    /// reference this pointer held.
    #[must_use]
    pub fn into_raw(self) -> *mut c_void {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }

    /// View the object through the root interface (always valid: slots 0-2
    /// of every table are the lifetime methods).
    #[must_use]
    pub fn as_unknown(&self) -> &IUnknown {
        unsafe { IUnknown::from_ptr(self.ptr.as_ptr()) }
    }

    /// Dynamic cast: ask the object for interface `J` by GUID.
    ///
    /// Any success code with a non-null out-pointer yields a typed pointer
    /// owning the reference `QueryInterface` added; a missing interface is
    /// an expected outcome and maps to [`ComError::NoInterface`]; any other
    /// failure code passes through in [`ComError::Failed`]. A success code
    /// paired with a null out-pointer is a broken callee and reports
    /// [`ComError::NullPointer`].
    pub fn query_interface<J: ComInterface>(&self) -> Result<ComPtr<J>, ComError> {
        let mut out: *mut c_void = ptr::null_mut();
        let riid = &J::IID as *const GUID;
        let hr = unsafe { self.as_unknown().query_interface(riid, &mut out) };
        if succeeded(hr) {
            return unsafe { ComPtr::from_raw(out) };
        }
        if hr == E_NOINTERFACE {
            trace!(requested = %J::IID, "query_interface refused");
            Err(ComError::NoInterface(J::IID))
        } else {
            Err(ComError::Failed(hr))
        }
    }
}

impl<I: ComInterface> Deref for ComPtr<I> {
    type Target = I;

    fn deref(&self) -> &I {
        unsafe { &*(self.ptr.as_ptr() as *const I) }
    }
}

impl<I: ComInterface> Clone for ComPtr<I> {
    fn clone(&self) -> Self {
        unsafe { self.as_unknown().add_ref() };
        Self {
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }
}

impl<I: ComInterface> Drop for ComPtr<I> {
    fn drop(&mut self) {
        unsafe { self.as_unknown().release() };
    }
}

impl<I: ComInterface> std::fmt::Debug for ComPtr<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComPtr")
            .field("iid", &I::IID)
            .field("ptr", &self.ptr.as_ptr())
            .finish()
    }
}
