//! Dynamic casting on exposed objects: every ancestor GUID answers with the
//! same record pointer, anything else is refused without touching the count.

use std::cell::Cell;
use std::ffi::c_void;
use std::ptr;

use combridge::proc::{com_implement, com_interface};
use combridge::{
    ComError, ComInterface, ComPtr, Exposure, IUnknown, IUnknownVTable, E_POINTER, GUID, HRESULT,
    S_FALSE, S_OK,
};

#[com_interface("d5a83f16-2c70-4b9e-a641-08e7d29c53bf")]
pub trait IShape {
    fn area(&self) -> f64;
}

#[com_interface("7e19c6d2-0b54-48a3-9f27-c35a81e60d49", extends(IShape))]
pub trait ICircle {
    fn radius(&self) -> f64;
}

#[com_interface("29f04b87-6d3e-41c5-852a-b91f7e36a0c2")]
pub trait IUnrelated {
    fn nothing(&self) -> i32;
}

struct Circle {
    radius: f64,
}

impl Circle {
    fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

#[com_implement(ICircle, extends(IShape))]
impl Circle {
    fn radius(&self) -> f64 {
        self.radius
    }
}

struct Square {
    side: f64,
}

#[com_implement(IShape)]
impl Square {
    fn area(&self) -> f64 {
        self.side * self.side
    }
}

#[test]
fn own_interface_answers_with_the_same_pointer() {
    let exposure = Exposure::<ICircle, Circle>::new(Circle { radius: 2.0 });
    let circle = exposure.acquire().unwrap();
    let again: ComPtr<ICircle> = circle.query_interface().unwrap();
    assert_eq!(again.as_raw(), circle.as_raw());
    assert_eq!(exposure.ref_count(), 2);
    drop(again);
    assert_eq!(exposure.ref_count(), 1);
}

#[test]
fn every_ancestor_answers_with_the_same_pointer() {
    let exposure = Exposure::<ICircle, Circle>::new(Circle { radius: 1.0 });
    let circle = exposure.acquire().unwrap();

    let shape: ComPtr<IShape> = circle.query_interface().unwrap();
    assert_eq!(shape.as_raw(), circle.as_raw());

    let unknown: ComPtr<IUnknown> = circle.query_interface().unwrap();
    assert_eq!(unknown.as_raw(), circle.as_raw());
    assert_eq!(exposure.ref_count(), 3);
}

#[test]
fn unrelated_interface_is_refused_and_count_is_untouched() {
    let exposure = Exposure::<ICircle, Circle>::new(Circle { radius: 1.0 });
    let circle = exposure.acquire().unwrap();
    let before = exposure.ref_count();

    let err = circle.query_interface::<IUnrelated>().unwrap_err();
    assert_eq!(err, ComError::NoInterface(<IUnrelated as ComInterface>::IID));
    assert_eq!(exposure.ref_count(), before);
}

#[test]
fn base_exposure_cannot_answer_for_a_derived_interface() {
    // Square is exposed behind IShape only; the derived GUID must be refused
    // even though another type in the program implements it
    let exposure = Exposure::<IShape, Square>::new(Square { side: 3.0 });
    let shape = exposure.acquire().unwrap();
    let err = shape.query_interface::<ICircle>().unwrap_err();
    assert_eq!(err, ComError::NoInterface(<ICircle as ComInterface>::IID));
}

#[test]
fn null_out_parameters_report_e_pointer() {
    let exposure = Exposure::<IShape, Square>::new(Square { side: 1.0 });
    let shape = exposure.acquire().unwrap();
    let unknown = shape.as_unknown();

    let riid = &<IShape as ComInterface>::IID as *const GUID;
    assert_eq!(
        unsafe { unknown.query_interface(riid, ptr::null_mut()) },
        E_POINTER
    );

    let mut out: *mut c_void = ptr::null_mut();
    assert_eq!(
        unsafe { unknown.query_interface(ptr::null(), &mut out) },
        E_POINTER
    );
    assert!(out.is_null());
    assert_eq!(exposure.ref_count(), 1);
}

// Hand-built native object whose QueryInterface answers with S_FALSE, and a
// broken variant reporting success without writing the out-pointer.
#[repr(C)]
struct Relay {
    vtable: *const IUnknownVTable,
    refs: Cell<u32>,
}

unsafe extern "C" fn relay_query_interface(
    this: *mut c_void,
    riid: *const GUID,
    ppv: *mut *mut c_void,
) -> HRESULT {
    unsafe {
        if riid.is_null() || ppv.is_null() {
            return E_POINTER;
        }
        relay_add_ref(this);
        *ppv = this;
        S_FALSE
    }
}

unsafe extern "C" fn broken_query_interface(
    _this: *mut c_void,
    _riid: *const GUID,
    ppv: *mut *mut c_void,
) -> HRESULT {
    unsafe {
        *ppv = ptr::null_mut();
        S_OK
    }
}

unsafe extern "C" fn relay_add_ref(this: *mut c_void) -> u32 {
    let relay = unsafe { &*(this as *const Relay) };
    relay.refs.set(relay.refs.get() + 1);
    relay.refs.get()
}

unsafe extern "C" fn relay_release(this: *mut c_void) -> u32 {
    let relay = unsafe { &*(this as *const Relay) };
    relay.refs.set(relay.refs.get() - 1);
    relay.refs.get()
}

static RELAY_VTABLE: IUnknownVTable = IUnknownVTable {
    query_interface: relay_query_interface,
    add_ref: relay_add_ref,
    release: relay_release,
};

static BROKEN_VTABLE: IUnknownVTable = IUnknownVTable {
    query_interface: broken_query_interface,
    add_ref: relay_add_ref,
    release: relay_release,
};

#[test]
fn nonstandard_success_code_still_yields_a_counted_pointer() {
    let object = Relay {
        vtable: &RELAY_VTABLE,
        refs: Cell::new(1),
    };
    let first: ComPtr<IUnknown> =
        unsafe { ComPtr::from_raw(&object as *const Relay as *mut c_void).unwrap() };

    // S_FALSE is a success code: the reference the callee added must not
    // be dropped on the floor
    let second = first.query_interface::<IUnknown>().unwrap();
    assert_eq!(object.refs.get(), 2);
    assert_eq!(second.as_raw(), first.as_raw());
    drop(second);
    assert_eq!(object.refs.get(), 1);
    drop(first);
    assert_eq!(object.refs.get(), 0);
}

#[test]
fn success_with_a_null_out_pointer_is_a_broken_callee() {
    let object = Relay {
        vtable: &BROKEN_VTABLE,
        refs: Cell::new(1),
    };
    let ptr: ComPtr<IUnknown> =
        unsafe { ComPtr::from_raw(&object as *const Relay as *mut c_void).unwrap() };
    let err = ptr.query_interface::<IUnknown>().unwrap_err();
    assert_eq!(err, ComError::NullPointer);
}

#[test]
fn successful_raw_query_returns_s_ok_and_a_counted_reference() {
    let exposure = Exposure::<IShape, Square>::new(Square { side: 2.0 });
    let shape = exposure.acquire().unwrap();

    let mut out: *mut c_void = ptr::null_mut();
    let riid = &<IUnknown as ComInterface>::IID as *const GUID;
    let hr = unsafe { shape.as_unknown().query_interface(riid, &mut out) };
    assert_eq!(hr, S_OK);
    assert_eq!(out, shape.as_raw());
    assert_eq!(exposure.ref_count(), 2);

    unsafe { IUnknown::from_ptr(out).release() };
    assert_eq!(exposure.ref_count(), 1);
}
