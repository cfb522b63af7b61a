//! Exposure lifetime: lazy record allocation, exactly-once teardown,
//! pinning across a dropped owner, and over-release handling.

use std::cell::Cell;
use std::rc::Rc;

use combridge::proc::{com_implement, com_interface};
use combridge::{ComError, Exposure, IUnknown};

#[com_interface("8c4f2b61-9a0d-4537-b8e2-61f0a3c59d74")]
pub trait ICounter {
    fn value(&self) -> u32;
}

struct Counted {
    value: u32,
    drops: Rc<Cell<u32>>,
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

#[com_implement(ICounter)]
impl Counted {
    fn value(&self) -> u32 {
        self.value
    }
}

fn counted(value: u32) -> (Exposure<ICounter, Counted>, Rc<Cell<u32>>) {
    let drops = Rc::new(Cell::new(0));
    let exposure = Exposure::new(Counted {
        value,
        drops: Rc::clone(&drops),
    });
    (exposure, drops)
}

#[test]
fn fresh_exposure_allocates_nothing_native_visible() {
    let (exposure, _drops) = counted(7);
    assert_eq!(exposure.ref_count(), 0);
    assert!(exposure.record_ptr().is_null());
    assert!(!exposure.is_released());
    // The object itself is reachable from Rust regardless of the count
    assert_eq!(exposure.object().value(), 7);
}

#[test]
fn record_appears_on_first_reference_and_stays_put() {
    let (exposure, _drops) = counted(1);
    assert_eq!(exposure.add_ref(), 1);
    let record = exposure.record_ptr();
    assert!(!record.is_null());

    // Further references reuse the same record
    assert_eq!(exposure.add_ref(), 2);
    assert_eq!(exposure.record_ptr(), record);

    assert_eq!(exposure.release(), 1);
    assert_eq!(exposure.record_ptr(), record);
    assert_eq!(exposure.release(), 0);
    assert!(exposure.record_ptr().is_null());
    assert!(exposure.is_released());
}

#[test]
fn teardown_runs_once_and_object_outlives_it_in_rust() {
    let (exposure, drops) = counted(1);
    exposure.add_ref();
    exposure.release();
    assert!(exposure.is_released());
    // Teardown freed the record and the pin, not the object: the Rust-side
    // owner still holds it
    assert_eq!(drops.get(), 0);
    assert_eq!(exposure.object().value(), 1);
    drop(exposure);
    assert_eq!(drops.get(), 1);
}

#[test]
fn pin_keeps_the_object_alive_for_native_holders() {
    let (exposure, drops) = counted(42);
    exposure.add_ref();
    let record = exposure.record_ptr();
    drop(exposure);

    // The native side still holds a counted reference, so the object must
    // survive its Rust owner
    assert_eq!(drops.get(), 0);
    let unknown = unsafe { IUnknown::from_ptr(record) };
    assert_eq!(unsafe { unknown.release() }, 0);
    assert_eq!(drops.get(), 1);
}

#[test]
fn released_exposure_is_terminal() {
    let (exposure, _drops) = counted(0);
    exposure.add_ref();
    exposure.release();
    assert!(exposure.is_released());
    assert_eq!(exposure.ref_count(), 0);
    assert_eq!(exposure.acquire().unwrap_err(), ComError::Released);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "over-release")]
fn releasing_an_unreferenced_exposure_asserts() {
    let (exposure, _drops) = counted(0);
    exposure.release();
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "over-release")]
fn releasing_past_zero_asserts() {
    let (exposure, _drops) = counted(0);
    exposure.add_ref();
    exposure.release();
    exposure.release();
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "add_ref on released")]
fn reviving_a_released_exposure_asserts() {
    let (exposure, _drops) = counted(0);
    exposure.add_ref();
    exposure.release();
    exposure.add_ref();
}

#[test]
#[cfg(not(debug_assertions))]
fn over_release_is_a_no_op_in_release_builds() {
    let (exposure, drops) = counted(0);
    exposure.add_ref();
    exposure.release();
    assert_eq!(exposure.release(), 0);
    assert_eq!(exposure.add_ref(), 0);
    drop(exposure);
    assert_eq!(drops.get(), 1);
}
