//! End-to-end demo of the ABI bridge: define an interface chain, expose
//! Rust objects behind it, and call back through the native-visible
//! records exactly as foreign code would.

use combridge::proc::{com_implement, com_interface};
use combridge::{resolve, ComError, ComPtr, Exposure};
use tracing::info;

#[com_interface("f2a0c7e1-3b84-49d2-9d6a-5e01c4b7a2d8")]
pub trait IBlob {
    fn buffer_size(&self) -> usize;
    fn byte_at(&self, index: usize) -> u8;
}

#[com_interface("b91d5c32-7e46-4f0b-8a17-d3c9e65f0241", extends(IBlob))]
pub trait IEncodedBlob {
    fn encoding(&self) -> i32;
}

// Nobody implements this one; used to show a refused cast.
#[com_interface("0c3e8f57-a1d9-42c6-b08e-6f24d7a91b53")]
pub trait IChecksum {
    fn checksum(&self) -> u32;
}

struct MemoryBlob {
    bytes: Vec<u8>,
}

#[com_implement(IBlob)]
impl MemoryBlob {
    fn buffer_size(&self) -> usize {
        self.bytes.len()
    }

    fn byte_at(&self, index: usize) -> u8 {
        self.bytes[index]
    }
}

/// UTF-8 text blob, exposed behind the derived interface. The base slots
/// forward to the inherent methods below.
struct Utf8Blob {
    text: String,
}

impl Utf8Blob {
    fn buffer_size(&self) -> usize {
        self.text.len()
    }

    fn byte_at(&self, index: usize) -> u8 {
        self.text.as_bytes()[index]
    }
}

#[com_implement(IEncodedBlob, extends(IBlob))]
impl Utf8Blob {
    fn encoding(&self) -> i32 {
        65001
    }
}

fn main() -> Result<(), ComError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Slot layout as native code sees it: ancestor methods first.
    for slot in resolve::<IEncodedBlob>().iter() {
        info!(
            slot = slot.index,
            method = slot.sig.name,
            declared_by = slot.declared_by,
            "IEncodedBlob table"
        );
    }

    // Expose a Rust object and call it back through its record, the way a
    // native caller holding the pointer would.
    let exposure = Exposure::<IBlob, MemoryBlob>::new(MemoryBlob {
        bytes: vec![0xDE, 0xAD, 0xBE, 0xEF],
    });
    info!(
        refs = exposure.ref_count(),
        record_allocated = !exposure.record_ptr().is_null(),
        "fresh exposure"
    );

    let blob: ComPtr<IBlob> = exposure.acquire()?;
    let size = unsafe { blob.buffer_size() };
    let first = unsafe { blob.byte_at(0) };
    info!(size, first, "called through record");

    // Dynamic casts: the root interface always answers, an unimplemented
    // one is refused with the count left alone.
    let unknown = blob.query_interface::<combridge::IUnknown>()?;
    info!(refs = exposure.ref_count(), "cast to root");
    drop(unknown);

    match blob.query_interface::<IChecksum>() {
        Err(ComError::NoInterface(iid)) => info!(%iid, "cast refused as expected"),
        other => info!(?other, "unexpected cast outcome"),
    }

    drop(blob);
    info!(
        refs = exposure.ref_count(),
        released = exposure.is_released(),
        "after final release"
    );

    // Derived exposure: ancestor methods are reachable both directly (the
    // base table is a prefix) and through an upcast.
    let text = Exposure::<IEncodedBlob, Utf8Blob>::new(Utf8Blob {
        text: "bonjour".into(),
    });
    let encoded: ComPtr<IEncodedBlob> = text.acquire()?;
    let encoding = unsafe { encoded.encoding() };
    let len = unsafe { encoded.buffer_size() };

    let as_base: ComPtr<IBlob> = encoded.query_interface()?;
    let len_via_base = unsafe { as_base.buffer_size() };
    assert_eq!(len, len_via_base);
    assert_eq!(as_base.as_raw(), encoded.as_raw());
    info!(encoding, len, "derived exposure round trip");

    Ok(())
}
