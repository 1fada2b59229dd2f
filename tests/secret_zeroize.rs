//! SecretBuffer wipe tests
//!
//! A recording allocator inspects the block that held the secret bytes at the
//! moment it is returned, on a normal drop, during unwinding and after growth.

use std::alloc::{GlobalAlloc, Layout, System};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use aesbatch::secret::SecretBuffer;

const PENDING: u8 = 0;
const ZEROED: u8 = 1;
const DIRTY: u8 = 2;

/// Address of the block to inspect on release; zero when nothing is watched.
static WATCHED: AtomicUsize = AtomicUsize::new(0);
static VERDICT: AtomicU8 = AtomicU8::new(PENDING);

struct RecordingAlloc;

unsafe impl GlobalAlloc for RecordingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let addr = ptr as usize;
        if addr != 0 && WATCHED.compare_exchange(addr, 0, Ordering::SeqCst, Ordering::SeqCst).is_ok() {
            let bytes = unsafe { std::slice::from_raw_parts(ptr, layout.size()) };
            let verdict = if bytes.iter().all(|&b| b == 0) { ZEROED } else { DIRTY };
            VERDICT.store(verdict, Ordering::SeqCst);
        }
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: RecordingAlloc = RecordingAlloc;

/// One watched block at a time.
static SERIAL: Mutex<()> = Mutex::new(());

fn watch(buffer: &SecretBuffer) {
    VERDICT.store(PENDING, Ordering::SeqCst);
    WATCHED.store(buffer.as_bytes().as_ptr() as usize, Ordering::SeqCst);
}

fn verdict() -> u8 {
    WATCHED.store(0, Ordering::SeqCst);
    VERDICT.load(Ordering::SeqCst)
}

#[test]
fn test_wiped_on_drop() {
    let _serial = SERIAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

    let buffer = SecretBuffer::from_slice(b"correct horse battery staple");
    watch(&buffer);
    drop(buffer);

    assert_eq!(verdict(), ZEROED);
}

#[test]
fn test_wiped_on_unwind() {
    let _serial = SERIAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let buffer = SecretBuffer::from_slice(b"unwinding secret");
        watch(&buffer);
        panic!("failure while the secret is alive");
    }));

    assert!(result.is_err());
    assert_eq!(verdict(), ZEROED);
}

#[test]
fn test_old_allocation_wiped_on_growth() {
    let _serial = SERIAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

    let mut buffer = SecretBuffer::with_capacity(8);
    buffer.extend_from_slice(b"12345678");
    let before = buffer.as_bytes().as_ptr() as usize;
    watch(&buffer);

    buffer.extend_from_slice(b"more secret bytes");
    assert_ne!(buffer.as_bytes().as_ptr() as usize, before);
    assert_eq!(verdict(), ZEROED);
    assert_eq!(buffer.as_bytes(), b"12345678more secret bytes");

    watch(&buffer);
    drop(buffer);
    assert_eq!(verdict(), ZEROED);
}
