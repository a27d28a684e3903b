//! Raw C ABI for the `hello` export.
//!
//! Strings cross the boundary through linear memory. The host reserves space
//! with `alloc`, writes the argument, and calls `hello(ptr, len)`; a null
//! `ptr` means "no argument". The result is a buffer laid out as a 4-byte
//! little-endian length followed by UTF-8 bytes, which the host releases with
//! `dealloc(ptr, 4 + len)`.

use std::mem;
use std::ptr;

/// Size of the length prefix on returned buffers.
pub const LEN_PREFIX: usize = 4;

#[no_mangle]
pub extern "C" fn alloc(len: usize) -> *mut u8 {
    let mut buf = Vec::<u8>::with_capacity(len);
    let ptr = buf.as_mut_ptr();
    mem::forget(buf);
    ptr
}

/// # Safety
///
/// `ptr` must come from [`alloc`] (or be a result of [`hello`]) and `cap`
/// must be the size it was allocated with.
#[no_mangle]
pub unsafe extern "C" fn dealloc(ptr: *mut u8, cap: usize) {
    if ptr.is_null() {
        return;
    }
    drop(Vec::from_raw_parts(ptr, 0, cap));
}

/// # Safety
///
/// When `ptr` is non-null it must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn hello(ptr: *const u8, len: usize) -> *mut u8 {
    let out = if ptr.is_null() {
        hello_export::hello(None)
    } else {
        let bytes = std::slice::from_raw_parts(ptr, len);
        hello_export::hello(Some(&String::from_utf8_lossy(bytes)))
    };
    into_prefixed(out)
}

fn into_prefixed(text: String) -> *mut u8 {
    let Ok(len) = u32::try_from(text.len()) else {
        return ptr::null_mut();
    };
    let mut buf = Vec::with_capacity(LEN_PREFIX + text.len());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(text.as_bytes());
    // dealloc rebuilds the allocation from its exact length
    Box::into_raw(buf.into_boxed_slice()).cast::<u8>()
}
