//! Process-wide object pools for scan-path allocations. Buffers are cleared
//! on return, never on checkout. The pools are an optimization; every call
//! site behaves identically if a fresh allocation is handed out instead.

use crate::storage::page::TupleId;
use once_cell::sync::Lazy;
use std::sync::Mutex;

const MAX_POOLED: usize = 64;

static BYTE_BUFFERS: Lazy<Mutex<Vec<Vec<u8>>>> = Lazy::new(|| Mutex::new(Vec::new()));
static TID_BUFFERS: Lazy<Mutex<Vec<Vec<TupleId>>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Checks out a byte buffer. The buffer is empty but may retain capacity
/// from a previous user.
pub fn take_byte_buffer() -> Vec<u8> {
    BYTE_BUFFERS
        .lock()
        .map(|mut pool| pool.pop())
        .unwrap_or(None)
        .unwrap_or_default()
}

/// Returns a byte buffer to the pool, clearing its contents.
pub fn return_byte_buffer(mut buffer: Vec<u8>) {
    buffer.clear();
    if let Ok(mut pool) = BYTE_BUFFERS.lock() {
        if pool.len() < MAX_POOLED {
            pool.push(buffer);
        }
    }
}

/// Checks out a tuple-id buffer for candidate collection during scans.
pub fn take_tid_buffer() -> Vec<TupleId> {
    TID_BUFFERS
        .lock()
        .map(|mut pool| pool.pop())
        .unwrap_or(None)
        .unwrap_or_default()
}

/// Returns a tuple-id buffer to the pool, clearing its contents.
pub fn return_tid_buffer(mut buffer: Vec<TupleId>) {
    buffer.clear();
    if let Ok(mut pool) = TID_BUFFERS.lock() {
        if pool.len() < MAX_POOLED {
            pool.push(buffer);
        }
    }
}
