//! SIMD-aligned amplitude storage
//!
//! A [`StateBuffer`] owns the raw floating-point array a state space
//! operates on. Allocation is 64-byte aligned so every lane block starts
//! on a full SIMD register boundary; the buffer may be moved between
//! state spaces of identical qubit count and lane width.

use crate::error::{Result, StateError};
use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

/// Alignment for amplitude storage (covers AVX-512 loads).
pub const BUFFER_ALIGNMENT: usize = 64;

/// Aligned, heap-allocated array of `f32` or `f64` amplitude components.
pub struct StateBuffer<F> {
    data: NonNull<F>,
    len: usize,
    layout: Layout,
}

impl<F: Copy> StateBuffer<F> {
    /// Allocate a zero-initialized buffer of `len` components.
    ///
    /// # Errors
    /// Returns an error if the aligned allocation fails.
    pub fn zeroed(len: usize) -> Result<Self> {
        let size = len * std::mem::size_of::<F>();
        let layout = Layout::from_size_align(size.max(1), BUFFER_ALIGNMENT)
            .map_err(|_| StateError::AllocationFailed { size })?;

        let data = unsafe {
            let ptr = alloc(layout) as *mut F;
            if ptr.is_null() {
                return Err(StateError::AllocationFailed { size });
            }
            std::ptr::write_bytes(ptr as *mut u8, 0, layout.size());
            NonNull::new_unchecked(ptr)
        };

        Ok(Self { data, len, layout })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[F] {
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [F] {
        unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const F {
        self.data.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut F {
        self.data.as_ptr()
    }
}

impl<F> Drop for StateBuffer<F> {
    fn drop(&mut self) {
        unsafe {
            dealloc(self.data.as_ptr() as *mut u8, self.layout);
        }
    }
}

// StateBuffer owns its allocation exclusively.
unsafe impl<F: Send> Send for StateBuffer<F> {}
unsafe impl<F: Sync> Sync for StateBuffer<F> {}
