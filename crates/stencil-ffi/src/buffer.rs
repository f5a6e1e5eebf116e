use std::mem::ManuallyDrop;
use std::ptr;
use std::slice;

/// A `Vec<T>` whose ownership has been handed across the C ABI.
///
/// The triple is only ever turned back into a `Vec` by the side that created
/// it. `CVec` is deliberately neither `Clone` nor `Drop`: the buffer is freed
/// by passing it back to its owner, once.
#[repr(C)]
#[derive(Debug)]
pub struct CVec<T> {
    data: *mut T,
    len: usize,
    capacity: usize,
}

impl<T> CVec<T> {
    /// Gives up ownership of `vec`.
    pub fn from_vec(vec: Vec<T>) -> Self {
        let mut vec = ManuallyDrop::new(vec);
        Self {
            data: vec.as_mut_ptr(),
            len: vec.len(),
            capacity: vec.capacity(),
        }
    }

    /// The absent buffer. Distinct from an empty one: `data` is null.
    pub fn null() -> Self {
        Self {
            data: ptr::null_mut(),
            len: 0,
            capacity: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrows the contents.
    ///
    /// # Safety
    /// `self` must describe a live buffer of `len` initialised elements (or be null).
    pub unsafe fn as_slice(&self) -> &[T] {
        if self.data.is_null() || self.len == 0 {
            return &[];
        }
        slice::from_raw_parts(self.data, self.len)
    }

    /// Takes ownership back.
    ///
    /// # Safety
    /// `self` must have been produced by [`CVec::from_vec`] in this allocator
    /// (or be null) and must not be used again.
    pub unsafe fn into_vec(self) -> Vec<T> {
        if self.data.is_null() {
            return Vec::new();
        }
        Vec::from_raw_parts(self.data, self.len, self.capacity)
    }
}
