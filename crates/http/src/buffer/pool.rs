use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A fixed-capacity byte buffer issued by a [`BufferPool`].
pub struct BufferHandle {
    inner: Box<[u8]>,
}

impl BufferHandle {
    fn allocate(capacity: usize) -> Self {
        Self { inner: vec![0u8; capacity].into_boxed_slice() }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.len()
    }
}

impl Deref for BufferHandle {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for BufferHandle {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferHandle").field("capacity", &self.capacity()).finish()
    }
}

/// Issues and reclaims buffers of one fixed capacity.
///
/// The free list only ever holds buffers that were borrowed and given back, so the
/// pool never grows beyond the peak number of simultaneous borrowers.
pub struct BufferPool {
    capacity: usize,
    free: Mutex<Vec<BufferHandle>>,
    allocated: AtomicUsize,
    outstanding: AtomicUsize,
}

impl BufferPool {
    /// Creates an empty pool whose buffers are exactly `capacity` bytes long.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be positive");
        Self { capacity, free: Mutex::new(Vec::new()), allocated: AtomicUsize::new(0), outstanding: AtomicUsize::new(0) }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Takes a buffer from the free list, or allocates one when the list is empty.
    pub fn borrow(&self) -> BufferHandle {
        let recycled = self.free_list().pop();
        let handle = recycled.unwrap_or_else(|| {
            self.allocated.fetch_add(1, Ordering::Relaxed);
            BufferHandle::allocate(self.capacity)
        });
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        handle
    }

    /// Puts a buffer back on the free list.
    ///
    /// The handle must have been borrowed from this pool.
    pub fn return_buffer(&self, handle: BufferHandle) {
        debug_assert_eq!(handle.capacity(), self.capacity, "returned a buffer that does not belong to this pool");
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
        self.free_list().push(handle);
    }

    pub fn return_buffers<I>(&self, handles: I)
    where
        I: IntoIterator<Item = BufferHandle>,
    {
        let mut free = self.free_list();
        for handle in handles {
            debug_assert_eq!(handle.capacity(), self.capacity, "returned a buffer that does not belong to this pool");
            self.outstanding.fetch_sub(1, Ordering::Relaxed);
            free.push(handle);
        }
    }

    /// Borrows a buffer that goes back to the pool when the lease is dropped.
    pub fn lease(&self) -> BufferLease<'_> {
        BufferLease { pool: self, handle: Some(self.borrow()) }
    }

    /// Number of buffers this pool has ever allocated.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Number of buffers currently waiting on the free list.
    pub fn available(&self) -> usize {
        self.free_list().len()
    }

    /// Number of buffers borrowed and not yet returned.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    fn free_list(&self) -> std::sync::MutexGuard<'_, Vec<BufferHandle>> {
        // a poisoned free list still only holds whole buffers
        self.free.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("capacity", &self.capacity)
            .field("allocated", &self.allocated())
            .field("outstanding", &self.outstanding())
            .finish_non_exhaustive()
    }
}

/// Scoped borrow of a pooled buffer, see [`BufferPool::lease`].
pub struct BufferLease<'pool> {
    pool: &'pool BufferPool,
    handle: Option<BufferHandle>,
}

impl Deref for BufferLease<'_> {
    type Target = BufferHandle;

    #[inline]
    fn deref(&self) -> &Self::Target {
        // only `drop` takes the handle
        self.handle.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for BufferLease<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.handle.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for BufferLease<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.pool.return_buffer(handle);
        }
    }
}

impl fmt::Debug for BufferLease<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferLease").field("capacity", &self.pool.capacity).finish()
    }
}
