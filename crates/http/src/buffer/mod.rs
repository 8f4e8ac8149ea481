//! Fixed-capacity buffer pooling.
//!
//! Reading an inbound body must never allocate in proportion to what the peer
//! claims to send. [`BufferPool`] hands out buffers of one fixed capacity, so the
//! memory spent on body reads is bounded by `capacity * concurrent readers`.
//!
//! # Ownership
//!
//! A [`BufferHandle`] is an owned value. Borrowing moves it out of the pool and
//! returning moves it back in, so a handle can not be held by two parties at once
//! and can not be returned twice. The pool does not track where a handle came from:
//! returning a buffer from a different pool is a caller bug, caught only by a
//! debug assertion on the capacity.
//!
//! Prefer [`BufferPool::lease`], which returns the buffer on drop and therefore on
//! every exit path of the borrowing scope.

mod pool;

pub use pool::BufferHandle;
pub use pool::BufferLease;
pub use pool::BufferPool;
