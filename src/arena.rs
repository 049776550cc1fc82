//! Bump allocation for the lifetime of one function's compilation.
//!
//! Every stage of the pipeline that needs working storage (scope chains, the
//! interference graph's adjacency nodes, label tables) pulls it from one of two
//! [`Arena`]s borrowed through [`get_scratch`], rather than from the heap directly.
//! This mirrors `original_source/pork/src/base.c`'s `Arena`/`Scratch` pair: a single
//! contiguous buffer with a watermark, no per-allocation free, and a two-arena
//! scratch pool so a caller that already holds one scratch arena can still request
//! a second one for a nested computation without aliasing it.

use std::cell::Cell;

/// A linear allocator over one contiguous byte buffer.
///
/// `push` and `push_zeroed` never fail by returning `None`; like the C original,
/// running out of space is a programming error (the arena sizes are chosen to
/// comfortably hold one function's compilation) and panics via `assert!`.
pub struct Arena {
    buffer: Vec<u8>,
    allocated: Cell<usize>,
}

impl Arena {
    /// Creates an arena with `size` bytes of backing storage.
    pub fn new(size: usize) -> Self {
        Arena {
            buffer: vec![0u8; size],
            allocated: Cell::new(0),
        }
    }

    /// Bumps the watermark by `size` bytes, 8-byte aligned, zero-initialized.
    pub fn push(&self, size: usize) -> usize {
        let aligned = (size + 7) & !7;
        let start = self.allocated.get();
        assert!(
            self.buffer.len() - start >= aligned,
            "arena out of memory: requested {aligned} bytes with {} remaining",
            self.buffer.len() - start
        );
        self.allocated.set(start + aligned);
        start
    }

    /// Current watermark, in bytes from the start of the buffer.
    pub fn watermark(&self) -> usize {
        self.allocated.get()
    }

    /// Rewinds the watermark to `mark`. Used by [`Scratch::release`].
    fn rewind(&self, mark: usize) {
        assert!(mark <= self.allocated.get(), "cannot rewind an arena forward");
        self.allocated.set(mark);
    }

    /// Bytes used so far.
    pub fn len(&self) -> usize {
        self.allocated.get()
    }

    pub fn is_empty(&self) -> bool {
        self.allocated.get() == 0
    }
}

/// A watermark into a borrowed scratch [`Arena`], released LIFO.
pub struct Scratch<'a> {
    arena: &'a Arena,
    mark: usize,
}

impl<'a> Scratch<'a> {
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// Rewinds the arena back to the watermark recorded at [`get_scratch`] time.
    ///
    /// Release is strictly LIFO with respect to the watermark: releasing a scratch
    /// obtained before a nested scratch on the *same* arena, before releasing the
    /// nested one, would silently discard the nested one's still-live allocations.
    /// Nothing in this crate does that (each component releases its own scratch
    /// before returning), but the rewind itself does not re-verify LIFO order
    /// beyond `Arena::rewind`'s "don't rewind forward" assertion.
    pub fn release(self) {
        self.arena.rewind(self.mark);
    }
}

/// Two arenas a pipeline stage may borrow as scratch space, handed out by
/// [`ScratchPool::get`] so that a caller already using one of them (e.g. the
/// long-lived arena holding the AST) is never handed that same arena back.
pub struct ScratchPool {
    arenas: [Arena; 2],
}

impl ScratchPool {
    pub fn new(size: usize) -> Self {
        ScratchPool {
            arenas: [Arena::new(size), Arena::new(size)],
        }
    }

    /// Returns whichever scratch arena is not `conflict`, recording its current
    /// watermark so [`Scratch::release`] can rewind back to it.
    pub fn get(&self, conflict: Option<&Arena>) -> Scratch<'_> {
        for arena in &self.arenas {
            if conflict.map_or(true, |c| !std::ptr::eq(c, arena)) {
                return Scratch {
                    arena,
                    mark: arena.watermark(),
                };
            }
        }
        unreachable!("both scratch arenas conflict with the caller")
    }
}
