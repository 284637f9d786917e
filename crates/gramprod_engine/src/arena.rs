//! Paged scratch arenas for one parse call.
//!
//! Parse states and matches point at each other freely (enclosing states,
//! sub-match lists), so they live in typed arenas and refer to one another
//! by [`Handle`] instead of by reference. Nothing is freed individually: the
//! whole arena is reset when the next parse begins.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem;

use gramprod_foundation::{Error, ErrorKind, PropId, Result};

use crate::config::ArenaConfig;
use crate::input::InputToken;
use crate::matcher::{Match, ParseState};

// =============================================================================
// Handles
// =============================================================================

/// Index of one value in an [`Arena`].
pub struct Handle<T> {
    page: u32,
    slot: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    #[allow(clippy::cast_possible_truncation)]
    const fn new(page: usize, slot: usize) -> Self {
        Self {
            page: page as u32,
            slot: slot as u32,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.page == other.page && self.slot == other.slot
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.page.hash(state);
        self.slot.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}:{})", self.page, self.slot)
    }
}

/// A run of contiguous values in one [`Arena`] page.
pub struct Slice<T> {
    page: u32,
    start: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Slice<T> {
    /// The empty slice.
    pub const EMPTY: Self = Self {
        page: 0,
        start: 0,
        len: 0,
        _marker: PhantomData,
    };

    /// Number of values in the slice.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns true if the slice holds no values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Clone for Slice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Slice<T> {}

impl<T> PartialEq for Slice<T> {
    fn eq(&self, other: &Self) -> bool {
        self.page == other.page && self.start == other.start && self.len == other.len
    }
}

impl<T> Eq for Slice<T> {}

impl<T> fmt::Debug for Slice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slice({}:{}+{})", self.page, self.start, self.len)
    }
}

// =============================================================================
// Arena
// =============================================================================

/// A typed bump arena that grows by fixed-size pages.
///
/// Pages never reallocate once created, so a [`Slice`] always lies within a
/// single page. A slice request longer than a page fails with
/// [`ErrorKind::ArenaOverflow`].
pub struct Arena<T> {
    pages: Vec<Vec<T>>,
    /// Index of the page currently being filled.
    current: usize,
    per_page: usize,
    page_bytes: usize,
    retained_pages: usize,
    allocated: usize,
}

impl<T> Arena<T> {
    /// Creates an empty arena sized by `config`.
    #[must_use]
    pub fn new(config: &ArenaConfig) -> Self {
        let per_page = (config.page_size / mem::size_of::<T>().max(1)).max(1);
        Self {
            pages: Vec::new(),
            current: 0,
            per_page,
            page_bytes: config.page_size,
            retained_pages: config.retained_pages,
            allocated: 0,
        }
    }

    /// Number of values a page holds.
    #[must_use]
    pub const fn per_page(&self) -> usize {
        self.per_page
    }

    /// Number of values allocated since the last reset.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.allocated
    }

    /// Returns true if nothing was allocated since the last reset.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.allocated == 0
    }

    /// Number of pages currently held, including empty retained pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns the index of a page with room for `n` more values.
    fn page_with_room(&mut self, n: usize) -> usize {
        while self.current < self.pages.len() {
            if self.pages[self.current].len() + n <= self.per_page {
                return self.current;
            }
            self.current += 1;
        }
        self.pages.push(Vec::with_capacity(self.per_page));
        self.current = self.pages.len() - 1;
        self.current
    }

    /// Allocates one value.
    pub fn alloc(&mut self, value: T) -> Handle<T> {
        let page = self.page_with_room(1);
        let slot = self.pages[page].len();
        self.pages[page].push(value);
        self.allocated += 1;
        Handle::new(page, slot)
    }

    /// Allocates a contiguous slice.
    ///
    /// # Errors
    /// Returns [`ErrorKind::ArenaOverflow`] if the slice cannot fit in a
    /// single page.
    #[allow(clippy::cast_possible_truncation)]
    pub fn alloc_slice<I>(&mut self, values: I) -> Result<Slice<T>>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let values = values.into_iter();
        let len = values.len();
        if len == 0 {
            return Ok(Slice::EMPTY);
        }
        if len > self.per_page {
            return Err(Error::new(ErrorKind::ArenaOverflow {
                requested: len * mem::size_of::<T>(),
                page: self.page_bytes,
            }));
        }
        let page = self.page_with_room(len);
        let start = self.pages[page].len();
        self.pages[page].extend(values);
        self.allocated += len;
        Ok(Slice {
            page: page as u32,
            start: start as u32,
            len: len as u32,
            _marker: PhantomData,
        })
    }

    /// Returns the value behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was issued before the last reset.
    #[must_use]
    pub fn get(&self, handle: Handle<T>) -> &T {
        &self.pages[handle.page as usize][handle.slot as usize]
    }

    /// Returns the value behind a handle, mutably.
    ///
    /// # Panics
    ///
    /// Panics if the handle was issued before the last reset.
    pub fn get_mut(&mut self, handle: Handle<T>) -> &mut T {
        &mut self.pages[handle.page as usize][handle.slot as usize]
    }

    /// Returns the values of a slice.
    ///
    /// # Panics
    ///
    /// Panics if the slice was issued before the last reset.
    #[must_use]
    pub fn slice(&self, slice: Slice<T>) -> &[T] {
        if slice.is_empty() {
            return &[];
        }
        let start = slice.start as usize;
        &self.pages[slice.page as usize][start..start + slice.len()]
    }

    /// Returns the values of a slice, mutably.
    ///
    /// # Panics
    ///
    /// Panics if the slice was issued before the last reset.
    pub fn slice_mut(&mut self, slice: Slice<T>) -> &mut [T] {
        if slice.is_empty() {
            return &mut [];
        }
        let start = slice.start as usize;
        &mut self.pages[slice.page as usize][start..start + slice.len()]
    }

    /// Invalidates every handle and slice handed out so far.
    ///
    /// Pages up to the retained limit keep their storage for the next parse.
    pub fn reset(&mut self) {
        self.pages.truncate(self.retained_pages);
        for page in &mut self.pages {
            page.clear();
        }
        self.current = 0;
        self.allocated = 0;
    }
}

impl<T: Clone> Arena<T> {
    /// Copies a slice, optionally truncating it to its first `keep` values
    /// and padding the rest with `fill`.
    ///
    /// # Errors
    /// Returns [`ErrorKind::ArenaOverflow`] if the copy cannot fit in a page.
    pub fn copy_slice(&mut self, slice: Slice<T>, keep: usize, fill: &T) -> Result<Slice<T>> {
        let copied: Vec<T> = self
            .slice(slice)
            .iter()
            .enumerate()
            .map(|(i, v)| if i < keep { v.clone() } else { fill.clone() })
            .collect();
        self.alloc_slice(copied)
    }
}

// =============================================================================
// Parse Arena
// =============================================================================

/// All scratch storage used by one parse call.
pub struct ParseArena {
    /// Parse states.
    pub states: Arena<ParseState>,
    /// Matches.
    pub matches: Arena<Match>,
    /// Per-state sub-match lists.
    pub match_lists: Arena<Option<Handle<Match>>>,
    /// Part-of-speech lists of input tokens.
    pub props: Arena<PropId>,
    /// The input token cache, in input order.
    pub tokens: Vec<InputToken>,
}

impl ParseArena {
    /// Creates empty arenas sized by `config`.
    #[must_use]
    pub fn new(config: &ArenaConfig) -> Self {
        Self {
            states: Arena::new(config),
            matches: Arena::new(config),
            match_lists: Arena::new(config),
            props: Arena::new(config),
            tokens: Vec::new(),
        }
    }

    /// Resets every arena for a new parse call.
    pub fn reset(&mut self) {
        self.states.reset();
        self.matches.reset();
        self.match_lists.reset();
        self.props.reset();
        self.tokens.clear();
    }
}
