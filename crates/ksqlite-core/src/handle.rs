//! Opaque handles for referencing logical objects from across the boundary.
//!
//! The boundary side only ever sees a [`Token`], an `i64` that indexes a
//! [`HandleTable`]. The table owns an `Arc` to the target, which keeps the
//! object (and the native resource it wraps) alive until the token is
//! disposed. Slots carry a generation counter, so a token that outlived its
//! disposal never resolves to whatever object later reuses the slot.
//!
//! Objects that cross the boundary implement [`StableRef`]: they own a
//! [`NativeRef`] that creates the token lazily on first crossing and tears it
//! down exactly once, normally from the close/finalize path.

// Slot indices and generations are bounded to u32 before packing.
#![allow(clippy::cast_possible_truncation)]

use crate::error::{Error, Result};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const INDEX_MASK: i64 = 0xffff_ffff;
const MAX_GENERATION: u32 = 0x7fff_ffff;
const MAX_SLOTS: usize = (u32::MAX - 1) as usize;

/// Message used for every resolution of a disposed or unknown token.
pub const DISPOSED_MESSAGE: &str = "tried to access stable ref after it is disposed";

/// An opaque, boundary-safe reference to an object stored in a [`HandleTable`].
///
/// The raw value is never zero, so `0` can be used as the "no handle" value
/// on the boundary side.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(i64);

impl Token {
    fn pack(index: u32, generation: u32) -> Self {
        Token((i64::from(generation) << 32) | (i64::from(index) + 1))
    }

    fn index(self) -> usize {
        ((self.0 & INDEX_MASK) - 1) as usize
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Interpret a raw boundary value. Returns `None` for values no table can have issued.
    pub const fn from_raw(raw: i64) -> Option<Token> {
        if raw <= 0 || raw & INDEX_MASK == 0 {
            None
        } else {
            Some(Token(raw))
        }
    }

    /// The raw value handed to the boundary side.
    pub const fn as_raw(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({}@{})", self.index(), self.generation())
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<Arc<T>>,
}

struct Slots<T> {
    entries: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

/// A generational arena mapping tokens to owned references.
///
/// Safe to share between threads; the internal lock is only held for the
/// table bookkeeping and never while a target is dropped.
pub struct HandleTable<T> {
    slots: Mutex<Slots<T>>,
    capacity: usize,
}

impl<T> HandleTable<T> {
    pub const fn new() -> Self {
        Self::with_capacity_limit(MAX_SLOTS)
    }

    /// A table that refuses to hold more than `capacity` live and free slots.
    pub const fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(Slots {
                entries: Vec::new(),
                free: Vec::new(),
                live: 0,
            }),
            capacity: if capacity > MAX_SLOTS {
                MAX_SLOTS
            } else {
                capacity
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots<T>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `target` and return a fresh token for it.
    pub fn create(&self, target: Arc<T>) -> Result<Token> {
        let mut guard = self.lock();
        let slots = &mut *guard;
        let index = match slots.free.pop() {
            Some(index) => index,
            None => {
                if slots.entries.len() >= self.capacity {
                    return Err(Error::HandleExhausted {
                        capacity: self.capacity,
                    });
                }
                slots.entries.push(Slot {
                    generation: 1,
                    value: None,
                });
                (slots.entries.len() - 1) as u32
            }
        };
        let slot = &mut slots.entries[index as usize];
        slot.value = Some(target);
        let token = Token::pack(index, slot.generation);
        slots.live += 1;
        tracing::trace!(token = ?token, live = slots.live, "created handle");
        Ok(token)
    }

    fn live_value(slots: &Slots<T>, token: Token) -> Option<&Arc<T>> {
        let slot = slots.entries.get(token.index())?;
        if slot.generation != token.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Look up a token without treating a miss as an error.
    pub fn get(&self, token: Token) -> Option<Arc<T>> {
        Self::live_value(&self.lock(), token).cloned()
    }

    /// Resolve a token to its target.
    ///
    /// # Panics
    /// Resolving a disposed (or never issued) token is a use-after-free on the
    /// logical side and panics with [`DISPOSED_MESSAGE`].
    pub fn resolve(&self, token: Token) -> Arc<T> {
        match self.get(token) {
            Some(target) => target,
            None => panic!("{} ({:?})", DISPOSED_MESSAGE, token),
        }
    }

    /// Drop the association. Returns `false` if the token was already disposed.
    pub fn dispose(&self, token: Token) -> bool {
        let mut guard = self.lock();
        let slots = &mut *guard;
        let Some(slot) = slots.entries.get_mut(token.index()) else {
            return false;
        };
        if slot.generation != token.generation() || slot.value.is_none() {
            return false;
        }
        let target = slot.value.take();
        slot.generation = if slot.generation >= MAX_GENERATION {
            1
        } else {
            slot.generation + 1
        };
        slots.free.push(token.index() as u32);
        slots.live -= 1;
        tracing::trace!(token = ?token, live = slots.live, "disposed handle");
        drop(guard);
        // The target may own native resources; release it outside the lock.
        drop(target);
        true
    }

    pub fn is_disposed(&self, token: Token) -> bool {
        Self::live_value(&self.lock(), token).is_none()
    }

    /// Number of live tokens.
    pub fn len(&self) -> usize {
        self.lock().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
enum RefState {
    Unset,
    Live(Token),
    Disposed,
}

/// The per-object side of a handle: at most one token, created lazily,
/// disposed once.
#[derive(Debug)]
pub struct NativeRef {
    state: Mutex<RefState>,
}

impl NativeRef {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefState::Unset),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the existing token or create one with `create`.
    ///
    /// # Panics
    /// Panics with [`DISPOSED_MESSAGE`] once the reference has been disposed.
    pub fn token_or_create(&self, create: impl FnOnce() -> Result<Token>) -> Result<Token> {
        let mut state = self.lock();
        match *state {
            RefState::Live(token) => Ok(token),
            RefState::Disposed => panic!("{}", DISPOSED_MESSAGE),
            RefState::Unset => {
                let token = create()?;
                *state = RefState::Live(token);
                Ok(token)
            }
        }
    }

    /// The current token, if one was created and not yet disposed.
    pub fn token(&self) -> Option<Token> {
        match *self.lock() {
            RefState::Live(token) => Some(token),
            _ => None,
        }
    }

    /// Mark the reference disposed. Returns the token that still needs to be
    /// released from its table, if any; later calls return `None`.
    pub fn dispose(&self) -> Option<Token> {
        let mut state = self.lock();
        let previous = std::mem::replace(&mut *state, RefState::Disposed);
        match previous {
            RefState::Live(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_disposed(&self) -> bool {
        matches!(*self.lock(), RefState::Disposed)
    }
}

impl Default for NativeRef {
    fn default() -> Self {
        Self::new()
    }
}

/// A logical object that can be referenced from the boundary by token.
pub trait StableRef: Send + Sync + Sized + 'static {
    /// The table holding tokens for this type.
    fn handle_table() -> &'static HandleTable<Self>;

    /// The object's own association.
    fn native_ref(&self) -> &NativeRef;

    /// The token for `this`, created on first use.
    fn to_token(this: &Arc<Self>) -> Result<Token> {
        this.native_ref()
            .token_or_create(|| Self::handle_table().create(Arc::clone(this)))
    }

    /// Resolve a token issued by [`StableRef::to_token`].
    ///
    /// # Panics
    /// Panics if the token was disposed.
    fn from_token(token: Token) -> Arc<Self> {
        Self::handle_table().resolve(token)
    }

    /// Release the token, if any. Idempotent.
    fn dispose_token(&self) {
        if let Some(token) = self.native_ref().dispose() {
            Self::handle_table().dispose(token);
        }
    }

    fn is_token_disposed(&self) -> bool {
        self.native_ref().is_disposed()
    }
}
