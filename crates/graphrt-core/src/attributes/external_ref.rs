//! Caller-owned opaque references.
//!
//! An [`ExternalRef`] wraps a pointer minted by native code. The runtime never
//! dereferences it. Two references compare by pointer identity unless they
//! carry an equivalence strategy, in which case the strategy decides.
//!
//! A strategy must behave like a mathematical equivalence for as long as any
//! store holds references created with it:
//!
//! - `equals` is reflexive, symmetric and transitive;
//! - `equals(a, b)` implies `hash(a) == hash(b)`;
//! - results are stable over time;
//! - neither function calls back into the store being accessed, and neither
//!   unwinds.
//!
//! References built with different strategy objects never compare equal.

use std::ffi::c_void;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Equality and hashing of caller references by address.
pub trait RefEquivalence: Send + Sync {
    /// Hash of the referenced value.
    fn hash(&self, addr: usize) -> u64;

    /// Whether two referenced values are equal.
    fn equals(&self, a: usize, b: usize) -> bool;
}

/// Opaque reference supplied by native code.
#[derive(Clone)]
pub struct ExternalRef {
    addr: usize,
    strategy: Option<Arc<dyn RefEquivalence>>,
}

impl ExternalRef {
    /// Reference compared by pointer identity.
    pub fn identity(ptr: *const c_void) -> Self {
        Self {
            addr: ptr as usize,
            strategy: None,
        }
    }

    /// Reference compared through `strategy`.
    pub fn with_strategy(ptr: *const c_void, strategy: Arc<dyn RefEquivalence>) -> Self {
        Self {
            addr: ptr as usize,
            strategy: Some(strategy),
        }
    }

    /// The wrapped pointer.
    pub fn as_ptr(&self) -> *const c_void {
        self.addr as *const c_void
    }

    /// The wrapped pointer as an integer.
    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Returns `true` for a null pointer.
    pub fn is_null(&self) -> bool {
        self.addr == 0
    }

    /// Returns `true` if a strategy decides equality.
    pub fn has_strategy(&self) -> bool {
        self.strategy.is_some()
    }
}

fn same_strategy(a: &Arc<dyn RefEquivalence>, b: &Arc<dyn RefEquivalence>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl PartialEq for ExternalRef {
    fn eq(&self, other: &Self) -> bool {
        match (&self.strategy, &other.strategy) {
            (None, None) => self.addr == other.addr,
            (Some(a), Some(b)) if same_strategy(a, b) => {
                self.addr == other.addr || a.equals(self.addr, other.addr)
            }
            _ => false,
        }
    }
}

impl Eq for ExternalRef {}

impl Hash for ExternalRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.strategy {
            Some(strategy) => state.write_u64(strategy.hash(self.addr)),
            None => self.addr.hash(state),
        }
    }
}

impl fmt::Debug for ExternalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalRef")
            .field("addr", &format_args!("{:#x}", self.addr))
            .field("custom", &self.strategy.is_some())
            .finish()
    }
}

/// Mints references that all share one equivalence strategy.
#[derive(Clone, Default)]
pub struct RefFactory {
    strategy: Option<Arc<dyn RefEquivalence>>,
}

impl RefFactory {
    /// Factory producing identity references.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Factory producing references compared through `strategy`.
    pub fn with_strategy(strategy: Arc<dyn RefEquivalence>) -> Self {
        Self {
            strategy: Some(strategy),
        }
    }

    /// Wrap a pointer.
    pub fn make(&self, ptr: *const c_void) -> ExternalRef {
        match &self.strategy {
            Some(strategy) => ExternalRef::with_strategy(ptr, Arc::clone(strategy)),
            None => ExternalRef::identity(ptr),
        }
    }
}

impl fmt::Debug for RefFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefFactory")
            .field("custom", &self.strategy.is_some())
            .finish()
    }
}
