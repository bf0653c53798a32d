//! Reference counted values with explicit acquire and release.
//!
//! A [RefCount] owns its value together with the allocator that stored it.
//! The counting discipline is chosen by type: [Rc] counts with plain
//! arithmetic, [Arc] with atomics.
//!
//! ```
//! use tally::{Cleanup, Rc};
//!
//! struct Buffer(Vec<u8>);
//!
//! impl Cleanup for Buffer {
//!     fn cleanup(&mut self) {
//!         self.0.clear();
//!     }
//! }
//!
//! let rc = Rc::new(Buffer(vec![1, 2]));
//! let other = rc.get_ref();
//! assert_eq!(rc.count(), 2);
//!
//! unsafe { (*rc.get().as_ptr()).0.push(3) };
//! unsafe { rc.release_untracked() };
//!
//! other.release();
//! assert_eq!(rc.value().0, [1, 2, 3]);
//! rc.release();
//! ```
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub use tally_core::*;

pub use crate::{
    cleanup::Cleanup,
    counter::{Counter, Exclusive, Shared},
    never::Never,
    ref_count::{Arc, Rc, RefCount, TryNewError},
    scoped::Scoped,
};

mod cleanup;
mod counter;
#[cfg(feature = "alloc")]
mod global;
#[cfg(feature = "alloc")]
pub use global::Global;
mod never;
mod ref_count;
mod scoped;
