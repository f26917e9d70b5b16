#![deny(missing_docs)]

//! This crate implements [BTMap], an ordered map held in a B-tree.
//!
//! Nodes split when they fill, and borrow from or merge with a sibling when they
//! fall below half full, so every leaf stays at the same depth.
//!
//! Most of the implementation is in the [bt] module, see [bt::BTMap].
//!
//! # Example
//!
//! ```
//!     use btmap::BTMap;
//!     let mut mymap = BTMap::new();
//!     mymap.insert("England", "London");
//!     mymap.insert("France", "Paris");
//!     println!("The capital of France is {}", mymap["France"]);
//!     mymap.remove("England");
//!     assert!(mymap.get("England").is_none());
//! ```
//!
//!# Features
//!
//! This crate supports the following cargo features:
//! - `check-invariants` : validates the whole tree after every insert and remove, panicking on a fault.
//!
//!# Logging
//!
//! Splits, borrows, merges and root changes are reported at trace level through the [log] crate.

/// With feature check-invariants, panics if the map fails [bt::BTMap::check], otherwise does nothing.
#[cfg(feature = "check-invariants")]
macro_rules! check_invariants {
    ( $map: expr ) => {
        if let Err(e) = $map.check() {
            panic!("BTMap invariant violated: {}", e);
        }
    };
}

/// With feature check-invariants, panics if the map fails [bt::BTMap::check], otherwise does nothing.
#[cfg(not(feature = "check-invariants"))]
macro_rules! check_invariants {
    ( $map: expr ) => {};
}

/// Module with version of BTMap that allows the order M to be specified as generic constant.
pub mod bt;

mod check;
mod dump;

pub use check::CheckError;

/// Default order ( a node splits when it reaches DM elements, so 3 gives a 2-3 tree ).
pub const DM: usize = 3;

/// BTMap with default order [DM].
pub type BTMap<K, V> = bt::BTMap<K, V, DM>;

// Tests.

/* mimalloc cannot be used with miri */
#[cfg(all(test, not(miri)))]
use mimalloc::MiMalloc;

#[cfg(all(test, not(miri)))]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[cfg(test)]
mod mytests;
