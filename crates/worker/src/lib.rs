#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Background task primitives shared by long-lived control-plane loops.
//!
//! Nothing here is specific to schemas or addresses: the synchronizer builds its
//! watch and resync producers out of [`spawn`], [`Backoff`] and
//! [`sleep_unless_cancelled`].

mod backoff;
mod class;
mod spawn;
mod token;

pub use backoff::{Backoff, BackoffPolicy};
pub use class::TaskClass;
pub use spawn::spawn;
pub use token::{GenerationClock, sleep_unless_cancelled};
