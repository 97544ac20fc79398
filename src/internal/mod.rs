//! Internal infrastructure modules.

mod circular;
mod dispose_bag;

pub use circular::CircularPanic;
pub(crate) use circular::with_cycle_guard;
pub(crate) use dispose_bag::{BoxFutureUnit, DisposeBag};
