mod candidate;
mod config;
mod context;
mod document;
mod error;
mod memory;
mod ops;
mod overlay;
mod range;
mod source;
mod trigger;

pub use crate::candidate::*;
pub use crate::config::*;
pub use crate::context::*;
pub use crate::document::*;
pub use crate::error::*;
pub use crate::memory::*;
pub use crate::ops::*;
pub use crate::overlay::*;
pub use crate::range::*;
pub use crate::source::*;
pub use crate::trigger::*;
