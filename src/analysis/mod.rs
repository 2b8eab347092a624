//! Field arithmetic, per-cell analysis and reductions, all expressed as
//! functionals run through the dispatcher.

mod arithmetic;
mod derivatives;
mod extract;
mod init;
mod reductions;

pub use arithmetic::*;
pub use derivatives::*;
pub use extract::*;
pub use init::*;
pub use reductions::*;

use crate::field::*;
use crate::functional::*;
use crate::statistics::*;
use crate::util::*;
