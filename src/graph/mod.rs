mod highlight;
mod markup;
mod pane;

pub use highlight::*;
pub use markup::*;
pub use pane::*;
