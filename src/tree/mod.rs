mod entry;
mod navigator;
mod store;

pub use entry::*;
pub use navigator::*;
pub use store::*;
