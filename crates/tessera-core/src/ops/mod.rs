mod binary;
mod broadcast;
mod order;
mod pages;
mod reduce;
mod select;
mod structure;

pub use broadcast::*;
pub use select::*;
