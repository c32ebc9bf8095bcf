//! Numeric building blocks: Gaussian arithmetic and count ranges

pub mod gaussian;
pub mod range;

pub use gaussian::Gaussian;
pub use range::CountRange;
