pub mod signature;
pub mod validation;
