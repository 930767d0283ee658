pub mod jwt;
pub mod reference;
