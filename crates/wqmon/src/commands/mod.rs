pub mod extract;
pub mod plot;
