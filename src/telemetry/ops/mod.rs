pub mod extract;
pub mod analyze;
