pub mod clock;
pub mod naming;
