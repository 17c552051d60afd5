pub mod power;
pub mod status;
