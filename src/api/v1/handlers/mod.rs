pub mod cors;
pub mod health;
