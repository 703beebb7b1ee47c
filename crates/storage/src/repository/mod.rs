pub mod progress;
pub mod registration;
pub mod stage;
