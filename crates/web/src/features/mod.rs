pub mod admin;
pub mod progress;
pub mod registrations;
pub mod stages;
