pub mod entity;
pub mod error;
pub mod layout;
pub mod port;
