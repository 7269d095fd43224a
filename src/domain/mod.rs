pub mod health;
pub mod room;
pub mod user;
pub mod vote;
