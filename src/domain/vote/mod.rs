pub mod dto;
pub mod entity;
pub mod estimate;
pub mod handler;
pub mod service;

pub use estimate::Estimate;
