pub mod components;
pub mod config;
pub mod dom;
pub mod error;
pub mod page;
pub mod scheduler;
pub mod styles;

pub use page::PageController;
