pub mod cache;
pub mod health;

pub use cache::get_cached_value;
pub use health::health_check;
