pub mod dispatch;
pub mod motion;
pub mod request_generation;
