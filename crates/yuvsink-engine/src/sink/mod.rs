//! The sink facade handed to the delivery side.

mod config;
mod controller;
mod error;
mod video_sink;

pub use config::SinkConfig;
pub use controller::SinkController;
pub use error::SinkError;
pub use video_sink::Sink;
