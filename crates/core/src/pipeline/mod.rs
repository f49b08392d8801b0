pub mod annotation;
pub mod cycle_logger;
pub mod loop_controller;
pub mod recognition_engine;
pub mod render_sink;
