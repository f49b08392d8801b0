pub mod camera;
pub mod capture_session;
