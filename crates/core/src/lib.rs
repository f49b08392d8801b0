pub mod capture;
pub mod detection;
pub mod gallery;
pub mod pipeline;
pub mod publishing;
pub mod shared;
