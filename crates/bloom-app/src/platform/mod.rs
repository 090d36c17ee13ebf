pub mod camera;
pub mod input_manager;
pub mod timer;
