//! bloom 的核心：离屏 ping-pong、共享的 descriptor layout、四条 pipeline 以及两类 command buffer

pub mod descriptors;
pub mod offscreen;
pub mod pipelines;
pub mod recorder;
pub mod renderer;
pub mod resources;
pub mod sequencer;
pub mod state;
pub mod teardown;
pub mod uniforms;
