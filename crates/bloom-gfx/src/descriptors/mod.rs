pub mod binding_layout;
pub mod descriptor;
pub mod descriptor_pool;
pub mod descriptor_write;
pub mod sampler;
