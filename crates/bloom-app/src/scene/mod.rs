pub mod cubemap;
pub mod mesh;
pub mod vertex;
