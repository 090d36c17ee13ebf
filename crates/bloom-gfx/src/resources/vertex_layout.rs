use ash::vk;

/// 顶点 buffer 的布局，供 pipeline 的 vertex input state 使用
pub trait GfxVertexLayout {
    fn vertex_input_bindings() -> Vec<vk::VertexInputBindingDescription>;

    fn vertex_input_attributes() -> Vec<vk::VertexInputAttributeDescription>;

    /// 单个顶点的字节数
    fn stride() -> u32;
}
