use std::path::Path;

use anyhow::Context;
use ash::vk;

use bloom_gfx::resources::buffer::GfxBuffer;

use crate::scene::vertex::VertexPUCN;

/// CPU 端的网格数据
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<VertexPUCN>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// 覆盖 [0,1]x[0,1] 的全屏 quad，配合正交投影使用
    pub fn quad() -> Self {
        let vertex = |x: f32, y: f32| VertexPUCN {
            pos: glam::vec3(x, y, 0.0),
            uv: glam::vec2(x, y),
            color: glam::Vec3::ONE,
            normal: glam::Vec3::Z,
        };
        Self {
            vertices: vec![vertex(1.0, 1.0), vertex(0.0, 1.0), vertex(0.0, 0.0), vertex(1.0, 0.0)],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// 读取 OBJ，所有 model 合并为一个网格，位置乘以 scale
    pub fn load_obj(path: &Path, scale: f32) -> anyhow::Result<Self> {
        let load_options = tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        };
        let (models, materials) =
            tobj::load_obj(path, &load_options).with_context(|| format!("failed to load mesh {}", path.display()))?;
        // 缺少 mtl 文件不影响几何数据
        let materials = materials.unwrap_or_else(|e| {
            log::warn!("mesh {}: no materials ({})", path.display(), e);
            Vec::new()
        });

        let mesh = Self::from_models(&models, &materials, scale);
        anyhow::ensure!(!mesh.indices.is_empty(), "mesh {} has no triangles", path.display());
        log::info!(
            "mesh loaded: {} ({} vertices, {} indices)",
            path.display(),
            mesh.vertices.len(),
            mesh.indices.len()
        );
        Ok(mesh)
    }

    /// 缺少 uv 时为 0，缺少法线时为 +Z；
    /// 颜色依次取顶点色、材质 diffuse，都没有时为白色
    pub fn from_models(models: &[tobj::Model], materials: &[tobj::Material], scale: f32) -> Self {
        let mut mesh = Self::default();
        for model in models {
            let src = &model.mesh;
            let vertex_count = src.positions.len() / 3;
            let material_color = src
                .material_id
                .and_then(|id| materials.get(id))
                .and_then(|material| material.diffuse)
                .map(glam::Vec3::from_array);

            let base_index = mesh.vertices.len() as u32;
            mesh.vertices.extend((0..vertex_count).map(|i| {
                let vec3_at = |data: &[f32]| {
                    (data.len() >= 3 * (i + 1)).then(|| glam::vec3(data[3 * i], data[3 * i + 1], data[3 * i + 2]))
                };
                let uv = (src.texcoords.len() >= 2 * (i + 1))
                    .then(|| glam::vec2(src.texcoords[2 * i], src.texcoords[2 * i + 1]))
                    .unwrap_or(glam::Vec2::ZERO);

                VertexPUCN {
                    pos: vec3_at(&src.positions).unwrap_or_default() * scale,
                    uv,
                    color: vec3_at(&src.vertex_color).or(material_color).unwrap_or(glam::Vec3::ONE),
                    normal: vec3_at(&src.normals).unwrap_or(glam::Vec3::Z),
                }
            }));
            mesh.indices.extend(src.indices.iter().map(|idx| base_index + idx));
        }
        mesh
    }
}

/// 录制命令需要的 mesh 句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBinding {
    pub vertex_buffer: vk::Buffer,
    pub index_buffer: vk::Buffer,
    pub index_count: u32,
}

/// GPU 端的网格，加载完成后不可变
///
/// # Destroy
/// buffer 在 Drop 中释放
pub struct Mesh {
    vertex_buffer: GfxBuffer,
    index_buffer: GfxBuffer,
    index_count: u32,
}

impl Mesh {
    /// 经由 stage buffer 上传到 device local 内存
    pub fn upload(data: &MeshData, name: &str) -> Self {
        let _span = tracy_client::span!("Mesh::upload");
        let vertex_buffer = GfxBuffer::new_device_local(
            size_of_val(data.vertices.as_slice()) as vk::DeviceSize,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            format!("{name}-vertex"),
        );
        vertex_buffer.transfer_data_sync(&data.vertices);

        let index_buffer = GfxBuffer::new_device_local(
            size_of_val(data.indices.as_slice()) as vk::DeviceSize,
            vk::BufferUsageFlags::INDEX_BUFFER,
            format!("{name}-index"),
        );
        index_buffer.transfer_data_sync(&data.indices);

        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }

    pub fn load(path: &Path, scale: f32, name: &str) -> anyhow::Result<Self> {
        Ok(Self::upload(&MeshData::load_obj(path, scale)?, name))
    }

    #[inline]
    pub fn binding(&self) -> MeshBinding {
        MeshBinding {
            vertex_buffer: self.vertex_buffer.vk_buffer(),
            index_buffer: self.index_buffer.vk_buffer(),
            index_count: self.index_count,
        }
    }

    pub fn destroy(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_geometry() {
        let quad = MeshData::quad();
        let positions: Vec<glam::Vec3> = quad.vertices.iter().map(|v| v.pos).collect();
        assert_eq!(
            positions,
            vec![
                glam::vec3(1.0, 1.0, 0.0),
                glam::vec3(0.0, 1.0, 0.0),
                glam::vec3(0.0, 0.0, 0.0),
                glam::vec3(1.0, 0.0, 0.0),
            ]
        );
        assert_eq!(quad.vertices[1].uv, glam::vec2(0.0, 1.0));
        assert!(quad.vertices.iter().all(|v| v.color == glam::Vec3::ONE && v.normal == glam::Vec3::Z));
        assert_eq!(quad.indices, vec![0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn test_from_models_defaults_and_scale() {
        let mesh = tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 20.0, 0.0, 0.0, 0.0, 20.0, 0.0],
            indices: vec![0, 1, 2],
            material_id: Some(0),
            ..Default::default()
        };
        let material = tobj::Material {
            diffuse: Some([1.0, 0.5, 0.25]),
            ..Default::default()
        };
        let data = MeshData::from_models(&[tobj::Model::new(mesh, "tri".to_string())], &[material], 0.05);

        assert_eq!(data.vertices.len(), 3);
        assert_eq!(data.vertices[1].pos, glam::vec3(1.0, 0.0, 0.0));
        assert_eq!(data.vertices[0].uv, glam::Vec2::ZERO);
        assert_eq!(data.vertices[0].normal, glam::Vec3::Z);
        assert_eq!(data.vertices[2].color, glam::vec3(1.0, 0.5, 0.25));
    }

    #[test]
    fn test_from_models_merges_with_index_offset() {
        let triangle = || tobj::Mesh {
            positions: vec![0.0; 9],
            vertex_color: vec![0.1, 0.2, 0.3, 0.1, 0.2, 0.3, 0.1, 0.2, 0.3],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        let models = [
            tobj::Model::new(triangle(), "a".to_string()),
            tobj::Model::new(triangle(), "b".to_string()),
        ];
        let data = MeshData::from_models(&models, &[], 1.0);

        assert_eq!(data.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(data.vertices[4].color, glam::vec3(0.1, 0.2, 0.3));
    }
}
