use std::path::Path;

use anyhow::Context;
use ash::vk;

use bloom_gfx::{
    descriptors::sampler::{GfxSampler, GfxSamplerDesc},
    gfx::Gfx,
    resources::{
        image::{GfxImage, GfxImageCreateInfo},
        image_view::{GfxImageView, GfxImageViewDesc},
    },
};

/// 6 个面纵向排列的 RGBA8 像素，顺序为 +X, -X, +Y, -Y, +Z, -Z
///
/// 每个面在内存中连续，可以直接作为 6 个 layer 上传
#[derive(Debug, Clone, PartialEq)]
pub struct CubemapFaces {
    face_size: u32,
    pixels: Vec<u8>,
}

impl CubemapFaces {
    pub const FACE_COUNT: u32 = 6;

    /// 要求 height == 6 * width
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> anyhow::Result<Self> {
        anyhow::ensure!(width > 0, "cubemap image is empty");
        anyhow::ensure!(
            width.checked_mul(Self::FACE_COUNT) == Some(height),
            "cubemap image must be a vertical strip of 6 square faces, got {}x{}",
            width,
            height
        );
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|texels| texels.checked_mul(4))
            .with_context(|| format!("cubemap {}x{} is too large", width, height))?;
        anyhow::ensure!(
            pixels.len() == expected_len,
            "cubemap pixel data size mismatch: {} bytes for {}x{}",
            pixels.len(),
            width,
            height
        );
        Ok(Self {
            face_size: width,
            pixels,
        })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let image = image::open(path).with_context(|| format!("failed to open cubemap {}", path.display()))?.into_rgba8();
        let (width, height) = image.dimensions();
        Self::from_rgba8(width, height, image.into_raw()).with_context(|| format!("invalid cubemap {}", path.display()))
    }

    #[inline]
    pub fn face_size(&self) -> u32 {
        self.face_size
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// skybox 使用的 cube 贴图
///
/// # Destroy
/// 需要手动调用 `destroy`
pub struct Cubemap {
    image: GfxImage,
    view: GfxImageView,
    sampler: GfxSampler,
}

impl Cubemap {
    pub const FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;

    pub fn upload(faces: &CubemapFaces, name: &str) -> Self {
        let _span = tracy_client::span!("Cubemap::upload");
        let face_extent = vk::Extent2D {
            width: faces.face_size(),
            height: faces.face_size(),
        };
        let image = GfxImage::new(
            &GfxImageCreateInfo::new_cube_info(
                face_extent,
                Self::FORMAT,
                vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
            ),
            name,
        );

        // stage buffer 在命令执行完成之后才释放
        let stage_buffer = Gfx::get().one_time_exec(|cmd| image.transfer_data(cmd, faces.pixels()), format!("{name}-upload"));
        stage_buffer.destroy();

        let view = GfxImageView::new(image.handle(), GfxImageViewDesc::new_cube(Self::FORMAT), name);
        let sampler = GfxSampler::new(GfxSamplerDesc::clamp_to_edge(), name);

        Self { image, view, sampler }
    }

    pub fn load(path: &Path, name: &str) -> anyhow::Result<Self> {
        let faces = CubemapFaces::load(path)?;
        log::info!("cubemap loaded: {} ({}px faces)", path.display(), faces.face_size());
        Ok(Self::upload(&faces, name))
    }

    /// 采样时 image 处于 SHADER_READ_ONLY_OPTIMAL
    pub fn descriptor_image_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo {
            sampler: self.sampler.handle(),
            image_view: self.view.handle(),
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }

    pub fn destroy(self) {
        self.view.destroy();
        self.image.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_strip_faces() {
        let width = 2;
        let pixels: Vec<u8> = (0..6u8).flat_map(|face| std::iter::repeat_n(face, 2 * 2 * 4)).collect();
        let faces = CubemapFaces::from_rgba8(width, 6 * width, pixels).unwrap();

        assert_eq!(faces.face_size(), 2);
        for (face, texels) in faces.pixels().chunks(2 * 2 * 4).enumerate() {
            assert!(texels.iter().all(|p| *p == face as u8));
        }
    }

    #[test]
    fn test_rejects_non_strip() {
        assert!(CubemapFaces::from_rgba8(4, 4, vec![0; 64]).is_err());
        assert!(CubemapFaces::from_rgba8(4, 12, vec![0; 192]).is_err());
        assert!(CubemapFaces::from_rgba8(0, 0, vec![]).is_err());
    }

    #[test]
    fn test_rejects_wrong_size() {
        assert!(CubemapFaces::from_rgba8(2, 12, vec![0; 10]).is_err());
    }

    #[test]
    fn test_huge_dimensions_are_errors() {
        // 16384 * 98304 * 4 超出 u32
        assert!(CubemapFaces::from_rgba8(16384, 6 * 16384, vec![0; 16]).is_err());
        assert!(CubemapFaces::from_rgba8(u32::MAX, u32::MAX, vec![]).is_err());
        assert!(CubemapFaces::from_rgba8(u32::MAX / 6, (u32::MAX / 6) * 6, vec![]).is_err());
    }
}
