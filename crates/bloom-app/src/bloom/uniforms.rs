use ash::vk;

use bloom_gfx::resources::buffer::GfxBuffer;

use crate::bloom::offscreen::TEX_DIM;

/// 顶点着色器的 binding 0
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUbo {
    pub projection: glam::Mat4,
    pub model: glam::Mat4,
}

/// blur 的采样方向，同一个着色器通过 `horizontal` 字段区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BlurDirection {
    Vertical = 0,
    Horizontal = 1,
}

/// 片元着色器的 binding 2
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlurUbo {
    pub tex_width: i32,
    pub tex_height: i32,
    pub blur_scale: f32,
    pub blur_strength: f32,
    pub horizontal: u32,
}

impl BlurUbo {
    pub fn new(direction: BlurDirection, blur_scale: f32, blur_strength: f32) -> Self {
        Self {
            tex_width: TEX_DIM as i32,
            tex_height: TEX_DIM as i32,
            blur_scale,
            blur_strength,
            horizontal: direction as u32,
        }
    }
}

/// 计算场景矩阵需要的全部输入
#[derive(Debug, Clone, PartialEq)]
pub struct SceneView {
    pub zoom: f32,
    /// 角度制
    pub rotation: glam::Vec3,
    pub camera_pos: glam::Vec3,
    /// 动画时间 [0, 1)
    pub timer: f32,
    /// 窗口宽高比
    pub aspect: f32,
}

impl SceneView {
    const FOV_Y_DEG: f32 = 45.0;
    const Z_NEAR: f32 = 0.1;
    const Z_FAR: f32 = 256.0;

    pub fn set_extent(&mut self, extent: vk::Extent2D) {
        self.aspect = extent.width as f32 / extent.height as f32;
    }

    pub fn projection(&self) -> glam::Mat4 {
        glam::Mat4::perspective_rh(Self::FOV_Y_DEG.to_radians(), self.aspect, Self::Z_NEAR, Self::Z_FAR)
    }

    fn camera_rotation(&self) -> [glam::Mat4; 3] {
        [
            glam::Mat4::from_rotation_x(self.rotation.x.to_radians()),
            glam::Mat4::from_rotation_y(self.rotation.y.to_radians()),
            glam::Mat4::from_rotation_z(self.rotation.z.to_radians()),
        ]
    }

    /// UFO：绕 Y 轴做小圆周运动，同时自转并前后摇摆
    pub fn scene_ubo(&self) -> SceneUbo {
        let angle = (self.timer * 360.0).to_radians();
        let view = glam::Mat4::from_translation(glam::vec3(0.0, -1.0, self.zoom));
        let offset = glam::vec3(angle.sin() * 0.25, 0.0, angle.cos() * 0.25) + self.camera_pos;
        let [rot_x, rot_y, rot_z] = self.camera_rotation();

        let model = view
            * glam::Mat4::from_translation(offset)
            * rot_x
            * glam::Mat4::from_rotation_x(-angle.sin() * 0.15)
            * rot_y
            * glam::Mat4::from_rotation_y(angle)
            * rot_z;

        SceneUbo {
            projection: self.projection(),
            model,
        }
    }

    /// skybox 只跟随相机旋转
    pub fn skybox_ubo(&self) -> SceneUbo {
        let [rot_x, rot_y, rot_z] = self.camera_rotation();
        SceneUbo {
            projection: self.projection(),
            model: rot_x * rot_y * rot_z,
        }
    }
}

/// 全屏 quad：[0,1] 的正交投影
pub fn screen_ubo() -> SceneUbo {
    SceneUbo {
        projection: glam::Mat4::orthographic_rh(0.0, 1.0, 0.0, 1.0, -1.0, 1.0),
        model: glam::Mat4::IDENTITY,
    }
}

/// 5 个 host 可见的 uniform buffer，常驻映射
///
/// # Destroy
/// 在 Drop 中释放
pub struct UniformBuffers {
    /// UFO 的透视矩阵
    pub scene: GfxBuffer,
    pub skybox: GfxBuffer,
    /// 全屏 quad 的正交矩阵
    pub screen: GfxBuffer,
    pub vert_blur: GfxBuffer,
    pub horz_blur: GfxBuffer,
}

impl UniformBuffers {
    pub fn new() -> Self {
        let scene_size = size_of::<SceneUbo>() as vk::DeviceSize;
        let blur_size = size_of::<BlurUbo>() as vk::DeviceSize;
        Self {
            scene: GfxBuffer::new_uniform_buffer(scene_size, "ubo-scene"),
            skybox: GfxBuffer::new_uniform_buffer(scene_size, "ubo-skybox"),
            screen: GfxBuffer::new_uniform_buffer(scene_size, "ubo-screen"),
            vert_blur: GfxBuffer::new_uniform_buffer(blur_size, "ubo-vert-blur"),
            horz_blur: GfxBuffer::new_uniform_buffer(blur_size, "ubo-horz-blur"),
        }
    }

    pub fn write_scene(&self, view: &SceneView) {
        self.scene.write_struct(&view.scene_ubo());
        self.skybox.write_struct(&view.skybox_ubo());
    }

    pub fn write_screen(&self, vert_blur: &BlurUbo, horz_blur: &BlurUbo) {
        self.screen.write_struct(&screen_ubo());
        self.vert_blur.write_struct(vert_blur);
        self.horz_blur.write_struct(horz_blur);
    }

    pub fn destroy(self) {
        self.scene.destroy();
        self.skybox.destroy();
        self.screen.destroy();
        self.vert_blur.destroy();
        self.horz_blur.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_view() -> SceneView {
        SceneView {
            zoom: -10.25,
            rotation: glam::vec3(7.5, -343.0, 0.0),
            camera_pos: glam::Vec3::ZERO,
            timer: 0.0,
            aspect: 1280.0 / 720.0,
        }
    }

    #[test]
    fn test_ubo_byte_layout() {
        assert_eq!(size_of::<SceneUbo>(), 128);
        assert_eq!(size_of::<BlurUbo>(), 20);

        let blur = BlurUbo::new(BlurDirection::Horizontal, 1.0, 1.5);
        let bytes: &[u8] = bytemuck::bytes_of(&blur);
        assert_eq!(&bytes[0..4], &256i32.to_ne_bytes());
        assert_eq!(&bytes[8..12], &1.0f32.to_ne_bytes());
        assert_eq!(&bytes[16..20], &1u32.to_ne_bytes());
    }

    #[test]
    fn test_blur_ubo_defaults() {
        let blur = BlurUbo::new(BlurDirection::Vertical, 1.0, 1.5);
        assert_eq!(blur.tex_width, 256);
        assert_eq!(blur.tex_height, 256);
        assert_eq!(blur.horizontal, 0);
    }

    #[test]
    fn test_scene_matrices_at_time_zero() {
        let view = default_view();
        let ubo = view.scene_ubo();

        // timer 为 0 时模型位于 (0, -1, zoom + 0.25)
        let origin = ubo.model.transform_point3(glam::Vec3::ZERO);
        assert!(origin.abs_diff_eq(glam::vec3(0.0, -1.0, -10.0), 1e-5));
        assert_eq!(ubo.projection, view.projection());

        let skybox = view.skybox_ubo();
        assert!(skybox.model.transform_point3(glam::Vec3::ZERO).abs_diff_eq(glam::Vec3::ZERO, 1e-6));
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut view = default_view();
        view.set_extent(vk::Extent2D {
            width: 1000,
            height: 500,
        });
        assert_eq!(view.aspect, 2.0);
        let expected = glam::Mat4::perspective_rh(45f32.to_radians(), 2.0, 0.1, 256.0);
        assert_eq!(view.scene_ubo().projection, expected);
        assert_eq!(view.skybox_ubo().projection, expected);
    }

    #[test]
    fn test_screen_ubo_maps_unit_square() {
        let ubo = screen_ubo();
        let clip = ubo.projection * ubo.model;
        assert!(clip.transform_point3(glam::vec3(0.0, 0.0, 0.0)).abs_diff_eq(glam::vec3(-1.0, -1.0, 0.5), 1e-6));
        assert!(clip.transform_point3(glam::vec3(1.0, 1.0, 0.0)).abs_diff_eq(glam::vec3(1.0, 1.0, 0.5), 1e-6));
    }
}
