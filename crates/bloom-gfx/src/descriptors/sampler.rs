use ash::vk;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

/// sampler 参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GfxSamplerDesc {
    pub filter: vk::Filter,
    pub mipmap_mode: vk::SamplerMipmapMode,
    pub address_mode: vk::SamplerAddressMode,
    pub max_anisotropy: Option<f32>,
    pub max_lod: f32,
    pub border_color: vk::BorderColor,
}

impl Default for GfxSamplerDesc {
    /// linear + repeat
    fn default() -> Self {
        Self {
            filter: vk::Filter::LINEAR,
            mipmap_mode: vk::SamplerMipmapMode::LINEAR,
            address_mode: vk::SamplerAddressMode::REPEAT,
            max_anisotropy: None,
            max_lod: 1.0,
            border_color: vk::BorderColor::FLOAT_OPAQUE_WHITE,
        }
    }
}

impl GfxSamplerDesc {
    /// 用于采样 render target，边缘不能 wrap
    pub fn clamp_to_edge() -> Self {
        Self {
            address_mode: vk::SamplerAddressMode::CLAMP_TO_EDGE,
            ..Default::default()
        }
    }

    fn to_vk(self) -> vk::SamplerCreateInfo<'static> {
        vk::SamplerCreateInfo::default()
            .mag_filter(self.filter)
            .min_filter(self.filter)
            .mipmap_mode(self.mipmap_mode)
            .address_mode_u(self.address_mode)
            .address_mode_v(self.address_mode)
            .address_mode_w(self.address_mode)
            .anisotropy_enable(self.max_anisotropy.is_some())
            .max_anisotropy(self.max_anisotropy.unwrap_or(1.0))
            .border_color(self.border_color)
            .compare_enable(false)
            .compare_op(vk::CompareOp::NEVER)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(self.max_lod)
    }
}

/// # Destroy
/// 在 Drop 中释放
pub struct GfxSampler {
    handle: vk::Sampler,
    desc: GfxSamplerDesc,
}
impl GfxSampler {
    pub fn new(desc: GfxSamplerDesc, debug_name: &str) -> Self {
        let gfx_device = Gfx::get().gfx_device();
        let handle = unsafe { gfx_device.create_sampler(&desc.to_vk(), None).unwrap() };
        let sampler = Self { handle, desc };
        gfx_device.set_debug_name(&sampler, debug_name);
        sampler
    }

    #[inline]
    pub fn handle(&self) -> vk::Sampler {
        self.handle
    }

    #[inline]
    pub fn desc(&self) -> &GfxSamplerDesc {
        &self.desc
    }
}
impl Drop for GfxSampler {
    fn drop(&mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_sampler(self.handle, None);
        }
    }
}
impl DebugType for GfxSampler {
    fn debug_type_name() -> &'static str {
        "GfxSampler"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
