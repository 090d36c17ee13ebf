use std::collections::HashMap;
use std::ffi::CStr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ash::vk;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

/// # Destroy
/// 需要手动调用 `destroy`
pub struct GfxShaderModule {
    handle: vk::ShaderModule,

    #[cfg(debug_assertions)]
    destroyed: bool,
}
impl GfxShaderModule {
    /// * path - spv 文件路径
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        let mut file =
            std::fs::File::open(path).with_context(|| format!("failed to open shader: {}", path.display()))?;
        let shader_code =
            ash::util::read_spv(&mut file).with_context(|| format!("invalid spir-v file: {}", path.display()))?;

        let gfx_device = Gfx::get().gfx_device();
        let shader_module_info = vk::ShaderModuleCreateInfo::default().code(&shader_code);
        let handle = unsafe { gfx_device.create_shader_module(&shader_module_info, None).unwrap() };
        let shader_module = Self {
            handle,

            #[cfg(debug_assertions)]
            destroyed: false,
        };
        gfx_device.set_debug_name(&shader_module, path.to_string_lossy());
        Ok(shader_module)
    }

    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.handle
    }

    #[inline]
    pub fn destroy(mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_shader_module(self.handle, None);
        }
        #[cfg(debug_assertions)]
        {
            self.destroyed = true;
        }
    }
}
impl Drop for GfxShaderModule {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        debug_assert!(self.destroyed, "GfxShaderModule must be destroyed manually before drop.");
    }
}
impl DebugType for GfxShaderModule {
    fn debug_type_name() -> &'static str {
        "GfxShaderModule"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

/// 以路径为 key 缓存 shader module
///
/// pipeline 创建完成之后即可整体销毁
#[derive(Default)]
pub struct GfxShaderModuleCache {
    shader_modules: HashMap<PathBuf, GfxShaderModule>,
}
impl GfxShaderModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, path: &Path) -> anyhow::Result<&GfxShaderModule> {
        if !self.shader_modules.contains_key(path) {
            let module = GfxShaderModule::new(path)?;
            self.shader_modules.insert(path.to_path_buf(), module);
        }
        Ok(&self.shader_modules[path])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shader_modules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shader_modules.is_empty()
    }

    pub fn destroy(mut self) {
        let shader_modules = std::mem::take(&mut self.shader_modules);
        shader_modules.into_values().for_each(|module| module.destroy());
    }
}

#[derive(Clone, Debug)]
pub struct GfxShaderStageInfo {
    pub stage: vk::ShaderStageFlags,
    pub entry_point: &'static CStr,
    pub path: PathBuf,
}
