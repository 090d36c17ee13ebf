use anyhow::Context;
use ash::vk;

use crate::{
    bloom::{
        descriptors::{BloomDescriptors, DescriptorRole, DescriptorSources},
        offscreen::OffscreenTargets,
        pipelines::{BloomPipelineKind, BloomPipelines},
        recorder::{BloomHandles, DescriptorSetHandles, MeshHandles, OffscreenHandles, PipelineHandles},
        teardown::teardown_order,
        uniforms::UniformBuffers,
    },
    config::AssetsConfig,
    scene::{
        cubemap::Cubemap,
        mesh::{Mesh, MeshData},
    },
};

const UFO_MODEL: &str = "models/retroufo.obj";
const UFO_GLOW_MODEL: &str = "models/retroufo_glow.obj";
const SKYBOX_MODEL: &str = "models/cube.obj";
const SKYBOX_TEXTURE: &str = "textures/cubemap_space.png";
const UFO_SCALE: f32 = 0.05;

pub struct BloomMeshes {
    pub ufo: Mesh,
    /// 只包含发光部分
    pub ufo_glow: Mesh,
    pub skybox: Mesh,
    pub quad: Mesh,
}

impl BloomMeshes {
    pub fn load(assets: &AssetsConfig) -> anyhow::Result<Self> {
        let _span = tracy_client::span!("BloomMeshes::load");
        let load = |relative: &str, scale: f32, name: &str| {
            let path = assets.asset_path(relative);
            let mesh = Mesh::load(&path, scale, name).with_context(|| format!("failed to load mesh {name}"))?;
            log::info!("mesh loaded: {}", path.display());
            Ok::<_, anyhow::Error>(mesh)
        };

        Ok(Self {
            ufo: load(UFO_MODEL, UFO_SCALE, "ufo")?,
            ufo_glow: load(UFO_GLOW_MODEL, UFO_SCALE, "ufo-glow")?,
            skybox: load(SKYBOX_MODEL, 1.0, "skybox")?,
            quad: Mesh::upload(&MeshData::quad(), "quad"),
        })
    }

    fn handles(&self) -> MeshHandles {
        MeshHandles {
            ufo: self.ufo.binding(),
            ufo_glow: self.ufo_glow.binding(),
            skybox: self.skybox.binding(),
            quad: self.quad.binding(),
        }
    }

    pub fn destroy(self) {
        self.ufo.destroy();
        self.ufo_glow.destroy();
        self.skybox.destroy();
        self.quad.destroy();
    }
}

/// [`BloomResources`] 中的各组资源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BloomResourceKind {
    Meshes,
    Cubemap,
    Offscreen,
    Uniforms,
    Descriptors,
    Pipelines,
}

impl BloomResourceKind {
    /// descriptor 引用 uniform、离屏 color 与 cubemap；pipeline 引用 descriptor set layout
    pub const CREATION_ORDER: [Self; 6] = [
        Self::Meshes,
        Self::Cubemap,
        Self::Offscreen,
        Self::Uniforms,
        Self::Descriptors,
        Self::Pipelines,
    ];
}

/// 创建过程中的资源，创建失败时只释放已经创建的部分
#[derive(Default)]
struct ResourceSlots {
    meshes: Option<BloomMeshes>,
    cubemap: Option<Cubemap>,
    offscreen: Option<OffscreenTargets>,
    uniforms: Option<UniformBuffers>,
    descriptors: Option<BloomDescriptors>,
    pipelines: Option<BloomPipelines>,
}

impl ResourceSlots {
    fn create_all(
        &mut self,
        assets: &AssetsConfig,
        main_render_pass: vk::RenderPass,
        color_format: vk::Format,
        depth_format: vk::Format,
    ) -> anyhow::Result<()> {
        for kind in BloomResourceKind::CREATION_ORDER {
            self.create(kind, assets, main_render_pass, color_format, depth_format)?;
        }
        Ok(())
    }

    fn create(
        &mut self,
        kind: BloomResourceKind,
        assets: &AssetsConfig,
        main_render_pass: vk::RenderPass,
        color_format: vk::Format,
        depth_format: vk::Format,
    ) -> anyhow::Result<()> {
        match kind {
            BloomResourceKind::Meshes => self.meshes = Some(BloomMeshes::load(assets)?),
            BloomResourceKind::Cubemap => {
                let cubemap = Cubemap::load(&assets.asset_path(SKYBOX_TEXTURE), "skybox-cubemap")
                    .context("failed to load skybox cubemap")?;
                self.cubemap = Some(cubemap);
            }
            BloomResourceKind::Offscreen => {
                self.offscreen = Some(OffscreenTargets::prepare(self.offscreen.take(), color_format, depth_format))
            }
            BloomResourceKind::Uniforms => self.uniforms = Some(UniformBuffers::new()),
            BloomResourceKind::Descriptors => {
                let (Some(uniforms), Some(offscreen), Some(cubemap)) = (&self.uniforms, &self.offscreen, &self.cubemap)
                else {
                    anyhow::bail!("descriptor sources are not created yet");
                };
                let descriptors = BloomDescriptors::new(|role| match role {
                    DescriptorRole::Scene => DescriptorSources {
                        vertex_ubo: uniforms.scene.descriptor_info(),
                        sampler: None,
                        fragment_ubo: None,
                    },
                    DescriptorRole::VerticalBlur => DescriptorSources {
                        vertex_ubo: uniforms.screen.descriptor_info(),
                        sampler: Some(offscreen.a.color_descriptor()),
                        fragment_ubo: Some(uniforms.vert_blur.descriptor_info()),
                    },
                    DescriptorRole::HorizontalBlur => DescriptorSources {
                        vertex_ubo: uniforms.screen.descriptor_info(),
                        sampler: Some(offscreen.b.color_descriptor()),
                        fragment_ubo: Some(uniforms.horz_blur.descriptor_info()),
                    },
                    DescriptorRole::SkyBox => DescriptorSources {
                        vertex_ubo: uniforms.skybox.descriptor_info(),
                        sampler: Some(cubemap.descriptor_image_info()),
                        fragment_ubo: None,
                    },
                });
                self.descriptors = Some(descriptors);
            }
            BloomResourceKind::Pipelines => {
                let Some(descriptors) = &self.descriptors else {
                    anyhow::bail!("descriptor set layout is not created yet");
                };
                let pipelines = BloomPipelines::new(main_render_pass, descriptors.layout(), assets)
                    .context("failed to create bloom pipelines")?;
                self.pipelines = Some(pipelines);
            }
        }
        Ok(())
    }

    /// 按创建的逆序释放，跳过没有创建的部分
    fn release(mut self) {
        for kind in teardown_order(&BloomResourceKind::CREATION_ORDER) {
            match kind {
                // Drop 中释放
                BloomResourceKind::Pipelines => drop(self.pipelines.take()),
                BloomResourceKind::Descriptors => drop(self.descriptors.take()),
                BloomResourceKind::Uniforms => {
                    if let Some(uniforms) = self.uniforms.take() {
                        uniforms.destroy();
                    }
                }
                BloomResourceKind::Offscreen => {
                    if let Some(offscreen) = self.offscreen.take() {
                        offscreen.destroy();
                    }
                }
                BloomResourceKind::Cubemap => {
                    if let Some(cubemap) = self.cubemap.take() {
                        cubemap.destroy();
                    }
                }
                BloomResourceKind::Meshes => {
                    if let Some(meshes) = self.meshes.take() {
                        meshes.destroy();
                    }
                }
            }
        }
    }
}

/// bloom 用到的所有 GPU 资源
///
/// # Destroy
/// 需要手动调用 `destroy`，按 [`BloomResourceKind::CREATION_ORDER`] 的逆序释放
pub struct BloomResources {
    slots: ResourceSlots,
}

// 创建与销毁
impl BloomResources {
    /// 离屏 color/depth 与主 render pass 使用相同的 format
    pub fn new(
        assets: &AssetsConfig,
        main_render_pass: vk::RenderPass,
        color_format: vk::Format,
        depth_format: vk::Format,
    ) -> anyhow::Result<Self> {
        let _span = tracy_client::span!("BloomResources::new");

        let mut slots = ResourceSlots::default();
        if let Err(e) = slots.create_all(assets, main_render_pass, color_format, depth_format) {
            slots.release();
            return Err(e);
        }
        Ok(Self { slots })
    }

    pub fn destroy(self) {
        let _span = tracy_client::span!("BloomResources::destroy");
        self.slots.release();
    }
}

// getters
impl BloomResources {
    #[inline]
    pub fn uniforms(&self) -> &UniformBuffers {
        self.slots.uniforms.as_ref().expect("bloom uniforms destroyed")
    }

    fn offscreen(&self) -> &OffscreenTargets {
        self.slots.offscreen.as_ref().expect("offscreen targets destroyed")
    }

    fn meshes(&self) -> &BloomMeshes {
        self.slots.meshes.as_ref().expect("bloom meshes destroyed")
    }

    fn pipelines(&self) -> &BloomPipelines {
        self.slots.pipelines.as_ref().expect("bloom pipelines destroyed")
    }

    fn descriptors(&self) -> &BloomDescriptors {
        self.slots.descriptors.as_ref().expect("bloom descriptors destroyed")
    }

    /// 录制 command buffer 需要的所有句柄
    pub fn handles(&self) -> BloomHandles {
        let pipelines = self.pipelines();
        let descriptors = self.descriptors();
        let offscreen = self.offscreen();

        BloomHandles {
            pipelines: PipelineHandles {
                layout: pipelines.layout(),
                blur: pipelines.get(BloomPipelineKind::Blur).handle(),
                phong_pass: pipelines.get(BloomPipelineKind::PhongPass).handle(),
                skybox: pipelines.get(BloomPipelineKind::SkyBox).handle(),
            },
            sets: DescriptorSetHandles {
                scene: descriptors.set(DescriptorRole::Scene),
                vertical_blur: descriptors.set(DescriptorRole::VerticalBlur),
                horizontal_blur: descriptors.set(DescriptorRole::HorizontalBlur),
                skybox: descriptors.set(DescriptorRole::SkyBox),
            },
            meshes: self.meshes().handles(),
            offscreen: OffscreenHandles {
                render_pass: offscreen.render_pass().handle(),
                framebuffer_a: offscreen.a.framebuffer().handle(),
                framebuffer_b: offscreen.b.framebuffer().handle(),
                color_b: offscreen.b.color_image(),
                extent: offscreen.a.extent(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teardown_position(kind: BloomResourceKind) -> usize {
        teardown_order(&BloomResourceKind::CREATION_ORDER).position(|k| k == kind).unwrap()
    }

    #[test]
    fn test_teardown_is_reverse_of_creation() {
        let order = teardown_order(&BloomResourceKind::CREATION_ORDER).collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                BloomResourceKind::Pipelines,
                BloomResourceKind::Descriptors,
                BloomResourceKind::Uniforms,
                BloomResourceKind::Offscreen,
                BloomResourceKind::Cubemap,
                BloomResourceKind::Meshes,
            ]
        );
    }

    #[test]
    fn test_dependents_released_first() {
        // pipeline 引用 descriptor set layout
        assert!(teardown_position(BloomResourceKind::Pipelines) < teardown_position(BloomResourceKind::Descriptors));
        // descriptor 引用 uniform、离屏 color 与 cubemap
        for source in [BloomResourceKind::Uniforms, BloomResourceKind::Offscreen, BloomResourceKind::Cubemap] {
            assert!(teardown_position(BloomResourceKind::Descriptors) < teardown_position(source), "{:?}", source);
        }
    }

    #[test]
    fn test_release_of_empty_slots_is_noop() {
        ResourceSlots::default().release();
    }
}
