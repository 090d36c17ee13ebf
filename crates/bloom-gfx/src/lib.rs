//! Vulkan 封装层
//!
//! 提供对 Vulkan API 的薄封装，包括设备管理、命令缓冲、描述符、render pass、管线等。
//! 所有 Vulkan 核心对象通过 [`gfx::Gfx`] 单例统一管理，简化生命周期和借用关系。

pub mod basic;
pub mod commands;
pub mod descriptors;
pub mod foundation;
pub mod gfx;
pub mod gfx_core;
pub mod pipelines;
pub mod resources;
pub mod swapchain;
