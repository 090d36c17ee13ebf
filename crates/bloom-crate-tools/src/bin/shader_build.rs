//! 将 shaders 目录下的所有 glsl 文件编译为 spv 文件，输出到同一目录下
//!
//! `gaussblur.vert` 会被编译为 `gaussblur.vert.spv`

use std::path::{Path, PathBuf};

use bloom_crate_tools::init_log::init_log;
use bloom_crate_tools::resource::BloomPath;
use rayon::prelude::*;

/// shader 的 stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderStage {
    /// 根据 shader 文件名获取 shader stage
    fn from_file_name(shader_name: &str) -> Option<Self> {
        if shader_name.ends_with(".vert") {
            Some(Self::Vertex)
        } else if shader_name.ends_with(".frag") {
            Some(Self::Fragment)
        } else if shader_name.ends_with(".comp") {
            Some(Self::Compute)
        } else {
            None
        }
    }

    fn glslc_stage(self) -> &'static str {
        match self {
            Self::Vertex => "vert",
            Self::Fragment => "frag",
            Self::Compute => "comp",
        }
    }
}

/// 一个具体的编译任务
#[derive(Debug)]
struct ShaderCompileTask {
    shader_path: PathBuf,
    output_path: PathBuf,
    shader_stage: ShaderStage,
}

impl ShaderCompileTask {
    fn new(shader_path: &Path) -> Option<Self> {
        let shader_name = shader_path.file_name()?.to_str()?;
        let shader_stage = ShaderStage::from_file_name(shader_name)?;

        let mut output_name = shader_name.to_string();
        output_name.push_str(".spv");

        Some(Self {
            shader_path: shader_path.to_path_buf(),
            output_path: shader_path.with_file_name(output_name),
            shader_stage,
        })
    }

    /// 根据 cmd 执行的结果，处理输出信息
    fn process_cmd_output(&self, output: std::process::Output) -> bool {
        if !output.stdout.is_empty() {
            log::info!("stdout: {stdout}", stdout = String::from_utf8_lossy(&output.stdout));
        }
        if !output.stderr.is_empty() {
            log::error!("stderr: {stderr}", stderr = String::from_utf8_lossy(&output.stderr));
        }
        output.status.success()
    }

    /// 使用 glslc 编译 glsl 文件
    fn build(&self) -> bool {
        let output = std::process::Command::new("glslc")
            .arg(format!("-fshader-stage={}", self.shader_stage.glslc_stage()))
            .arg("-g")
            .arg("--target-env=vulkan1.3")
            .arg("-o")
            .arg(&self.output_path)
            .arg(&self.shader_path)
            .output();

        match output {
            Ok(output) => self.process_cmd_output(output),
            Err(e) => {
                log::error!("failed to run glslc for {:?}: {}", self.shader_path, e);
                false
            }
        }
    }
}

fn main() {
    init_log();

    let shader_root = BloomPath::shader_src_root();
    log::info!("shader src: {:?}", shader_root);

    let tasks: Vec<ShaderCompileTask> = walkdir::WalkDir::new(&shader_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| ShaderCompileTask::new(entry.path()))
        .collect();

    let failed = tasks
        .par_iter()
        .filter(|task| {
            log::info!("compile shader: {:?}", task.shader_path);
            !task.build()
        })
        .count();

    if failed > 0 {
        log::error!("{} of {} shaders failed to compile", failed, tasks.len());
        std::process::exit(1);
    }
    log::info!("compiled {} shaders", tasks.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_from_file_name() {
        assert_eq!(ShaderStage::from_file_name("gaussblur.vert"), Some(ShaderStage::Vertex));
        assert_eq!(ShaderStage::from_file_name("gaussblur.frag"), Some(ShaderStage::Fragment));
        assert_eq!(ShaderStage::from_file_name("gaussblur.frag.spv"), None);
        assert_eq!(ShaderStage::from_file_name("README.md"), None);
    }

    #[test]
    fn test_output_path_sits_next_to_source() {
        let task = ShaderCompileTask::new(Path::new("shaders/bloom/skybox.frag")).unwrap();
        assert_eq!(task.output_path, Path::new("shaders/bloom/skybox.frag.spv"));
        assert_eq!(task.shader_stage, ShaderStage::Fragment);
    }
}
