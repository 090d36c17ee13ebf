use std::path::{Path, PathBuf};

/// 统一资源路径管理
///
/// 所有路径基于工作区根目录（通过 `CARGO_MANIFEST_DIR` 推导）。
/// 避免使用硬编码相对路径，确保在不同构建环境下路径一致。
///
/// # 使用示例
/// ```ignore
/// let root = BloomPath::shader_src_root();                         // shaders/
/// let shader = BloomPath::shader_path("shaders/bloom", "skybox.vert"); // shaders/bloom/skybox.vert.spv
/// ```
pub struct BloomPath {}
// 核心路径
impl BloomPath {
    /// 获取工作区根目录
    pub fn workspace_path() -> PathBuf {
        // 当前 crate 位于 <workspace>/crates/bloom-crate-tools
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        manifest_dir.ancestors().nth(2).unwrap_or(manifest_dir).to_path_buf()
    }

    /// 相对路径基于工作区根目录，绝对路径保持不变
    pub fn resolve(path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() { path.to_path_buf() } else { Self::workspace_path().join(path) }
    }
}
// 根目录下
impl BloomPath {
    /// 着色器源码根目录：`shaders/`
    pub fn shader_src_root() -> PathBuf {
        Self::workspace_path().join("shaders")
    }

    /// 编译后的 SPIR-V 路径：`<shader_dir>/<name>.spv`
    ///
    /// `name` 带有 stage 后缀，例如 `gaussblur.frag`
    pub fn shader_path(shader_dir: impl AsRef<Path>, name: &str) -> PathBuf {
        Self::resolve(shader_dir).join(format!("{name}.spv"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_path_contains_crates_dir() {
        let workspace = BloomPath::workspace_path();
        assert!(Path::new(env!("CARGO_MANIFEST_DIR")).starts_with(&workspace));
        assert!(workspace.join("crates").is_dir());
    }

    #[test]
    fn test_shader_path_appends_spv() {
        let path = BloomPath::shader_path("shaders/bloom", "gaussblur.frag");
        assert!(path.ends_with("shaders/bloom/gaussblur.frag.spv"));
        assert!(path.starts_with(BloomPath::workspace_path()));
    }

    #[test]
    fn test_resolve_keeps_absolute_path() {
        let abs = BloomPath::workspace_path().join("bloom.toml");
        assert_eq!(BloomPath::resolve(&abs), abs);
    }
}
