//! 资源释放顺序
//!
//! 每组资源用一张创建顺序表描述，`destroy` 按逆序遍历同一张表

/// 按创建的逆序遍历
pub fn teardown_order<T: Copy>(creation_order: &[T]) -> impl Iterator<Item = T> + '_ {
    creation_order.iter().rev().copied()
}

/// 先释放旧的，再创建新的
pub fn recreate<T>(previous: Option<T>, release: impl FnOnce(T), create: impl FnOnce() -> T) -> T {
    if let Some(previous) = previous {
        release(previous);
    }
    create()
}
