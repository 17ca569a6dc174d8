use crate::index::DESCRIPTOR_SIZE;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// 核心操作的错误类型
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 图片中没有提取到任何可用的特征点
    #[error("图片中没有可用的特征点")]
    NoDescriptors,
    /// 图片不在当前索引中
    #[error("图片 {0} 不存在")]
    NotFound(i64),
    /// 图片已经被索引，不支持覆盖写入
    #[error("图片 {0} 已存在")]
    AlreadyExists(i64),
    /// 点 ID 无法解析为图片 ID，说明索引和映射表已经失去同步
    #[error("点 {0} 无法解析为图片，索引与映射表不一致")]
    Inconsistency(u64),
    /// 持久化的描述符数据长度不是单个描述符长度的整数倍
    #[error("描述符数据损坏：长度 {0} 不是 {DESCRIPTOR_SIZE} 的倍数")]
    CorruptDescriptors(usize),
    #[error("存储层错误")]
    Store(#[from] sqlx::Error),
    #[error("索引层错误: {0}")]
    Index(anyhow::Error),
}
