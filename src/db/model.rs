use sqlx::FromRow;

/// 图片记录
#[derive(Debug, FromRow)]
pub struct ImageRecord {
    /// 图片 ID，由外部系统分配
    pub id: i64,
    /// 描述符数据，按行连续存放的 61 字节向量
    pub descriptor: Vec<u8>,
}
