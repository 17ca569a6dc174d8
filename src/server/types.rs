use axum::body::Bytes;
use axum_typed_multipart::TryFromMultipart;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 搜索请求参数
#[derive(TryFromMultipart)]
pub struct SearchRequest {
    pub file: Bytes,
    pub distance: Option<u32>,
}

/// 搜索表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct SearchForm {
    /// 上传的图片文件
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// 允许的最大汉明距离
    pub distance: Option<u32>,
}

/// 添加请求参数
#[derive(TryFromMultipart)]
pub struct AddRequest {
    pub file: Bytes,
    pub image_id: i64,
}

/// 添加表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct AddForm {
    /// 上传的图片文件
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// 图片 ID，由调用方分配，不允许重复
    pub image_id: i64,
}

/// 删除请求
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteRequest {
    /// 要删除的图片 ID
    pub image_id: i64,
}

/// 索引状态
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// 已索引的图片数量
    pub images: usize,
    /// 已索引的特征点数量
    pub points: usize,
}
