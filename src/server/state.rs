use std::sync::Arc;

use crate::IMDB;
use crate::cli::ServerCommand;
use crate::config::{AkazeOptions, SearchOptions};

/// 应用状态
pub struct AppState {
    /// 数据库与索引
    pub db: IMDB,
    /// 特征提取配置选项
    pub akaze: AkazeOptions,
    /// 搜索配置选项
    pub search: SearchOptions,
    /// 鉴权 token
    pub token: String,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(db: IMDB, opts: &ServerCommand) -> Arc<Self> {
        Arc::new(AppState {
            db,
            akaze: opts.akaze.clone(),
            search: opts.search.clone(),
            token: opts.token.clone(),
        })
    }
}
