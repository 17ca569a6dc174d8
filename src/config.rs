use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;
use crate::matcher::MAX_DISTANCE;

static CONF_DIR: LazyLock<ConfDir> = LazyLock::new(|| {
    let proj_dirs = ProjectDirs::from("", "", "aksearch").expect("failed to get project dir");
    ConfDir { path: proj_dirs.config_dir().to_path_buf() }
});

fn default_config_dir() -> &'static str {
    CONF_DIR.path().to_str().unwrap()
}

/// AKAZE 特征提取相关参数
#[derive(Parser, Debug, Clone)]
pub struct AkazeOptions {
    /// AKAZE 检测器阈值，0 表示不限制候选点数量
    #[arg(long, value_name = "T", default_value_t = 0.0)]
    pub akaze_threshold: f32,
    /// AKAZE 尺度金字塔的组数
    #[arg(long, value_name = "N", default_value_t = 4)]
    pub akaze_octaves: u32,
    /// AKAZE 金字塔每组的层数
    #[arg(long, value_name = "N", default_value_t = 4)]
    pub akaze_octave_layers: u32,
}

/// 搜索相关参数
#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// 两个描述符允许的最大汉明距离，超过视为噪声
    #[arg(long, value_name = "N", default_value_t = MAX_DISTANCE, value_parser = clap::value_parser!(u32).range(0..=488))]
    pub distance: u32,
    /// 不额外搜索镜像翻转后的图片
    #[arg(long)]
    pub no_mirror: bool,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "aksearch", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// aksearch 配置文件目录
    #[arg(short, long, default_value = default_config_dir())]
    pub conf_dir: ConfDir,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 添加图片特征点到数据库并建立索引
    Add(AddCommand),
    /// 从数据库中搜索图片
    Search(SearchCommand),
    /// 删除已索引的图片
    Remove(RemoveCommand),
    /// 启动 HTTP 搜索服务
    Server(ServerCommand),
}

/// 配置目录
#[derive(Debug, Clone)]
pub struct ConfDir {
    path: PathBuf,
}

impl ConfDir {
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// 返回数据库文件的路径
    pub fn database(&self) -> PathBuf {
        self.path.join("aksearch.db")
    }
}

impl FromStr for ConfDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { path: PathBuf::from(s) })
    }
}
