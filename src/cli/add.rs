use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use log::warn;
use regex::Regex;
use tokio::task::block_in_place;
use walkdir::WalkDir;

use crate::akaze::AkazeDetector;
use crate::cli::SubCommandExtend;
use crate::config::{AkazeOptions, Opts};
use crate::utils::{self, pb_style};
use crate::{IMDB, IMDBBuilder};

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    #[command(flatten)]
    pub akaze: AkazeOptions,
    /// 图片所在目录
    pub path: PathBuf,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,png")]
    pub suffix: String,
    /// 从文件路径中提取图片 ID 的正则表达式，需要包含 id 分组
    /// 例：`(?<id>[0-9]+)\.jpg$`，不填则直接取文件名主干
    #[arg(short, long, verbatim_doc_comment)]
    pub regex: Option<String>,
}

impl SubCommandExtend for AddCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let re_id = self.regex.as_ref().map(|re| Regex::new(re).expect("failed to build regex"));
        let re_suf = Regex::new(&format!("(?i)({})", self.suffix.replace(',', "|")))
            .expect("failed to build regex");

        let db = IMDBBuilder::new(opts.conf_dir.clone()).open().await?;

        let entries = WalkDir::new(&self.path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry.path().extension().map(|s| re_suf.is_match(&s.to_string_lossy()))
                    == Some(true)
            })
            .collect::<Vec<_>>();

        let pb = ProgressBar::new(entries.len() as u64).with_style(pb_style());
        for entry in entries {
            let path = entry.path().to_string_lossy();
            match add_one(&db, &self.akaze, re_id.as_ref(), &path).await {
                Ok(image_id) => pb.set_message(format!("已添加 {} -> {}", path, image_id)),
                Err(e) => warn!("添加 {} 失败: {:#}", path, e),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(())
    }
}

/// 解析图片 ID，提取描述符并写入数据库
async fn add_one(
    db: &IMDB,
    akaze_opts: &AkazeOptions,
    re_id: Option<&Regex>,
    path: &str,
) -> Result<i64> {
    let image_id = parse_image_id(re_id, path)?;
    let descriptors = block_in_place(|| -> opencv::Result<_> {
        let img = utils::imread(path)?;
        let mut akaze = AkazeDetector::create(akaze_opts)?;
        akaze.detect_descriptors(&img, false)
    })?;
    db.ingest(image_id, descriptors).await?;
    Ok(image_id)
}

/// 图片 ID 取自文件名主干，或正则表达式的 id 分组
fn parse_image_id(re_id: Option<&Regex>, path: &str) -> Result<i64> {
    let id = match re_id {
        Some(re) => re
            .captures(path)
            .and_then(|captures| captures.name("id"))
            .with_context(|| format!("无法从 {} 提取图片 ID", path))?
            .as_str()
            .to_string(),
        None => std::path::Path::new(path)
            .file_stem()
            .with_context(|| format!("无法从 {} 提取图片 ID", path))?
            .to_string_lossy()
            .into_owned(),
    };
    id.parse().with_context(|| format!("图片 ID {} 不是整数", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_id_from_stem() {
        assert_eq!(parse_image_id(None, "/data/images/12345.jpg").unwrap(), 12345);
        assert!(parse_image_id(None, "/data/images/cover.jpg").is_err());
    }

    #[test]
    fn test_parse_image_id_from_regex() {
        let re = Regex::new(r"img_(?<id>[0-9]+)\.png$").unwrap();
        assert_eq!(parse_image_id(Some(&re), "/data/img_42.png").unwrap(), 42);
        assert!(parse_image_id(Some(&re), "/data/other_42.png").is_err());
    }
}
