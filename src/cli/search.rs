use anyhow::Result;
use clap::{Parser, ValueEnum};
use tokio::task::block_in_place;

use crate::IMDBBuilder;
use crate::akaze::AkazeDetector;
use crate::cli::SubCommandExtend;
use crate::config::{AkazeOptions, Opts, SearchOptions};
use crate::matcher::Match;
use crate::utils;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub akaze: AkazeOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    /// 被搜索的图片路径
    pub image: String,
    /// 输出格式
    #[arg(long, value_enum, value_name = "FORMAT", default_value = "table")]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let db = IMDBBuilder::new(opts.conf_dir.clone()).open().await?;

        let img = block_in_place(|| utils::imread(&self.image))?;
        let descriptors = block_in_place(|| -> opencv::Result<_> {
            let mut akaze = AkazeDetector::create(&self.akaze)?;
            akaze.detect_descriptors(&img, false)
        })?;

        let mut result = db.search_descriptors(&descriptors, self.search.distance).await?;

        // 未命中时翻转图片再搜索一次
        if result.is_none() && !self.search.no_mirror {
            let descriptors = block_in_place(|| -> opencv::Result<_> {
                let mut akaze = AkazeDetector::create(&self.akaze)?;
                akaze.detect_descriptors(&img, true)
            })?;
            result = db.search_descriptors(&descriptors, self.search.distance).await?;
        }

        print_result(&result, self)
    }
}

fn print_result(result: &Option<Match>, opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            let ids: Vec<i64> = result.iter().map(|m| m.image_id).collect();
            println!("{}", serde_json::to_string_pretty(&ids)?)
        }
        OutputFormat::Table => match result {
            Some(m) => println!("{}\t{}", m.image_id, m.level),
            None => println!("未找到匹配"),
        },
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone)]
pub enum OutputFormat {
    Json,
    Table,
}
