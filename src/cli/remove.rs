use anyhow::Result;
use clap::Parser;

use crate::IMDBBuilder;
use crate::cli::SubCommandExtend;
use crate::config::Opts;

#[derive(Parser, Debug, Clone)]
pub struct RemoveCommand {
    /// 要删除的图片 ID
    pub image_id: i64,
}

impl SubCommandExtend for RemoveCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let db = IMDBBuilder::new(opts.conf_dir.clone()).open().await?;
        db.remove(self.image_id).await?;
        println!("已删除图片 {}", self.image_id);
        Ok(())
    }
}
