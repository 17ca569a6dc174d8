use clap::Parser;
use log::{error, info};
use prometheus::{BasicAuthentication, labels};
use rand::distr::{Alphanumeric, SampleString};
use tokio::net::TcpListener;
use tokio::task::spawn_blocking;
use tokio::time::{Duration, sleep};

use crate::cli::SubCommandExtend;
use crate::config::{AkazeOptions, SearchOptions};
use crate::{IMDBBuilder, Opts, server};

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    #[command(flatten)]
    pub akaze: AkazeOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
    /// 请求验证 token，不填则随机生成
    #[arg(long, default_value_t = String::new())]
    pub token: String,
    /// prometheus 主动推送地址
    #[arg(long, value_name = "URL")]
    pub prometheus_push: Option<String>,
    /// 自定义 instance 标签值
    #[arg(long, value_name = "NAME")]
    pub prometheus_instance: Option<String>,
    /// prometheus 认证信息，格式为 username:password
    #[arg(long, value_name = "AUTH")]
    pub prometheus_auth: Option<String>,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let db = IMDBBuilder::new(opts.conf_dir.clone()).open().await?;

        let mut self_clone = self.clone();
        if self_clone.token.is_empty() {
            self_clone.token = Alphanumeric.sample_string(&mut rand::rng(), 32);
            info!("鉴权 token: {}", self_clone.token);
        }

        let state = server::AppState::new(db, &self_clone);
        let app = server::create_app(state);

        if let Some(url) = &self.prometheus_push {
            self.spawn_prometheus_push(url.clone());
        }

        info!("服务器启动：http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

impl ServerCommand {
    /// 周期性地把指标推送到 pushgateway
    fn spawn_prometheus_push(&self, url: String) {
        let instance = self.prometheus_instance.clone().unwrap_or_else(|| self.addr.clone());
        let auth = self.prometheus_auth.clone().map(|s| {
            let (username, password) = s.split_once(':').unwrap();
            (username.to_string(), password.to_string())
        });
        tokio::spawn(async move {
            loop {
                let metric_families = prometheus::gather();
                let url = url.clone();
                let instance = instance.clone();
                let auth = auth.clone();
                let r = spawn_blocking(move || {
                    prometheus::push_metrics(
                        "aksearch",
                        labels! {
                            "instance".to_string() => instance.clone(),
                        },
                        &url,
                        metric_families,
                        auth.map(|(username, password)| BasicAuthentication { username, password }),
                    )
                })
                .await
                .unwrap();
                if let Err(e) = r {
                    error!("推送指标失败: {e}");
                }
                sleep(Duration::from_secs(30)).await;
            }
        });
    }
}
