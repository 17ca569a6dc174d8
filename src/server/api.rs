use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum_auth::AuthBearer;
use axum_typed_multipart::TypedMultipart;
use log::info;
use serde_json::{Value, json};
use tokio::task::block_in_place;

use super::error::{AppError, Result, Unauthorized};
use super::state::AppState;
use super::types::*;
use crate::akaze::AkazeDetector;
use crate::{metrics, utils};

/// 搜索一张图片
///
/// 返回至多一个图片 ID，空列表表示没有匹配。
/// 直接搜索未命中且开启了镜像搜索时，会翻转图片再搜索一次。
#[utoipa::path(
    post,
    path = "/search",
    request_body(content = SearchForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = [i64]),
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    data: TypedMultipart<SearchRequest>,
) -> Result<Json<Vec<i64>>> {
    let max_distance = data.distance.unwrap_or(state.search.distance);

    let start = Instant::now();
    info!("正在搜索上传图片");

    let img = block_in_place(|| utils::imdecode(&data.file))?;
    let descriptors = block_in_place(|| -> opencv::Result<_> {
        let mut akaze = AkazeDetector::create(&state.akaze)?;
        akaze.detect_descriptors(&img, false)
    })?;

    let mut result = state.db.search_descriptors(&descriptors, max_distance).await?;

    if result.is_none() && !state.search.no_mirror {
        let descriptors = block_in_place(|| -> opencv::Result<_> {
            let mut akaze = AkazeDetector::create(&state.akaze)?;
            akaze.detect_descriptors(&img, true)
        })?;
        result = state.db.search_descriptors(&descriptors, max_distance).await?;
    }

    metrics::observe_search_duration(start.elapsed().as_secs_f32());
    metrics::inc_search_count(&result);
    if let Some(m) = &result {
        info!("命中图片 {}（{}）", m.image_id, m.level);
    }

    Ok(Json(result.map(|m| m.image_id).into_iter().collect()))
}

/// 添加一张图片到索引
#[utoipa::path(
    post,
    path = "/add",
    request_body(content = AddForm, content_type = "multipart/form-data")
)]
pub async fn add_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
    data: TypedMultipart<AddRequest>,
) -> Result<Json<Value>> {
    check_token(&state, &token)?;

    let descriptors = block_in_place(|| -> opencv::Result<_> {
        let img = utils::imdecode(&data.file)?;
        let mut akaze = AkazeDetector::create(&state.akaze)?;
        akaze.detect_descriptors(&img, false)
    })?;

    state.db.ingest(data.image_id, descriptors).await?;
    metrics::set_indexed_points(state.db.stats().await.1);
    Ok(Json(json!({})))
}

/// 从索引中删除一张图片
#[utoipa::path(post, path = "/delete", request_body = DeleteRequest)]
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
    data: Json<DeleteRequest>,
) -> Result<Json<Value>> {
    check_token(&state, &token)?;

    state.db.remove(data.image_id).await?;
    metrics::set_indexed_points(state.db.stats().await.1);
    Ok(Json(json!({})))
}

/// 查询索引状态
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, body = StatsResponse),
    )
)]
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let (images, points, _) = state.db.stats().await;
    Json(StatsResponse { images, points })
}

fn check_token(state: &AppState, token: &str) -> Result<(), AppError> {
    if token != state.token {
        return Err(Unauthorized.into());
    }
    Ok(())
}
