//! 针对索引协调器的端到端测试：添加、搜索、删除、重建
//!
//! 描述符由确定性的伪随机数生成，两组不同种子的随机 488 位向量
//! 之间的期望距离在 244 左右，远超噪声阈值，不会互相干扰。

use std::str::FromStr;

use aksearch::config::ConfDir;
use aksearch::error::Error;
use aksearch::index::{DESCRIPTOR_SIZE, Descriptor};
use aksearch::matcher::MatchLevel;
use aksearch::IMDBBuilder;
use tempfile::TempDir;

fn conf_dir(dir: &TempDir) -> ConfDir {
    ConfDir::from_str(dir.path().to_str().unwrap()).unwrap()
}

fn descriptor(seed: u64) -> Descriptor {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1);
    let mut descriptor = [0u8; DESCRIPTOR_SIZE];
    for byte in descriptor.iter_mut() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        *byte = state as u8;
    }
    descriptor
}

fn descriptors(seed: u64, count: usize) -> Vec<Descriptor> {
    (0..count).map(|i| descriptor(seed * 1000 + i as u64)).collect()
}

#[tokio::test]
async fn ingest_then_search_returns_self() {
    let dir = TempDir::new().unwrap();
    let db = IMDBBuilder::new(conf_dir(&dir)).open().await.unwrap();

    db.ingest(1, descriptors(1, 8)).await.unwrap();
    db.ingest(2, descriptors(2, 8)).await.unwrap();

    // 与图片 1 完全相同的描述符，每个点的距离都是 0，等级 0 达标
    let m = db.search_descriptors(&descriptors(1, 8), 65).await.unwrap().unwrap();
    assert_eq!(m.image_id, 1);
    assert_eq!(m.level, MatchLevel::Level(0));

    let m = db.search_descriptors(&descriptors(2, 8), 65).await.unwrap().unwrap();
    assert_eq!(m.image_id, 2);
}

#[tokio::test]
async fn unrelated_query_returns_empty() {
    let dir = TempDir::new().unwrap();
    let db = IMDBBuilder::new(conf_dir(&dir)).open().await.unwrap();

    db.ingest(1, descriptors(1, 8)).await.unwrap();

    let result = db.search_descriptors(&descriptors(9, 8), 65).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn empty_query_returns_empty() {
    let dir = TempDir::new().unwrap();
    let db = IMDBBuilder::new(conf_dir(&dir)).open().await.unwrap();
    assert_eq!(db.search_descriptors(&[], 65).await.unwrap(), None);
}

#[tokio::test]
async fn ingest_without_descriptors_rejected() {
    let dir = TempDir::new().unwrap();
    let db = IMDBBuilder::new(conf_dir(&dir)).open().await.unwrap();
    assert!(matches!(db.ingest(1, vec![]).await, Err(Error::NoDescriptors)));
}

#[tokio::test]
async fn duplicate_ingest_rejected() {
    let dir = TempDir::new().unwrap();
    let db = IMDBBuilder::new(conf_dir(&dir)).open().await.unwrap();

    db.ingest(1, descriptors(1, 4)).await.unwrap();
    assert!(matches!(db.ingest(1, descriptors(3, 4)).await, Err(Error::AlreadyExists(1))));

    // 原有数据不受影响
    let m = db.search_descriptors(&descriptors(1, 4), 65).await.unwrap().unwrap();
    assert_eq!(m.image_id, 1);
}

#[tokio::test]
async fn remove_unknown_image_not_found() {
    let dir = TempDir::new().unwrap();
    let db = IMDBBuilder::new(conf_dir(&dir)).open().await.unwrap();
    assert!(matches!(db.remove(42).await, Err(Error::NotFound(42))));
}

#[tokio::test]
async fn remove_makes_image_unsearchable() {
    let dir = TempDir::new().unwrap();
    let db = IMDBBuilder::new(conf_dir(&dir)).open().await.unwrap();

    db.ingest(1, descriptors(1, 8)).await.unwrap();
    db.remove(1).await.unwrap();

    assert_eq!(db.search_descriptors(&descriptors(1, 8), 65).await.unwrap(), None);
    assert_eq!(db.stats().await.0, 0);

    // 第二次删除时图片已经不存在
    assert!(matches!(db.remove(1).await, Err(Error::NotFound(1))));
}

#[tokio::test]
async fn rebuild_restores_index_from_store() {
    let dir = TempDir::new().unwrap();
    {
        let db = IMDBBuilder::new(conf_dir(&dir)).open().await.unwrap();
        db.ingest(1, descriptors(1, 8)).await.unwrap();
        db.ingest(2, descriptors(2, 8)).await.unwrap();
    }

    // 重新打开：点 ID 全部重新分配，但搜索结果保持不变
    let db = IMDBBuilder::new(conf_dir(&dir)).open().await.unwrap();
    let (images, points, cursor) = db.stats().await;
    assert_eq!(images, 2);
    assert_eq!(points, 16);
    assert_eq!(cursor, 16);

    let m = db.search_descriptors(&descriptors(1, 8), 65).await.unwrap().unwrap();
    assert_eq!(m.image_id, 1);
    let m = db.search_descriptors(&descriptors(2, 8), 8).await.unwrap().unwrap();
    assert_eq!(m.image_id, 2);
}

#[tokio::test]
async fn delete_survives_rebuild() {
    let dir = TempDir::new().unwrap();
    {
        let db = IMDBBuilder::new(conf_dir(&dir)).open().await.unwrap();
        db.ingest(1, descriptors(1, 8)).await.unwrap();
        db.ingest(2, descriptors(2, 8)).await.unwrap();
        db.remove(1).await.unwrap();
    }

    let db = IMDBBuilder::new(conf_dir(&dir)).open().await.unwrap();
    assert_eq!(db.search_descriptors(&descriptors(1, 8), 65).await.unwrap(), None);
    assert_eq!(db.search_descriptors(&descriptors(2, 8), 65).await.unwrap().map(|m| m.image_id), Some(2));
}
