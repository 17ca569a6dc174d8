//! 图片索引协调器
//!
//! IMDB 持有描述符存储、点 ID 分配器、双向映射表和最近邻索引，
//! 负责让四者在添加、删除和重建的过程中保持一致。存储是唯一的
//! 持久化事实来源，映射表和索引都是可以从存储重建的缓存。

use indicatif::ProgressBar;
use log::{debug, error, info};
use tokio::sync::RwLock;

use crate::config::ConfDir;
use crate::db::{self, Database, crud};
use crate::error::{Error, Result};
use crate::index::{BinaryIndex, Descriptor, FlatBinaryIndex};
use crate::matcher::{Match, MatchVotes};
use crate::registry::{IdAllocator, PointRegistry};
use crate::utils;

/// 索引相关的内存状态
///
/// 整体放在一把读写锁之后：写者（添加/删除）在写锁内完成
/// 分配+绑定+入索引 或 解绑+出索引，搜索只需要读锁，互相完全并发。
struct IndexState {
    allocator: IdAllocator,
    registry: PointRegistry,
    index: Box<dyn BinaryIndex>,
}

impl IndexState {
    /// 为一张图片分配点 ID、写入映射表并加入索引
    ///
    /// 三步是一个整体，调用方负责持有写锁或独占引用
    fn bind_and_add(&mut self, image_id: i64, descriptors: &[Descriptor]) -> Result<()> {
        let point_ids: Vec<u64> = self.allocator.allocate(descriptors.len()).collect();
        self.registry.bind(image_id, &point_ids)?;
        self.index.add_with_ids(descriptors, &point_ids).map_err(Error::Index)?;
        Ok(())
    }
}

pub struct IMDB {
    pool: Database,
    state: RwLock<IndexState>,
}

pub struct IMDBBuilder {
    conf_dir: ConfDir,
    index: Box<dyn BinaryIndex>,
}

impl IMDBBuilder {
    pub fn new(conf_dir: ConfDir) -> Self {
        Self { conf_dir, index: Box::new(FlatBinaryIndex::new()) }
    }

    /// 使用自定义的索引实现
    pub fn index(mut self, index: Box<dyn BinaryIndex>) -> Self {
        self.index = index;
        self
    }

    /// 打开数据库，并从持久化的描述符重建映射表与索引
    ///
    /// 点 ID 不持久化，每次重建按图片 ID 升序重新分配；
    /// 任何一条记录损坏都会让重建失败，服务不应该带着残缺的索引启动
    pub async fn open(self) -> Result<IMDB> {
        let pool = db::init_db(self.conf_dir.database()).await?;
        let mut state = IndexState {
            allocator: IdAllocator::new(),
            registry: PointRegistry::new(),
            index: self.index,
        };

        let ids = crud::list_ids(&pool).await?;
        info!("正在从 {} 张图片重建索引", ids.len());
        let pb = ProgressBar::new(ids.len() as u64).with_style(utils::pb_style());
        for image_id in &ids {
            let blob =
                crud::get_image(&pool, *image_id).await?.ok_or(Error::NotFound(*image_id))?;
            let descriptors = utils::decode_descriptors(&blob)?;
            state.bind_and_add(*image_id, &descriptors)?;
            pb.inc(1);
        }
        pb.finish_and_clear();
        info!("索引重建完成，共 {} 个特征点", state.allocator.cursor());

        Ok(IMDB { pool, state: RwLock::new(state) })
    }
}

impl IMDB {
    /// 添加一张图片的描述符并使其可被搜索
    ///
    /// 先持久化再更新内存状态。持久化成功之后的失败会留下一条
    /// "存在但不可搜索"的记录，这类记录在下一次重建时自动恢复，
    /// 这里不做重试
    pub async fn ingest(&self, image_id: i64, descriptors: Vec<Descriptor>) -> Result<()> {
        if descriptors.is_empty() {
            return Err(Error::NoDescriptors);
        }
        if crud::image_exists(&self.pool, image_id).await? {
            return Err(Error::AlreadyExists(image_id));
        }

        crud::add_image(&self.pool, image_id, &utils::encode_descriptors(&descriptors)).await?;

        let mut state = self.state.write().await;
        state.bind_and_add(image_id, &descriptors)?;
        debug!("图片 {} 已索引，{} 个特征点", image_id, descriptors.len());
        Ok(())
    }

    /// 删除一张图片
    ///
    /// 存储中的记录无条件删除；图片不在运行中的索引里时返回 NotFound，
    /// 比如持久化之后、绑定之前发生过崩溃的记录
    pub async fn remove(&self, image_id: i64) -> Result<()> {
        crud::delete_image(&self.pool, image_id).await?;

        let mut state = self.state.write().await;
        let point_ids = state.registry.unbind(image_id)?;
        let removed = state.index.remove_ids(&point_ids);
        debug!("图片 {} 已删除，移除 {} 个特征点", image_id, removed);
        Ok(())
    }

    /// 用一组查询描述符搜索最相似的图片，返回至多一个结果
    pub async fn search_descriptors(
        &self,
        descriptors: &[Descriptor],
        max_distance: u32,
    ) -> Result<Option<Match>> {
        if descriptors.is_empty() {
            return Ok(None);
        }

        let state = self.state.read().await;
        let mut votes = MatchVotes::new(max_distance);
        for neighbors in state.index.search(descriptors, 1) {
            for neighbor in neighbors {
                // 噪声命中直接丢弃，不做解析
                if neighbor.distance > max_distance {
                    continue;
                }
                let image_id = state.registry.resolve(neighbor.id).ok_or_else(|| {
                    error!("点 {} 不在映射表中，索引与映射表已失去同步", neighbor.id);
                    Error::Inconsistency(neighbor.id)
                })?;
                votes.vote(image_id, neighbor.distance);
            }
        }
        Ok(votes.best())
    }

    /// 已索引的图片数、特征点数和分配器游标
    pub async fn stats(&self) -> (usize, usize, u64) {
        let state = self.state.read().await;
        (state.registry.image_count(), state.registry.point_count(), state.allocator.cursor())
    }
}
