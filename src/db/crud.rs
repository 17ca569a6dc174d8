use sqlx::{Result, SqlitePool};

use super::ImageRecord;

/// 写入一条图片描述符记录
pub async fn add_image(pool: &SqlitePool, id: i64, descriptor: &[u8]) -> Result<()> {
    sqlx::query("INSERT INTO image (id, descriptor) VALUES (?, ?)")
        .bind(id)
        .bind(descriptor)
        .execute(pool)
        .await?;
    Ok(())
}

/// 读取图片的描述符数据
pub async fn get_image(pool: &SqlitePool, id: i64) -> Result<Option<Vec<u8>>> {
    let record = sqlx::query_as::<_, ImageRecord>("SELECT id, descriptor FROM image WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(record.map(|r| r.descriptor))
}

/// 删除图片记录，返回记录是否确实存在过
pub async fn delete_image(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM image WHERE id = ?").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// 检查图片是否已经入库
pub async fn image_exists(pool: &SqlitePool, id: i64) -> Result<bool> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM image WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count.0 > 0)
}

/// 按 ID 升序列出全部图片，重建索引时的遍历顺序即由此决定
pub async fn list_ids(pool: &SqlitePool) -> Result<Vec<i64>> {
    let rows: Vec<(i64,)> =
        sqlx::query_as("SELECT id FROM image ORDER BY id ASC").fetch_all(pool).await?;
    Ok(rows.into_iter().map(|row| row.0).collect())
}

/// 数据库中的图片数量
pub async fn count_images(pool: &SqlitePool) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM image").fetch_one(pool).await?;
    Ok(count.0)
}
