//! 图片读取、预处理与描述符编解码的辅助函数

use indicatif::ProgressStyle;
use opencv::core::{self, Mat};
use opencv::prelude::*;
use opencv::{imgcodecs, imgproc};

use crate::error::Error;
use crate::index::{DESCRIPTOR_SIZE, Descriptor};

/// 图片面积上限，超过后等比缩小
const MAX_IMAGE_AREA: i64 = 3000 * 3000;

/// 解码内存中的图片为灰度图
pub fn imdecode(bytes: &[u8]) -> opencv::Result<Mat> {
    let mat = Mat::from_slice(bytes)?;
    let img = imgcodecs::imdecode(&mat, imgcodecs::IMREAD_GRAYSCALE)?;
    adjust_image_size(img)
}

/// 读取图片文件为灰度图
pub fn imread(path: &str) -> opencv::Result<Mat> {
    let img = imgcodecs::imread(path, imgcodecs::IMREAD_GRAYSCALE)?;
    adjust_image_size(img)
}

/// 面积超过上限时按 sqrt(面积/上限) 等比缩小，否则原样返回
pub fn adjust_image_size(img: Mat) -> opencv::Result<Mat> {
    let (width, height) = (img.cols(), img.rows());
    let area = width as i64 * height as i64;
    if area <= MAX_IMAGE_AREA {
        return Ok(img);
    }
    let k = (area as f64 / MAX_IMAGE_AREA as f64).sqrt();
    let size =
        core::Size::new((width as f64 / k).round() as i32, (height as f64 / k).round() as i32);
    let mut output = Mat::default();
    imgproc::resize(&img, &mut output, size, 0., 0., imgproc::INTER_LINEAR)?;
    Ok(output)
}

/// 水平翻转，用于镜像搜索
pub fn flip_horizontal(img: &Mat) -> opencv::Result<Mat> {
    let mut output = Mat::default();
    core::flip(img, &mut output, 1)?;
    Ok(output)
}

/// 把描述符列表拼接成存储用的字节串
pub fn encode_descriptors(descriptors: &[Descriptor]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(descriptors.len() * DESCRIPTOR_SIZE);
    for descriptor in descriptors {
        blob.extend_from_slice(descriptor);
    }
    blob
}

/// 从存储的字节串还原描述符列表
pub fn decode_descriptors(blob: &[u8]) -> Result<Vec<Descriptor>, Error> {
    if blob.len() % DESCRIPTOR_SIZE != 0 {
        return Err(Error::CorruptDescriptors(blob.len()));
    }
    Ok(blob.chunks_exact(DESCRIPTOR_SIZE).map(|chunk| chunk.try_into().unwrap()).collect())
}

/// 进度条样式
pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template("{wide_bar} {pos}/{len} [{elapsed_precise}<{eta_precise}] {msg}")
        .unwrap()
}
