//! AKAZE 特征检测与描述符计算
//!
//! 检测阈值默认为 0，候选点数量不设上限，由筛选算法负责把每张
//! 图片的描述符数量控制在有界范围内。

use opencv::Result;
use opencv::core::{KeyPoint, Mat, Ptr, Vector};
use opencv::features2d::{AKAZE, AKAZE_DescriptorType, KAZE_DiffusivityType};
use opencv::prelude::*;

use crate::config::AkazeOptions;
use crate::index::{DESCRIPTOR_SIZE, Descriptor};
use crate::selector::{self, Keypoint};
use crate::utils;

pub struct AkazeDetector {
    akaze: Ptr<AKAZE>,
}

impl AkazeDetector {
    pub fn create(opts: &AkazeOptions) -> Result<Self> {
        let akaze = AKAZE::create(
            AKAZE_DescriptorType::DESCRIPTOR_MLDB,
            // 0 表示使用完整长度的描述符
            0,
            3,
            opts.akaze_threshold,
            opts.akaze_octaves as i32,
            opts.akaze_octave_layers as i32,
            KAZE_DiffusivityType::DIFF_PM_G2,
        )?;
        Ok(Self { akaze })
    }

    /// 检测候选特征点，结果无序，可能为空
    pub fn detect(&mut self, image: &Mat) -> Result<Vector<KeyPoint>> {
        let mask = Mat::default();
        let mut keypoints = Vector::new();
        self.akaze.detect(image, &mut keypoints, &mask)?;
        Ok(keypoints)
    }

    /// 为给定特征点计算 488 位描述符，顺序与输入一致
    pub fn compute(
        &mut self,
        image: &Mat,
        keypoints: &mut Vector<KeyPoint>,
    ) -> Result<Vec<Descriptor>> {
        let mut descriptors = Mat::default();
        self.akaze.compute(image, keypoints, &mut descriptors)?;

        let mut result = Vec::with_capacity(descriptors.rows() as usize);
        for row in 0..descriptors.rows() {
            let data = descriptors.at_row::<u8>(row)?;
            let mut descriptor = [0u8; DESCRIPTOR_SIZE];
            descriptor.copy_from_slice(&data[..DESCRIPTOR_SIZE]);
            result.push(descriptor);
        }
        Ok(result)
    }

    /// 完整的提取流程：镜像翻转（可选）→ 检测 → 筛选 → 计算描述符
    ///
    /// 翻转必须发生在检测之前，特征点坐标相对翻转后的图片才有意义
    pub fn detect_descriptors(&mut self, image: &Mat, mirrored: bool) -> Result<Vec<Descriptor>> {
        let flipped;
        let image = if mirrored {
            flipped = utils::flip_horizontal(image)?;
            &flipped
        } else {
            image
        };

        let candidates = self.detect(image)?;
        let points: Vec<Keypoint> = candidates
            .iter()
            .map(|kp| Keypoint { x: kp.pt().x, y: kp.pt().y, response: kp.response() })
            .collect();

        let size = (image.cols() as u32, image.rows() as u32);
        let mut keypoints = Vector::new();
        for idx in selector::select_keypoints(size, &points) {
            keypoints.push(candidates.get(idx)?);
        }
        self.compute(image, &mut keypoints)
    }
}
