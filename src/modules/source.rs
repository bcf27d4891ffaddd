//! 帧来源。
//!
//! 屏幕采集由外部提供，这里只定义接口，并提供随机色块测试图案
//! 和静态图片两种来源。

use std::path::Path;
use std::time::{Duration, Instant};

use image::{DynamicImage, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::modules::error::{MirrorError, Result};

/// 以原始分辨率产出一帧。
pub trait FrameSource {
    fn capture(&mut self) -> Result<DynamicImage>;
}

/// 随机色块测试图案，每隔 `interval` 重新生成。
pub struct TestPatternSource {
    width: u32,
    height: u32,
    block_size: u32,
    interval: Duration,
    rng: StdRng,
    current: Option<(DynamicImage, Instant)>,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32, block_size: u32, interval: Duration) -> Self {
        Self::with_rng(width, height, block_size, interval, StdRng::from_entropy())
    }

    pub fn with_rng(
        width: u32,
        height: u32,
        block_size: u32,
        interval: Duration,
        rng: StdRng,
    ) -> Self {
        Self {
            width,
            height,
            block_size: block_size.max(1),
            interval,
            rng,
            current: None,
        }
    }

    /// 生成 `block_size` 见方的随机色块平铺图案。
    pub fn render(&mut self) -> RgbaImage {
        let cols = self.width.div_ceil(self.block_size) as usize;
        let rows = self.height.div_ceil(self.block_size) as usize;

        let mut colors = Vec::with_capacity(cols * rows);
        for _ in 0..cols * rows {
            let r = self.rng.gen_range(80..=255);
            let g = self.rng.gen_range(80..=255);
            let b = self.rng.gen_range(80..=255);
            colors.push(Rgba([r, g, b, 0xFF]));
        }

        let block = self.block_size;
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            colors[(y / block) as usize * cols + (x / block) as usize]
        })
    }
}

impl FrameSource for TestPatternSource {
    fn capture(&mut self) -> Result<DynamicImage> {
        if self.width == 0 || self.height == 0 {
            return Err(MirrorError::Capture(format!(
                "图案尺寸无效: {}x{}",
                self.width, self.height
            )));
        }

        let stale = match &self.current {
            Some((_, generated)) => generated.elapsed() >= self.interval,
            None => true,
        };
        if stale {
            let image = DynamicImage::ImageRgba8(self.render());
            log::debug!("Test pattern regenerated ({}x{})", self.width, self.height);
            self.current = Some((image, Instant::now()));
        }

        match &self.current {
            Some((image, _)) => Ok(image.clone()),
            None => Err(MirrorError::Capture("测试图案未生成".to_string())),
        }
    }
}

/// 静态图片来源：加载一次，每次采集返回同一帧。
pub struct ImageFileSource {
    image: DynamicImage,
}

impl ImageFileSource {
    /// 从文件加载图片。
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| MirrorError::Image(format!("打开图片失败 {:?}: {}", path, e)))?;
        log::info!(
            "Loaded image {:?} ({}x{})",
            path,
            image.width(),
            image.height()
        );
        Ok(Self { image })
    }
}

impl FrameSource for ImageFileSource {
    fn capture(&mut self) -> Result<DynamicImage> {
        Ok(self.image.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_has_requested_size() {
        let mut source = TestPatternSource::with_rng(
            100,
            50,
            40,
            Duration::from_secs(2),
            StdRng::seed_from_u64(7),
        );
        let frame = source.capture().unwrap();
        assert_eq!((frame.width(), frame.height()), (100, 50));
    }

    #[test]
    fn pattern_blocks_are_uniform() {
        let mut source = TestPatternSource::with_rng(
            80,
            40,
            40,
            Duration::from_secs(2),
            StdRng::seed_from_u64(1),
        );
        let image = source.render();
        assert_eq!(image.get_pixel(0, 0), image.get_pixel(39, 39));
        for pixel in image.pixels() {
            assert!(pixel[0] >= 80 && pixel[1] >= 80 && pixel[2] >= 80);
            assert_eq!(pixel[3], 0xFF);
        }
    }

    #[test]
    fn pattern_is_reused_within_interval() {
        let mut source = TestPatternSource::with_rng(
            40,
            40,
            10,
            Duration::from_secs(60),
            StdRng::seed_from_u64(3),
        );
        let first = source.capture().unwrap();
        let second = source.capture().unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn zero_sized_pattern_fails() {
        let mut source = TestPatternSource::new(0, 10, 40, Duration::from_secs(1));
        assert!(matches!(source.capture(), Err(MirrorError::Capture(_))));
    }

    #[test]
    fn image_file_source_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbaImage::from_pixel(8, 6, Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let mut source = ImageFileSource::open(&path).unwrap();
        let frame = source.capture().unwrap();
        assert_eq!((frame.width(), frame.height()), (8, 6));
    }

    #[test]
    fn image_file_source_missing() {
        assert!(matches!(
            ImageFileSource::open("/nonexistent/frame.png"),
            Err(MirrorError::Image(_))
        ));
    }
}
