//! 采集帧到设备像素格式的转换。

use image::imageops::FilterType;
use image::DynamicImage;

use crate::modules::error::Result;
use crate::modules::types::{FrameBuffer, PixelFormat};

/// 把采集到的图像缩放并转换为设备帧。
pub trait FrameConverter {
    fn convert(
        &self,
        frame: &DynamicImage,
        format: PixelFormat,
        width: u16,
        height: u16,
    ) -> Result<FrameBuffer>;
}

/// 基于 `image` crate 的转换器。
#[derive(Debug, Clone, Copy)]
pub struct ImageConverter {
    filter: FilterType,
}

impl ImageConverter {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Default for ImageConverter {
    fn default() -> Self {
        Self::new(FilterType::Nearest)
    }
}

impl FrameConverter for ImageConverter {
    fn convert(
        &self,
        frame: &DynamicImage,
        format: PixelFormat,
        width: u16,
        height: u16,
    ) -> Result<FrameBuffer> {
        let (w, h) = (width as u32, height as u32);
        let resized;
        let source = if frame.width() == w && frame.height() == h {
            frame
        } else {
            resized = frame.resize_exact(w, h, self.filter);
            &resized
        };

        let bytes = match format {
            PixelFormat::Bgr888 => {
                let mut data = source.to_rgb8().into_raw();
                // RGB -> BGR
                for pixel in data.chunks_exact_mut(3) {
                    pixel.swap(0, 2);
                }
                data
            }
            PixelFormat::Rgba8888 => source.to_rgba8().into_raw(),
            PixelFormat::Bgra8888 => {
                let mut data = source.to_rgba8().into_raw();
                for pixel in data.chunks_exact_mut(4) {
                    pixel.swap(0, 2);
                }
                data
            }
        };

        FrameBuffer::new(width, height, format, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn source(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 40])))
    }

    #[test]
    fn bgr_drops_alpha_and_swaps() {
        let frame = ImageConverter::default()
            .convert(&source(2, 2), PixelFormat::Bgr888, 2, 2)
            .unwrap();
        assert_eq!(frame.as_data().len(), 2 * 2 * 3);
        assert_eq!(&frame.as_data()[..3], &[30, 20, 10]);
    }

    #[test]
    fn rgba_keeps_source_order() {
        let frame = ImageConverter::default()
            .convert(&source(1, 1), PixelFormat::Rgba8888, 1, 1)
            .unwrap();
        assert_eq!(frame.as_data(), &[10, 20, 30, 40]);
    }

    #[test]
    fn bgra_swaps_red_and_blue() {
        let frame = ImageConverter::default()
            .convert(&source(1, 1), PixelFormat::Bgra8888, 1, 1)
            .unwrap();
        assert_eq!(frame.as_data(), &[30, 20, 10, 40]);
    }

    #[test]
    fn resizes_to_target() {
        let converter = ImageConverter::new(FilterType::Triangle);
        let frame = converter
            .convert(&source(1920, 1080), PixelFormat::Bgra8888, 320, 240)
            .unwrap();
        assert_eq!((frame.width(), frame.height()), (320, 240));
        assert_eq!(frame.as_data().len(), 320 * 240 * 4);
    }
}
