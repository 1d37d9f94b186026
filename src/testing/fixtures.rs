//! Canned format descriptors modelled on a phone back camera

use crate::types::{ColorSpace, FormatDescriptor, FrameRateRange, PixelEncoding};

/// 8-bit 1080p format without extended color support
pub fn standard_format() -> FormatDescriptor {
    FormatDescriptor::new(PixelEncoding::NV12, 1920, 1080)
        .with_color_spaces(vec![ColorSpace::Srgb, ColorSpace::P3D65])
        .with_frame_rate_ranges(vec![FrameRateRange::new(1.0, 60.0)])
}

/// 10-bit 4K format with HLG but no log support
pub fn hlg_format() -> FormatDescriptor {
    FormatDescriptor::new(PixelEncoding::X420, 3840, 2160)
        .with_color_spaces(vec![ColorSpace::Srgb, ColorSpace::HlgBt2020])
        .with_frame_rate_ranges(vec![FrameRateRange::new(1.0, 60.0)])
}

/// 10-bit 4:2:2 4K format supporting Apple Log
pub fn log_format() -> FormatDescriptor {
    log_format_with_encoding(PixelEncoding::X422)
}

/// 4K format supporting Apple Log with an arbitrary encoding
pub fn log_format_with_encoding(encoding: PixelEncoding) -> FormatDescriptor {
    FormatDescriptor::new(encoding, 3840, 2160)
        .with_color_spaces(vec![ColorSpace::Srgb, ColorSpace::AppleLog])
        .with_frame_rate_ranges(vec![FrameRateRange::new(1.0, 60.0)])
}
