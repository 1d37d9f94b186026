use serde::{Deserialize, Serialize};
use std::fmt;

/// Color encoding a device can capture in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// Standard dynamic range sRGB
    Srgb,
    /// Display P3 with D65 white point
    P3D65,
    /// Hybrid log-gamma with BT.2020 primaries
    HlgBt2020,
    /// Apple Log, the extended-range log encoding
    AppleLog,
}

impl ColorSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorSpace::Srgb => "srgb",
            ColorSpace::P3D65 => "p3_d65",
            ColorSpace::HlgBt2020 => "hlg_bt2020",
            ColorSpace::AppleLog => "apple_log",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ColorSpace::Srgb => "sRGB",
            ColorSpace::P3D65 => "Display P3",
            ColorSpace::HlgBt2020 => "HLG BT.2020",
            ColorSpace::AppleLog => "Apple Log",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four-character pixel encoding code (e.g. `x422`, `420v`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PixelEncoding(pub [u8; 4]);

impl PixelEncoding {
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    /// 10-bit bi-planar 4:2:2 video range
    pub const X422: Self = Self::new(b"x422");
    /// 10-bit bi-planar 4:2:0 video range
    pub const X420: Self = Self::new(b"x420");
    /// 8-bit bi-planar 4:2:0 video range
    pub const NV12: Self = Self::new(b"420v");
    /// 8-bit packed 4:2:2
    pub const YUYV: Self = Self::new(b"YUYV");
    /// Motion JPEG
    pub const MJPG: Self = Self::new(b"MJPG");
}

impl fmt::Display for PixelEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl TryFrom<String> for PixelEncoding {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.as_str().try_into()
    }
}

impl TryFrom<&str> for PixelEncoding {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let bytes: [u8; 4] = value
            .as_bytes()
            .try_into()
            .map_err(|_| format!("pixel encoding must be exactly 4 bytes: {:?}", value))?;
        Ok(Self(bytes))
    }
}

impl From<PixelEncoding> for String {
    fn from(value: PixelEncoding) -> Self {
        value.to_string()
    }
}

/// Exact rational frame duration (`value / timescale` seconds)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameDuration {
    pub value: i64,
    pub timescale: i32,
}

impl FrameDuration {
    pub const fn new(value: i64, timescale: i32) -> Self {
        Self { value, timescale }
    }

    /// Duration of a single frame at `fps` frames per second
    pub const fn from_fps(fps: u32) -> Self {
        Self::new(1, fps as i32)
    }

    /// Frames per second this duration corresponds to
    pub fn fps(&self) -> f64 {
        if self.value == 0 {
            return 0.0;
        }
        self.timescale as f64 / self.value as f64
    }
}

// 1/30 == 2/60
impl PartialEq for FrameDuration {
    fn eq(&self, other: &Self) -> bool {
        i128::from(self.value) * i128::from(other.timescale)
            == i128::from(other.value) * i128::from(self.timescale)
    }
}

impl Eq for FrameDuration {}

impl fmt::Display for FrameDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.timescale)
    }
}

/// Supported frame-rate bounds of a format
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRateRange {
    pub min_fps: f64,
    pub max_fps: f64,
}

impl FrameRateRange {
    pub fn new(min_fps: f64, max_fps: f64) -> Self {
        Self { min_fps, max_fps }
    }

    pub fn contains(&self, duration: FrameDuration) -> bool {
        let fps = duration.fps();
        fps >= self.min_fps && fps <= self.max_fps
    }
}

/// Immutable capability record for one capture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    pub encoding: PixelEncoding,
    pub width: u32,
    pub height: u32,
    pub color_spaces: Vec<ColorSpace>,
    pub frame_rate_ranges: Vec<FrameRateRange>,
}

impl FormatDescriptor {
    pub fn new(encoding: PixelEncoding, width: u32, height: u32) -> Self {
        Self {
            encoding,
            width,
            height,
            color_spaces: vec![ColorSpace::Srgb],
            frame_rate_ranges: vec![FrameRateRange::new(1.0, 30.0)],
        }
    }

    pub fn with_color_spaces(mut self, color_spaces: Vec<ColorSpace>) -> Self {
        self.color_spaces = color_spaces;
        self
    }

    pub fn with_frame_rate_ranges(mut self, ranges: Vec<FrameRateRange>) -> Self {
        self.frame_rate_ranges = ranges;
        self
    }

    pub fn supports_color_space(&self, color_space: ColorSpace) -> bool {
        self.color_spaces.contains(&color_space)
    }

    pub fn supports_frame_duration(&self, duration: FrameDuration) -> bool {
        self.frame_rate_ranges.iter().any(|r| r.contains(duration))
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.encoding, self.width, self.height)
    }
}

/// Physical camera module kind, used to rank devices during discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    TripleCamera,
    DualWideCamera,
    DualCamera,
    WideAngleCamera,
    UltraWideCamera,
    TelephotoCamera,
    External,
}

impl DeviceType {
    /// Triple > dual-wide > dual > wide-angle
    pub fn default_priority() -> Vec<DeviceType> {
        vec![
            DeviceType::TripleCamera,
            DeviceType::DualWideCamera,
            DeviceType::DualCamera,
            DeviceType::WideAngleCamera,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePosition {
    Front,
    Back,
    /// Position unknown; as a discovery filter it matches any device
    Unspecified,
}

/// Serializable snapshot of a device, for presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub id: String,
    pub name: String,
    pub device_type: DeviceType,
    pub position: DevicePosition,
    pub active_format: FormatDescriptor,
    pub active_color_space: ColorSpace,
    pub format_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_duration_equality_is_rational() {
        assert_eq!(FrameDuration::new(1, 30), FrameDuration::new(2, 60));
        assert_ne!(FrameDuration::new(1, 30), FrameDuration::new(1, 24));
        assert_eq!(FrameDuration::from_fps(30).fps(), 30.0);
    }

    #[test]
    fn test_pixel_encoding_parsing() {
        let encoding = PixelEncoding::try_from("x422").unwrap();
        assert_eq!(encoding, PixelEncoding::X422);
        assert_eq!(encoding.to_string(), "x422");
        assert!(PixelEncoding::try_from("toolong").is_err());
    }

    #[test]
    fn test_format_capabilities() {
        let format = FormatDescriptor::new(PixelEncoding::X422, 3840, 2160)
            .with_color_spaces(vec![ColorSpace::Srgb, ColorSpace::AppleLog])
            .with_frame_rate_ranges(vec![FrameRateRange::new(1.0, 60.0)]);

        assert!(format.supports_color_space(ColorSpace::AppleLog));
        assert!(!format.supports_color_space(ColorSpace::HlgBt2020));
        assert!(format.supports_frame_duration(FrameDuration::from_fps(30)));
        assert!(!format.supports_frame_duration(FrameDuration::from_fps(120)));
        assert_eq!(format.to_string(), "x422 3840x2160");
    }

    #[test]
    fn test_color_space_serde_names() {
        let json = serde_json::to_string(&ColorSpace::AppleLog).unwrap();
        assert_eq!(json, "\"apple_log\"");
        let encoding: PixelEncoding = serde_json::from_str("\"420v\"").unwrap();
        assert_eq!(encoding, PixelEncoding::NV12);
    }
}
