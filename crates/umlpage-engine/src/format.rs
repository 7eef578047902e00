//! Output image formats.

use std::fmt;
use std::str::FromStr;

/// Image format for rendered pages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Raster PNG.
    #[default]
    Png,
    /// Vector SVG.
    Svg,
}

impl ImageFormat {
    /// File extension (and Kroki output type) for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    /// Whether the format is a pixel buffer that can be resampled.
    #[must_use]
    pub fn is_raster(self) -> bool {
        matches!(self, Self::Png)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Error returned when parsing an unknown format name.
#[derive(Debug, thiserror::Error)]
#[error("unknown image format '{0}' (expected png or svg)")]
pub struct UnknownFormat(String);

impl FromStr for ImageFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            _ => Err(UnknownFormat(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("PNG".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!("svg".parse::<ImageFormat>().unwrap(), ImageFormat::Svg);
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "gif".parse::<ImageFormat>().unwrap_err();
        assert!(err.to_string().contains("'gif'"));
    }

    #[test]
    fn test_raster() {
        assert!(ImageFormat::Png.is_raster());
        assert!(!ImageFormat::Svg.is_raster());
        assert_eq!(ImageFormat::Svg.to_string(), "svg");
    }
}
