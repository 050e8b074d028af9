// ABOUTME: Pure fit calculation placing an image inside a container box
// ABOUTME: Applies max bounds, aspect-ratio branches, and the stacked minimum-size corrections

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Sizing thresholds for displayed images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub max_width: f64,
    pub max_height: f64,
    pub min_width: f64,
    pub min_height: f64,
    pub container_padding: f64,
    pub quality: f64,
    pub maintain_aspect_ratio: bool,
    pub enable_responsive_scaling: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_width: 800.0,
            max_height: 600.0,
            min_width: 200.0,
            min_height: 150.0,
            container_padding: 20.0,
            quality: 0.9,
            maintain_aspect_ratio: true,
            enable_responsive_scaling: true,
        }
    }
}

/// Usable pixel area of the observed container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ContainerBox {
    pub width: f64,
    pub height: f64,
}

impl ContainerBox {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitBranch {
    Fallback,
    Stretch,
    WidthConstrained,
    HeightConstrained,
}

impl FitBranch {
    pub fn tag(&self) -> &'static str {
        match self {
            FitBranch::Fallback => "fallback",
            FitBranch::Stretch => "stretch",
            FitBranch::WidthConstrained => "width-constrained",
            FitBranch::HeightConstrained => "height-constrained",
        }
    }
}

/// Which sizing branch produced a fit, plus any minimum corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitMethod {
    pub branch: FitBranch,
    pub min_width_adjusted: bool,
    pub min_height_adjusted: bool,
}

impl FitMethod {
    pub fn new(branch: FitBranch) -> Self {
        Self {
            branch,
            min_width_adjusted: false,
            min_height_adjusted: false,
        }
    }

    pub fn is_adjusted(&self) -> bool {
        self.min_width_adjusted || self.min_height_adjusted
    }
}

impl fmt::Display for FitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.branch.tag())?;
        if self.min_width_adjusted {
            f.write_str("-min-width-adjusted")?;
        }
        if self.min_height_adjusted {
            f.write_str("-min-height-adjusted")?;
        }
        Ok(())
    }
}

impl Serialize for FitMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitResult {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub method: FitMethod,
    pub original_width: u32,
    pub original_height: u32,
}

/// Compute the display size of a `width` x `height` image inside `container`.
///
/// The width correction runs before the height correction and each one
/// re-derives the other dimension from the aspect ratio, so both can fire and
/// the final size may break the other minimum or the max bounds.
pub fn calculate_optimal_dimensions(
    width: u32,
    height: u32,
    container: ContainerBox,
    config: &FitConfig,
) -> FitResult {
    if width == 0 || height == 0 {
        return FitResult {
            width: round_px(config.min_width),
            height: round_px(config.min_height),
            scale: 1.0,
            method: FitMethod::new(FitBranch::Fallback),
            original_width: width,
            original_height: height,
        };
    }

    let src_w = f64::from(width);
    let src_h = f64::from(height);

    let max_w = container.width.min(config.max_width);
    let max_h = container.height.min(config.max_height);

    let image_ratio = src_w / src_h;
    let container_ratio = max_w / max_h;

    let (mut target_w, mut target_h, scale, mut method) = if !config.maintain_aspect_ratio {
        let scale = (max_w / src_w).min(max_h / src_h);
        (max_w, max_h, scale, FitMethod::new(FitBranch::Stretch))
    } else {
        let (w, h, branch) = if image_ratio > container_ratio {
            (max_w, max_w / image_ratio, FitBranch::WidthConstrained)
        } else {
            (max_h * image_ratio, max_h, FitBranch::HeightConstrained)
        };
        let scale = (w / src_w).min(h / src_h);
        (w, h, scale, FitMethod::new(branch))
    };

    if target_w < config.min_width {
        target_w = config.min_width;
        target_h = config.min_width / image_ratio;
        method.min_width_adjusted = true;
    }

    if target_h < config.min_height {
        target_h = config.min_height;
        target_w = config.min_height * image_ratio;
        method.min_height_adjusted = true;
    }

    FitResult {
        width: round_px(target_w),
        height: round_px(target_h),
        scale,
        method,
        original_width: width,
        original_height: height,
    }
}

fn round_px(value: f64) -> u32 {
    // `as` saturates negatives and NaN to 0
    value.round() as u32
}
