// ABOUTME: Responsive image fitter tracking one container and the images displayed inside it
// ABOUTME: Recomputes the container box on resize and re-fits every processed image

use super::calc::{calculate_optimal_dimensions, ContainerBox, FitConfig, FitResult};
use crate::artifact::{error_placeholder, ImageArtifact};
use crate::constants::terminal::{CELL_HEIGHT_PX, CELL_WIDTH_PX};
use anyhow::{anyhow, Result};
use crossterm::terminal::size as terminal_size;
use log::debug;
use std::sync::{Arc, RwLock};

/// Raw measured size of a container, before padding is removed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxSize {
    pub width: f64,
    pub height: f64,
}

impl BoxSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The container's own padding, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Padding {
    pub fn uniform(px: f64) -> Self {
        Self {
            left: px,
            right: px,
            top: px,
            bottom: px,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// A display region images are fitted into.
pub trait Container: Send + Sync {
    fn id(&self) -> &str;

    /// Current outer size of the region.
    fn measure(&self) -> Result<BoxSize>;

    fn padding(&self) -> Padding {
        Padding::default()
    }
}

/// The terminal window, converted to pixels with an estimated cell size.
#[derive(Debug, Clone, Default)]
pub struct TerminalContainer;

impl TerminalContainer {
    pub fn new() -> Self {
        Self
    }
}

impl Container for TerminalContainer {
    fn id(&self) -> &str {
        "terminal"
    }

    fn measure(&self) -> Result<BoxSize> {
        let (cols, rows) =
            terminal_size().map_err(|e| anyhow!("Failed to get terminal size: {}", e))?;
        Ok(BoxSize::new(
            f64::from(cols) * CELL_WIDTH_PX,
            f64::from(rows) * CELL_HEIGHT_PX,
        ))
    }
}

/// A container with an explicitly set size. Clones share the size, so a
/// handle kept outside the fitter can resize it.
#[derive(Debug, Clone)]
pub struct FixedContainer {
    id: String,
    size: Arc<RwLock<BoxSize>>,
    padding: Padding,
}

impl FixedContainer {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            size: Arc::new(RwLock::new(BoxSize::new(width, height))),
            padding: Padding::default(),
        }
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn set_size(&self, width: f64, height: f64) {
        if let Ok(mut size) = self.size.write() {
            *size = BoxSize::new(width, height);
        }
    }
}

impl Container for FixedContainer {
    fn id(&self) -> &str {
        &self.id
    }

    fn measure(&self) -> Result<BoxSize> {
        self.size
            .read()
            .map(|size| *size)
            .map_err(|_| anyhow!("container size lock poisoned"))
    }

    fn padding(&self) -> Padding {
        self.padding
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed(String),
}

/// An image shown inside the observed container.
#[derive(Debug, Clone)]
pub struct DisplayedImage {
    artifact: ImageArtifact,
    state: LoadState,
    fit: Option<FitResult>,
    processed: bool,
    fit_on_load: bool,
}

impl DisplayedImage {
    pub fn new(artifact: ImageArtifact) -> Self {
        let state = if artifact.dimensions().is_some() {
            LoadState::Loaded
        } else {
            LoadState::Loading
        };
        Self {
            artifact,
            state,
            fit: None,
            processed: false,
            fit_on_load: false,
        }
    }

    pub fn artifact(&self) -> &ImageArtifact {
        &self.artifact
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn fit(&self) -> Option<&FitResult> {
        self.fit.as_ref()
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Placeholder text for an image that failed to load.
    pub fn placeholder(&self) -> Option<&str> {
        match &self.state {
            LoadState::Failed(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitterState {
    Unattached,
    Observing,
}

pub struct ImageFitter {
    config: FitConfig,
    container: Option<Box<dyn Container>>,
    dimensions: ContainerBox,
    images: Vec<DisplayedImage>,
}

impl Default for ImageFitter {
    fn default() -> Self {
        Self::new(FitConfig::default())
    }
}

impl ImageFitter {
    pub fn new(config: FitConfig) -> Self {
        Self {
            config,
            container: None,
            dimensions: ContainerBox::default(),
            images: Vec::new(),
        }
    }

    pub fn state(&self) -> FitterState {
        if self.container.is_some() {
            FitterState::Observing
        } else {
            FitterState::Unattached
        }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Replace the configuration wholesale. Existing fits are not recomputed
    /// until the next resize.
    pub fn update_config(&mut self, config: FitConfig) {
        debug!("Fit configuration updated: {:?}", config);
        self.config = config;
    }

    pub fn container_dimensions(&self) -> ContainerBox {
        self.dimensions
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container.as_deref().map(|c| c.id())
    }

    /// Start tracking `container`, abandoning any previous one together with
    /// the images it held, then measure it.
    pub fn observe_container(&mut self, container: Box<dyn Container>) {
        if let Some(previous) = self.container.take() {
            debug!("Stopped observing container: {}", previous.id());
        }
        self.images.clear();

        debug!("Now observing container: {}", container.id());
        self.container = Some(container);
        self.on_measurement();
    }

    /// Native size notification carrying the content box.
    pub fn on_content_rect(&mut self, rect: BoxSize) {
        if self.container.is_none() {
            debug!("Ignoring content rect while unattached");
            return;
        }

        self.dimensions = ContainerBox::new(
            (rect.width - self.config.container_padding).max(self.config.min_width),
            (rect.height - self.config.container_padding).max(self.config.min_height),
        );
        debug!("Container dimensions updated: {:?}", self.dimensions);
        self.on_container_resize();
    }

    /// Measure the container directly, removing its own padding as well as
    /// the configured padding.
    pub fn on_measurement(&mut self) {
        let Some(container) = self.container.as_deref() else {
            return;
        };

        let rect = match container.measure() {
            Ok(rect) => rect,
            Err(err) => {
                debug!("Container measurement failed: {}", err);
                return;
            }
        };
        let padding = container.padding();

        self.dimensions = ContainerBox::new(
            (rect.width - padding.horizontal() - self.config.container_padding)
                .max(self.config.min_width),
            (rect.height - padding.vertical() - self.config.container_padding)
                .max(self.config.min_height),
        );
        debug!("Container dimensions updated (measured): {:?}", self.dimensions);
        self.on_container_resize();
    }

    fn on_container_resize(&mut self) {
        let ids: Vec<ImageId> = self
            .images
            .iter()
            .enumerate()
            .filter(|(_, image)| image.processed)
            .map(|(index, _)| ImageId(index))
            .collect();

        for id in ids {
            self.apply_responsive_scaling(id);
        }
    }

    /// Fit an image of the given natural size against the current box.
    pub fn calculate(&self, width: u32, height: u32) -> FitResult {
        calculate_optimal_dimensions(width, height, self.dimensions, &self.config)
    }

    /// Place an image in the container. Its fit is applied once it loads.
    pub fn add_image(&mut self, artifact: ImageArtifact) -> ImageId {
        let id = ImageId(self.images.len());
        self.images.push(DisplayedImage::new(artifact));
        self.apply_responsive_scaling(id);
        id
    }

    pub fn image(&self, id: ImageId) -> Option<&DisplayedImage> {
        self.images.get(id.0)
    }

    pub fn images(&self) -> &[DisplayedImage] {
        &self.images
    }

    /// Fit one image. An image that has not loaded yet gets a deferred fit
    /// that runs from [`ImageFitter::mark_loaded`].
    pub fn apply_responsive_scaling(&mut self, id: ImageId) -> Option<FitResult> {
        let dimensions = self.dimensions;
        let config = self.config.clone();
        let image = self.images.get_mut(id.0)?;

        let (width, height) = match (&image.state, image.artifact.dimensions()) {
            (LoadState::Loaded, Some(dims)) => dims,
            (LoadState::Failed(_), _) => return None,
            _ => {
                image.fit_on_load = true;
                return None;
            }
        };

        if !config.enable_responsive_scaling {
            image.processed = true;
            return None;
        }

        let fit = calculate_optimal_dimensions(width, height, dimensions, &config);
        debug!(
            "Applied responsive scaling: {}, scale: {:.2}",
            fit.method, fit.scale
        );
        image.fit = Some(fit);
        image.processed = true;
        Some(fit)
    }

    /// Read the image header. On success any deferred fit runs; on failure the
    /// image switches to its error placeholder.
    pub fn mark_loaded(&mut self, id: ImageId) -> Result<Option<FitResult>> {
        let image = self
            .images
            .get_mut(id.0)
            .ok_or_else(|| anyhow!("unknown image {:?}", id))?;

        match image.artifact.load() {
            Ok(_) => {
                image.state = LoadState::Loaded;
                if std::mem::take(&mut image.fit_on_load) {
                    Ok(self.apply_responsive_scaling(id))
                } else {
                    Ok(None)
                }
            }
            Err(err) => {
                let text = error_placeholder(&err);
                image.state = LoadState::Failed(text.clone());
                image.fit_on_load = false;
                Err(anyhow!(text))
            }
        }
    }

    /// Stop tracking and clear the stored dimensions.
    pub fn destroy(&mut self) {
        self.container = None;
        self.images.clear();
        self.dimensions = ContainerBox::default();
        debug!("Image fitter destroyed");
    }
}
