// ABOUTME: Responsive image fitting against an observed container
// ABOUTME: Pure fit calculation, the stateful fitter, and its resize observer task

pub mod calc;
pub mod fitter;
pub mod observer;

pub use calc::{
    calculate_optimal_dimensions, ContainerBox, FitBranch, FitConfig, FitMethod, FitResult,
};
pub use fitter::{
    BoxSize, Container, DisplayedImage, FitterState, FixedContainer, ImageFitter, ImageId,
    LoadState, Padding, TerminalContainer,
};
pub use observer::{FitterSnapshot, ResizeEvent, ResizeObserver};
