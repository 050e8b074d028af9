// ABOUTME: Integration tests for fitting decoded images into observed containers
// ABOUTME: Drives the fitter directly and through the resize observer task with real PNG bytes

use hookpad_cli::artifact::ImageArtifact;
use hookpad_cli::fitting::{
    BoxSize, ContainerBox, FitConfig, FitterState, FixedContainer, ImageFitter, LoadState,
    Padding, ResizeEvent, ResizeObserver,
};
use image::ImageFormat;
use std::io::Cursor;
use std::time::Duration;

fn png_artifact(width: u32, height: u32) -> ImageArtifact {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode png");
    ImageArtifact::from_bytes(buffer, Some("image/png")).expect("non-empty image")
}

fn fitter_with_wide_image(container: FixedContainer) -> ImageFitter {
    let mut fitter = ImageFitter::new(FitConfig::default());
    fitter.observe_container(Box::new(container));
    let id = fitter.add_image(png_artifact(1600, 900));
    fitter.mark_loaded(id).expect("png should load");
    fitter
}

#[test]
fn test_fit_after_load() {
    let fitter = fitter_with_wide_image(FixedContainer::new("editor", 820.0, 620.0));

    assert_eq!(fitter.state(), FitterState::Observing);
    assert_eq!(fitter.container_dimensions(), ContainerBox::new(800.0, 600.0));

    let image = &fitter.images()[0];
    assert_eq!(image.state(), &LoadState::Loaded);
    assert!(image.is_processed());

    let fit = image.fit().copied().expect("loaded image should be fitted");
    assert_eq!((fit.width, fit.height), (800, 450));
    assert_eq!(fit.method.to_string(), "width-constrained");
    assert_eq!((fit.original_width, fit.original_height), (1600, 900));
}

#[test]
fn test_container_padding_is_removed() {
    let container =
        FixedContainer::new("padded", 860.0, 660.0).with_padding(Padding::uniform(20.0));
    let fitter = fitter_with_wide_image(container);
    assert_eq!(fitter.container_dimensions(), ContainerBox::new(800.0, 600.0));
}

#[test]
fn test_broken_image_gets_placeholder() {
    let mut fitter = ImageFitter::new(FitConfig::default());
    fitter.observe_container(Box::new(FixedContainer::new("editor", 820.0, 620.0)));

    let broken = ImageArtifact::from_bytes(vec![0xFF, 0xD8, 0xFF, 0x00, 0x01], None).unwrap();
    let id = fitter.add_image(broken);
    assert!(fitter.mark_loaded(id).is_err());

    let image = fitter.image(id).unwrap();
    assert!(image.fit().is_none());
    assert!(image
        .placeholder()
        .unwrap()
        .starts_with("Error displaying image: "));
}

#[tokio::test]
async fn test_observer_refits_on_content_rect() {
    let fitter = fitter_with_wide_image(FixedContainer::new("editor", 820.0, 620.0));
    let observer = ResizeObserver::spawn(fitter);
    let mut snapshots = observer.subscribe();

    observer
        .send(ResizeEvent::ContentRect(BoxSize::new(420.0, 320.0)))
        .unwrap();
    snapshots.changed().await.unwrap();

    let snapshot = snapshots.borrow().clone();
    assert_eq!(snapshot.container, ContainerBox::new(400.0, 300.0));
    let fit = snapshot.fits[0].expect("image stays fitted");
    assert_eq!((fit.width, fit.height), (400, 225));
    assert_eq!(fit.scale, 0.25);

    let fitter = observer.shutdown().await.unwrap();
    assert_eq!(fitter.images()[0].fit().copied(), Some(fit));
}

#[tokio::test(start_paused = true)]
async fn test_observer_coalesces_window_resizes() {
    let container = FixedContainer::new("editor", 820.0, 620.0);
    let handle = container.clone();
    let observer = ResizeObserver::spawn(fitter_with_wide_image(container));

    handle.set_size(700.0, 500.0);
    observer.send(ResizeEvent::WindowResized).unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    handle.set_size(520.0, 420.0);
    observer.send(ResizeEvent::WindowResized).unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(observer.snapshot().container, ContainerBox::new(800.0, 600.0));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let snapshot = observer.snapshot();
    assert_eq!(snapshot.container, ContainerBox::new(500.0, 400.0));
    let fit = snapshot.fits[0].unwrap();
    assert_eq!((fit.width, fit.height), (500, 281));

    observer.send(ResizeEvent::Destroy).unwrap();
    let fitter = observer.shutdown().await.unwrap();
    assert_eq!(fitter.state(), FitterState::Unattached);
    assert!(fitter.images().is_empty());
}

#[tokio::test]
async fn test_config_update_applies_on_next_resize() {
    let observer = ResizeObserver::spawn(fitter_with_wide_image(FixedContainer::new(
        "editor", 820.0, 620.0,
    )));
    let mut snapshots = observer.subscribe();

    let config = FitConfig {
        max_width: 320.0,
        ..FitConfig::default()
    };
    observer.send(ResizeEvent::UpdateConfig(config)).unwrap();
    snapshots.changed().await.unwrap();
    assert_eq!(snapshots.borrow().fits[0].unwrap().width, 800);

    observer.send(ResizeEvent::Measure).unwrap();
    snapshots.changed().await.unwrap();
    let fit = snapshots.borrow().fits[0].unwrap();
    assert_eq!((fit.width, fit.height), (320, 180));

    observer.shutdown().await.unwrap();
}
