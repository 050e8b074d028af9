// ABOUTME: Resize observer task that exclusively owns the image fitter
// ABOUTME: Consumes resize events from a single channel and publishes container snapshots

use super::calc::{ContainerBox, FitConfig, FitResult};
use super::fitter::{BoxSize, Container, FitterState, ImageFitter};
use crate::constants::timeouts::RESIZE_DEBOUNCE;
use crate::debounce::Debouncer;
use anyhow::{anyhow, Result};
use log::debug;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Everything that can change the observed container.
pub enum ResizeEvent {
    /// Native notification carrying the new content box
    ContentRect(BoxSize),
    /// Window-level resize; coalesced before the container is re-measured
    WindowResized,
    /// Debounced re-measurement, sent by the observer to itself
    Measure,
    Observe(Box<dyn Container>),
    UpdateConfig(FitConfig),
    Destroy,
}

/// Read-only view of the fitter, published after every event.
#[derive(Debug, Clone, PartialEq)]
pub struct FitterSnapshot {
    pub state: FitterState,
    pub container: ContainerBox,
    pub fits: Vec<Option<FitResult>>,
}

impl FitterSnapshot {
    fn of(fitter: &ImageFitter) -> Self {
        Self {
            state: fitter.state(),
            container: fitter.container_dimensions(),
            fits: fitter.images().iter().map(|image| image.fit().copied()).collect(),
        }
    }
}

pub struct ResizeObserver {
    events: mpsc::UnboundedSender<ResizeEvent>,
    snapshots: watch::Receiver<FitterSnapshot>,
    task: JoinHandle<ImageFitter>,
}

impl ResizeObserver {
    /// Move `fitter` into its own task, coalescing window resizes over the
    /// default 100 ms window.
    pub fn spawn(fitter: ImageFitter) -> Self {
        Self::spawn_with_delay(fitter, RESIZE_DEBOUNCE)
    }

    pub fn spawn_with_delay(fitter: ImageFitter, delay: Duration) -> Self {
        let (events, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) = watch::channel(FitterSnapshot::of(&fitter));
        let task = tokio::spawn(run(fitter, rx, events.downgrade(), snapshot_tx, delay));

        Self {
            events,
            snapshots,
            task,
        }
    }

    pub fn send(&self, event: ResizeEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| anyhow!("resize observer has stopped"))
    }

    /// Latest published snapshot. May lag events that are still queued.
    pub fn snapshot(&self) -> FitterSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FitterSnapshot> {
        self.snapshots.clone()
    }

    /// Stop the task after it drains queued events and hand the fitter back.
    pub async fn shutdown(self) -> Result<ImageFitter> {
        drop(self.events);
        self.task
            .await
            .map_err(|e| anyhow!("resize observer task failed: {}", e))
    }
}

async fn run(
    mut fitter: ImageFitter,
    mut events: mpsc::UnboundedReceiver<ResizeEvent>,
    self_tx: mpsc::WeakUnboundedSender<ResizeEvent>,
    snapshots: watch::Sender<FitterSnapshot>,
    delay: Duration,
) -> ImageFitter {
    let mut resize_debounce = Debouncer::new(delay);

    while let Some(event) = events.recv().await {
        match event {
            ResizeEvent::ContentRect(rect) => fitter.on_content_rect(rect),
            ResizeEvent::WindowResized => {
                let tx = self_tx.clone();
                resize_debounce.schedule(async move {
                    if let Some(tx) = tx.upgrade() {
                        let _ = tx.send(ResizeEvent::Measure);
                    }
                });
                continue;
            }
            ResizeEvent::Measure => fitter.on_measurement(),
            ResizeEvent::Observe(container) => fitter.observe_container(container),
            ResizeEvent::UpdateConfig(config) => fitter.update_config(config),
            ResizeEvent::Destroy => {
                resize_debounce.cancel();
                fitter.destroy();
            }
        }

        let _ = snapshots.send(FitterSnapshot::of(&fitter));
    }

    debug!("Resize observer stopped");
    fitter
}
