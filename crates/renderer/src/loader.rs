//! Background loading of the two source images.
//!
//! Each locator is fetched and decoded on its own worker thread. Workers only
//! report through the `notify` callback; the [`LoadTracker`] on the event loop
//! thread decides when the set is complete.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;

use crate::error::EngineError;
use crate::types::{ImageLocator, TEXTURE_UNIT_COUNT};

/// A decoded image destined for texture unit `unit`.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub unit: usize,
    pub image: RgbaImage,
}

/// Message sent from a loader thread.
#[derive(Debug, Clone)]
pub enum LoadEvent {
    Loaded(LoadedImage),
    Failed {
        unit: usize,
        locator: String,
        reason: String,
    },
}

/// Reads and decodes one image into RGBA8.
pub fn load_image(locator: &ImageLocator) -> Result<RgbaImage> {
    let decoded = match locator {
        ImageLocator::Path(path) => image::open(path)
            .with_context(|| format!("failed to open image at {}", path.display()))?,
        ImageLocator::Url(url) => {
            let bytes = reqwest::blocking::get(url)
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.bytes())
                .with_context(|| format!("failed to fetch {url}"))?;
            image::load_from_memory(&bytes)
                .with_context(|| format!("failed to decode image from {url}"))?
        }
    };
    Ok(decoded.to_rgba8())
}

/// Starts one worker per locator; each reports exactly one [`LoadEvent`].
pub fn spawn_loaders<F>(
    locators: [ImageLocator; TEXTURE_UNIT_COUNT],
    notify: F,
) -> Result<Vec<JoinHandle<()>>>
where
    F: Fn(LoadEvent) + Send + Clone + 'static,
{
    let mut handles = Vec::with_capacity(TEXTURE_UNIT_COUNT);
    for (unit, locator) in locators.into_iter().enumerate() {
        let notify = notify.clone();
        let handle = thread::Builder::new()
            .name(format!("image-loader-{unit}"))
            .spawn(move || {
                let event = match load_image(&locator) {
                    Ok(image) => {
                        tracing::debug!(
                            unit,
                            %locator,
                            width = image.width(),
                            height = image.height(),
                            "image decoded"
                        );
                        LoadEvent::Loaded(LoadedImage { unit, image })
                    }
                    Err(err) => LoadEvent::Failed {
                        unit,
                        locator: locator.to_string(),
                        reason: format!("{err:#}"),
                    },
                };
                notify(event);
            })
            .map_err(|err| anyhow!("failed to spawn image loader thread: {err}"))?;
        handles.push(handle);
    }
    Ok(handles)
}

/// Outcome of feeding one event to a [`LoadTracker`].
#[derive(Debug)]
pub(crate) enum LoadProgress {
    /// Still waiting on at least one image.
    Pending,
    /// Every unit has an image; emitted once.
    Complete([RgbaImage; TEXTURE_UNIT_COUNT]),
    /// A load failed; emitted once.
    Failed(EngineError),
    /// The tracker already settled, the event was dropped.
    Ignored,
}

/// Gates texture upload until both images are present.
#[derive(Debug)]
pub(crate) struct LoadTracker {
    locators: [String; TEXTURE_UNIT_COUNT],
    slots: [Option<RgbaImage>; TEXTURE_UNIT_COUNT],
    settled: bool,
}

impl LoadTracker {
    pub fn new(locators: &[ImageLocator; TEXTURE_UNIT_COUNT]) -> Self {
        Self {
            locators: locators.clone().map(|locator| locator.to_string()),
            slots: Default::default(),
            settled: false,
        }
    }

    #[cfg(test)]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn record(&mut self, event: LoadEvent) -> LoadProgress {
        if self.settled {
            return LoadProgress::Ignored;
        }
        match event {
            LoadEvent::Loaded(loaded) => {
                let Some(slot) = self.slots.get_mut(loaded.unit) else {
                    return LoadProgress::Ignored;
                };
                *slot = Some(loaded.image);
                if self.slots.iter().any(Option::is_none) {
                    return LoadProgress::Pending;
                }
                self.settled = true;
                let [first, second] = std::mem::take(&mut self.slots);
                match (first, second) {
                    (Some(first), Some(second)) => LoadProgress::Complete([first, second]),
                    _ => LoadProgress::Pending,
                }
            }
            LoadEvent::Failed {
                locator, reason, ..
            } => {
                self.settled = true;
                LoadProgress::Failed(EngineError::ResourceUnavailable { locator, reason })
            }
        }
    }

    /// Fails the load if it has not settled yet.
    pub fn expire(&mut self, waited: Duration) -> Option<EngineError> {
        if self.settled {
            return None;
        }
        self.settled = true;
        let pending = self
            .slots
            .iter()
            .position(Option::is_none)
            .unwrap_or_default();
        Some(EngineError::ResourceUnavailable {
            locator: self.locators[pending].clone(),
            reason: format!("not loaded within {}s", waited.as_secs_f32()),
        })
    }
}

/// Height over width of the base image.
pub(crate) fn image_aspect(image: &RgbaImage) -> f32 {
    image.height() as f32 / image.width().max(1) as f32
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> ImageLocator {
        let path = dir.join(name);
        RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 255]))
            .save(&path)
            .unwrap();
        ImageLocator::Path(path)
    }

    fn loaded(unit: usize, width: u32, height: u32) -> LoadEvent {
        LoadEvent::Loaded(LoadedImage {
            unit,
            image: RgbaImage::new(width, height),
        })
    }

    fn locators() -> [ImageLocator; 2] {
        [
            ImageLocator::parse("photo.png"),
            ImageLocator::parse("photo_depth.png"),
        ]
    }

    #[test]
    fn completes_only_with_both_images() {
        let mut tracker = LoadTracker::new(&locators());
        // depth map first
        assert!(matches!(tracker.record(loaded(1, 4, 3)), LoadProgress::Pending));
        assert!(!tracker.is_settled());
        match tracker.record(loaded(0, 8, 6)) {
            LoadProgress::Complete([original, depth]) => {
                assert_eq!(original.dimensions(), (8, 6));
                assert_eq!(depth.dimensions(), (4, 3));
                assert_eq!(image_aspect(&original), 0.75);
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert!(matches!(tracker.record(loaded(0, 8, 6)), LoadProgress::Ignored));
        assert!(tracker.expire(Duration::from_secs(30)).is_none());
    }

    #[test]
    fn failure_settles_tracker() {
        let mut tracker = LoadTracker::new(&locators());
        tracker.record(loaded(0, 2, 2));
        let failure = LoadEvent::Failed {
            unit: 1,
            locator: "photo_depth.png".into(),
            reason: "no such file".into(),
        };
        match tracker.record(failure) {
            LoadProgress::Failed(EngineError::ResourceUnavailable { locator, .. }) => {
                assert_eq!(locator, "photo_depth.png");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(matches!(tracker.record(loaded(1, 2, 2)), LoadProgress::Ignored));
    }

    #[test]
    fn expiry_names_missing_image() {
        let mut tracker = LoadTracker::new(&locators());
        tracker.record(loaded(0, 2, 2));
        let err = tracker.expire(Duration::from_secs(30)).unwrap();
        assert!(err.to_string().contains("photo_depth.png"), "{err}");
        assert!(tracker.expire(Duration::from_secs(30)).is_none());
    }

    #[test]
    fn worker_threads_report_each_image() {
        let dir = tempfile::tempdir().unwrap();
        let original = write_png(dir.path(), "original.png", 40, 30);
        let depth = write_png(dir.path(), "depth.png", 40, 30);

        let (tx, rx) = crossbeam_channel::unbounded();
        let handles = spawn_loaders([original.clone(), depth.clone()], move |event| {
            let _ = tx.send(event);
        })
        .unwrap();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut tracker = LoadTracker::new(&[original, depth]);
        let mut completed = None;
        for event in rx.try_iter() {
            if let LoadProgress::Complete(images) = tracker.record(event) {
                completed = Some(images);
            }
        }
        let [first, _] = completed.expect("both images loaded");
        assert_eq!(first.dimensions(), (40, 30));
        assert_eq!(first.get_pixel(0, 0).0, [200, 100, 50, 255]);
    }

    #[test]
    fn missing_file_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let present = write_png(dir.path(), "original.png", 2, 2);
        let missing = ImageLocator::Path(dir.path().join("absent.png"));

        let (tx, rx) = crossbeam_channel::unbounded();
        for handle in spawn_loaders([present, missing], move |event| {
            let _ = tx.send(event);
        })
        .unwrap()
        {
            handle.join().unwrap();
        }

        let failures: Vec<_> = rx
            .try_iter()
            .filter_map(|event| match event {
                LoadEvent::Failed { unit, reason, .. } => Some((unit, reason)),
                LoadEvent::Loaded(_) => None,
            })
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, 1);
        assert!(failures[0].1.contains("absent.png"));
    }
}
