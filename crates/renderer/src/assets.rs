use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use transition::{SlideIndex, SlideSet, DISPLACEMENT_INDEX};

/// Opens an image from disk and converts it to 8-bit RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let image =
        image::open(path).with_context(|| format!("failed to open image at {}", path.display()))?;
    Ok(image.to_rgba8())
}

/// Decoded images for a slide set, keyed by slide index.
///
/// Successful decodes are kept for the lifetime of the cache; failures are
/// not remembered so a later request retries the file.
#[derive(Debug)]
pub struct ImageCache {
    sources: SlideSet<PathBuf>,
    decoded: HashMap<SlideIndex, Arc<RgbaImage>>,
}

impl ImageCache {
    pub fn new(sources: SlideSet<PathBuf>) -> Self {
        Self {
            sources,
            decoded: HashMap::new(),
        }
    }

    pub fn sources(&self) -> &SlideSet<PathBuf> {
        &self.sources
    }

    /// Returns the image for `index`; index 0 is the displacement map.
    pub fn load(&mut self, index: SlideIndex) -> Result<Arc<RgbaImage>> {
        if let Some(image) = self.decoded.get(&index) {
            return Ok(Arc::clone(image));
        }

        let path = if index == DISPLACEMENT_INDEX {
            self.sources.displacement()
        } else {
            self.sources.slide(index).ok_or_else(|| {
                anyhow!(
                    "slide {index} is outside 1..={}",
                    self.sources.max_index()
                )
            })?
        };

        let image = Arc::new(load_image(path)?);
        tracing::debug!(
            slide = index,
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "decoded image"
        );
        self.decoded.insert(index, Arc::clone(&image));
        Ok(image)
    }

    pub fn is_cached(&self, index: SlideIndex) -> bool {
        self.decoded.contains_key(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    fn write_png(path: &Path, color: [u8; 4]) {
        RgbaImage::from_pixel(2, 2, Rgba(color)).save(path).unwrap();
    }

    #[test]
    fn caches_successful_loads() {
        let dir = TempDir::new().unwrap();
        let map = dir.path().join("map.png");
        let slide = dir.path().join("a.png");
        write_png(&map, [0, 0, 0, 255]);
        write_png(&slide, [255, 0, 0, 255]);

        let set = SlideSet::from_parts(map, [slide.clone()]).unwrap();
        let mut cache = ImageCache::new(set);
        let first = cache.load(1).unwrap();
        assert_eq!(first.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert!(cache.is_cached(1));

        std::fs::remove_file(&slide).unwrap();
        let second = cache.load(1).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn failures_are_retried() {
        let dir = TempDir::new().unwrap();
        let map = dir.path().join("map.png");
        let slide = dir.path().join("late.png");
        write_png(&map, [0, 0, 0, 255]);

        let set = SlideSet::from_parts(map, [slide.clone()]).unwrap();
        let mut cache = ImageCache::new(set);
        assert!(cache.load(1).is_err());
        assert!(!cache.is_cached(1));

        write_png(&slide, [0, 255, 0, 255]);
        let image = cache.load(1).unwrap();
        assert_eq!(image.get_pixel(1, 1), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn rejects_out_of_range_index() {
        let dir = TempDir::new().unwrap();
        let set = SlideSet::from_parts(dir.path().join("m.png"), [dir.path().join("a.png")])
            .unwrap();
        let mut cache = ImageCache::new(set);
        let err = cache.load(2).unwrap_err();
        assert!(err.to_string().contains("outside 1..=1"));
    }
}
