use crate::TransitionError;

/// Position of an image inside a [`SlideSet`].
pub type SlideIndex = usize;

/// Index reserved for the displacement map.
pub const DISPLACEMENT_INDEX: SlideIndex = 0;
/// First navigable slide; also the slide shown when an engine starts.
pub const FIRST_SLIDE: SlideIndex = 1;

/// Ordered, immutable collection of images backing a slideshow.
///
/// Index 0 holds the displacement map, indices `1..=max_index` are the
/// navigable slides. `T` is whatever the host uses to reference an image
/// (a path, a decoded buffer, a test label).
#[derive(Debug, Clone)]
pub struct SlideSet<T> {
    images: Vec<T>,
}

impl<T> SlideSet<T> {
    /// Builds a set from the displacement map followed by the slides.
    pub fn new(images: Vec<T>) -> Result<Self, TransitionError> {
        if images.len() < 2 {
            return Err(TransitionError::EmptySlideSet(images.len()));
        }
        Ok(Self { images })
    }

    /// Convenience constructor keeping the displacement map separate.
    pub fn from_parts(
        displacement: T,
        slides: impl IntoIterator<Item = T>,
    ) -> Result<Self, TransitionError> {
        let mut images = vec![displacement];
        images.extend(slides);
        Self::new(images)
    }

    pub fn max_index(&self) -> SlideIndex {
        self.images.len() - 1
    }

    pub fn slide_count(&self) -> usize {
        self.max_index()
    }

    pub fn contains(&self, index: SlideIndex) -> bool {
        (FIRST_SLIDE..=self.max_index()).contains(&index)
    }

    pub fn displacement(&self) -> &T {
        &self.images[DISPLACEMENT_INDEX]
    }

    /// Returns a navigable slide; the displacement map is never returned here.
    pub fn slide(&self, index: SlideIndex) -> Option<&T> {
        if self.contains(index) {
            self.images.get(index)
        } else {
            None
        }
    }

    /// Iterates over `(index, image)` pairs for the navigable slides.
    pub fn slides(&self) -> impl Iterator<Item = (SlideIndex, &T)> {
        self.images.iter().enumerate().skip(FIRST_SLIDE)
    }
}
