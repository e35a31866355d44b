use std::fmt;

use crate::slides::SlideIndex;
use crate::TransitionError;

const SLOT_COUNT: usize = 3;

/// Logical texture binding points read by the transition shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Displacement,
    Active,
    Next,
}

impl Slot {
    /// Slots in binding order.
    pub const ALL: [Slot; SLOT_COUNT] = [Slot::Displacement, Slot::Active, Slot::Next];

    /// Sampler name the shader program is compiled against.
    pub fn sampler_name(self) -> &'static str {
        match self {
            Slot::Displacement => "displacement",
            Slot::Active => "activeTexture",
            Slot::Next => "nextTexture",
        }
    }

    /// Position of the slot in binding order.
    pub fn index(self) -> usize {
        match self {
            Slot::Displacement => 0,
            Slot::Active => 1,
            Slot::Next => 2,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Displacement => f.write_str("displacement"),
            Slot::Active => f.write_str("active"),
            Slot::Next => f.write_str("next"),
        }
    }
}

/// A bound slot: fixed sampler name plus a swappable source.
#[derive(Debug)]
pub struct TextureSlot<T> {
    sampler: &'static str,
    slide: SlideIndex,
    source: T,
}

impl<T> TextureSlot<T> {
    pub fn sampler(&self) -> &'static str {
        self.sampler
    }

    /// Slide index currently backing this slot.
    pub fn slide(&self) -> SlideIndex {
        self.slide
    }

    pub fn source(&self) -> &T {
        &self.source
    }
}

/// Bookkeeping for the bind-once / swap-many texture protocol.
///
/// `T` is the backend's texture representation. Each slot is bound exactly
/// once; afterwards only its source may change. A failed swap leaves the
/// previous source in place.
#[derive(Debug)]
pub struct SlotTable<T> {
    slots: [Option<TextureSlot<T>>; SLOT_COUNT],
}

impl<T> SlotTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `slot` with its sampler and initial source.
    pub fn bind(
        &mut self,
        slot: Slot,
        slide: SlideIndex,
        source: T,
    ) -> Result<&TextureSlot<T>, TransitionError> {
        let entry = &mut self.slots[slot.index()];
        if let Some(bound) = entry {
            return Err(TransitionError::SlotAlreadyBound(slot, bound.sampler));
        }
        Ok(entry.insert(TextureSlot {
            sampler: slot.sampler_name(),
            slide,
            source,
        }))
    }

    /// Replaces the source of a bound slot.
    ///
    /// `load` receives the current source so backends can update it in place
    /// and must return the value that should back the slot from now on. When
    /// it fails the slot keeps its previous source and the error is reported
    /// as [`TransitionError::AssetLoad`].
    pub fn set_source<F, E>(
        &mut self,
        slot: Slot,
        slide: SlideIndex,
        load: F,
    ) -> Result<&TextureSlot<T>, TransitionError>
    where
        F: FnOnce(&T) -> Result<T, E>,
        E: fmt::Display,
    {
        let bound = self.slots[slot.index()]
            .as_mut()
            .ok_or(TransitionError::SlotNotBound(slot))?;
        let source = load(&bound.source).map_err(|err| TransitionError::AssetLoad {
            slot,
            slide,
            reason: err.to_string(),
        })?;
        bound.source = source;
        bound.slide = slide;
        Ok(bound)
    }

    pub fn get(&self, slot: Slot) -> Option<&TextureSlot<T>> {
        self.slots[slot.index()].as_ref()
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        self.slots[slot.index()]
            .as_mut()
            .map(|bound| &mut bound.source)
    }

    pub fn require(&self, slot: Slot) -> Result<&TextureSlot<T>, TransitionError> {
        self.get(slot).ok_or(TransitionError::SlotNotBound(slot))
    }

    /// True once every slot has been bound.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Iterates over bound slots in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &TextureSlot<T>)> {
        Slot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|bound| (slot, bound)))
    }
}

impl<T> Default for SlotTable<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}
