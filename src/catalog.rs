//! The fixed, cyclic list of images the viewer can show.

use crate::error::{CubeError, Result};

/// Identifies one cross-layout image.
///
/// The discriminant is the small integer handed to image providers and
/// persisted by hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageId {
    Islands = 0,
    Lighthouse = 1,
    River = 2,
    Gallery = 3,
    Grid = 4,
}

impl ImageId {
    pub const ALL: [ImageId; 5] = [
        ImageId::Islands,
        ImageId::Lighthouse,
        ImageId::River,
        ImageId::Gallery,
        ImageId::Grid,
    ];

    /// The integer identifier of this image.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Short name, also used as the file stem by directory-backed providers.
    pub fn name(self) -> &'static str {
        match self {
            ImageId::Islands => "islands",
            ImageId::Lighthouse => "lighthouse",
            ImageId::River => "river",
            ImageId::Gallery => "gallery",
            ImageId::Grid => "grid",
        }
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One selectable catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewItem {
    pub index: usize,
    pub image: ImageId,
    /// The gallery image is drawn on a cube magnified 8× so the room reads at
    /// the right size from the eye position.
    pub requires_scale: bool,
}

const ITEMS: [ViewItem; 5] = [
    ViewItem {
        index: 0,
        image: ImageId::Islands,
        requires_scale: false,
    },
    ViewItem {
        index: 1,
        image: ImageId::Lighthouse,
        requires_scale: false,
    },
    ViewItem {
        index: 2,
        image: ImageId::River,
        requires_scale: false,
    },
    ViewItem {
        index: 3,
        image: ImageId::Gallery,
        requires_scale: true,
    },
    ViewItem {
        index: 4,
        image: ImageId::Grid,
        requires_scale: false,
    },
];

/// Lookup table plus the cyclic advance rule. Holds no state.
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewCatalog;

impl ViewCatalog {
    pub const LEN: usize = ITEMS.len();

    pub fn new() -> Self {
        Self
    }

    /// The index after `current`, wrapping back to 0. Out-of-range input is
    /// reduced into the catalog first.
    pub fn advance(&self, current: usize) -> usize {
        (current % Self::LEN + 1) % Self::LEN
    }

    /// The item at `index`, or [`CubeError::InvalidIndex`].
    pub fn item_at(&self, index: usize) -> Result<ViewItem> {
        ITEMS.get(index).copied().ok_or(CubeError::InvalidIndex {
            index,
            len: Self::LEN,
        })
    }

    /// Number of items, always [`ViewCatalog::LEN`].
    pub fn len(&self) -> usize {
        Self::LEN
    }

    /// Never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Items in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ViewItem> {
        ITEMS.iter()
    }
}
