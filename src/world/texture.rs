// Format-agnostic repository of textures decoded by the asset loader.
// The renderer and world logic interact through `TextureId` only.

use std::collections::HashMap;

use tracing::warn;

/// Runtime handle for a texture in this bank.
///
/// *Guaranteed* to remain stable for the lifetime of the bank.
pub type TextureId = u16;

/// Sentinel returned for names the bank does not know.  Never a valid index.
pub const NO_TEXTURE: TextureId = TextureId::MAX;

/// Solid colour painted wherever a texture id cannot be resolved (RGBA).
pub const FALLBACK_COLOR: [u8; 4] = [255, 0, 255, 255];

/// Sprite texel colour treated as fully transparent.
pub const TRANSPARENT_KEY: [u8; 3] = [152, 0, 136];

/// CPU-side storage: **RGBA**, 4 bytes per texel, row-major.
/// The loader fills the pixel vector; sampling is nearest-neighbour only.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub w: usize,
    pub h: usize,
    pub pixels: Vec<u8>,
}

impl Texture {
    /// Wrap an already decoded RGBA buffer.
    pub fn from_rgba(w: usize, h: usize, pixels: Vec<u8>) -> Result<Self, TextureError> {
        if w == 0 || h == 0 || pixels.len() != w * h * 4 {
            return Err(TextureError::BadSize {
                w,
                h,
                len: pixels.len(),
            });
        }
        Ok(Self { w, h, pixels })
    }

    /// One flat colour, handy for tests and placeholder assets.
    pub fn solid(w: usize, h: usize, rgba: [u8; 4]) -> Self {
        Self {
            w,
            h,
            pixels: rgba.repeat(w * h),
        }
    }

    /// Texel at integer coords, clamped to the texture edge.
    ///
    /// An empty texture, or one whose buffer is shorter than `w * h`, reads
    /// as [`FALLBACK_COLOR`].
    #[inline]
    pub fn texel(&self, u: usize, v: usize) -> [u8; 4] {
        if self.w == 0 || self.h == 0 {
            return FALLBACK_COLOR;
        }
        let u = u.min(self.w - 1);
        let v = v.min(self.h - 1);
        let i = (v * self.w + u) * 4;
        match self.pixels.get(i..i + 4) {
            Some(&[r, g, b, a]) => [r, g, b, a],
            _ => FALLBACK_COLOR,
        }
    }

    /// Nearest-neighbour sample at normalised `(u, v)`; both wrap at 1.0.
    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> [u8; 4] {
        let u = u - u.floor();
        let v = v - v.floor();
        self.texel((u * self.w as f32) as usize, (v * self.h as f32) as usize)
    }
}

/// Things that can go wrong when using the bank.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Attempted to insert a second texture with an existing name.
    #[error("texture name `{0}` already present in bank")]
    Duplicate(String),

    /// Requested ID is outside `0 .. bank.len()`.
    #[error("texture id {0} out of range")]
    BadId(TextureId),

    /// Pixel buffer does not match the stated dimensions.
    #[error("texture {w}x{h} needs {} bytes, got {len}", w * h * 4)]
    BadSize { w: usize, h: usize, len: usize },
}

/// A format-agnostic cache of textures.
///
/// * Holds decoded RGBA only; there is no file format here.
/// * Stores exactly one copy of every name.
/// * Immutable once handed to the renderer; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct TextureBank {
    by_name: HashMap<String, TextureId>,
    data: Vec<Texture>,
}

impl TextureBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of textures stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Obtain the id for a *loaded* texture by name.
    /// Returns `None` if the name is unknown.
    pub fn id(&self, name: &str) -> Option<TextureId> {
        self.by_name.get(name).copied()
    }

    /// Fallback-safe query: unknown names are logged and resolve to [`NO_TEXTURE`].
    pub fn id_or_missing(&self, name: &str) -> TextureId {
        self.id(name).unwrap_or_else(|| {
            warn!(name, "texture not found in bank");
            NO_TEXTURE
        })
    }

    /// Borrow a texture by id, with bounds-checking.
    pub fn texture(&self, id: TextureId) -> Result<&Texture, TextureError> {
        self.data.get(id as usize).ok_or(TextureError::BadId(id))
    }

    /// Hot-path lookup: `None` for the sentinel or any out-of-range id.
    #[inline]
    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.data.get(id as usize)
    }

    /// Sample `id` at normalised coords, or [`FALLBACK_COLOR`] when unresolved.
    #[inline]
    pub fn sample(&self, id: TextureId, u: f32, v: f32) -> [u8; 4] {
        match self.get(id) {
            Some(tex) => tex.sample(u, v),
            None => FALLBACK_COLOR,
        }
    }

    /// Insert a texture under `name`.
    ///
    /// * Returns the newly assigned `TextureId`.
    /// * Fails if the name already exists (`Duplicate`).
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        tex: Texture,
    ) -> Result<TextureId, TextureError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(TextureError::Duplicate(name));
        }
        let id = self.data.len() as TextureId;
        if id == NO_TEXTURE {
            return Err(TextureError::BadId(id));
        }
        self.data.push(tex);
        self.by_name.insert(name, id);
        Ok(id)
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
