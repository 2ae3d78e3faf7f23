// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Element and texel formats.
//!
//! Every buffer is generic over an [`Element`] and every texture over a [`Texel`]. Both are
//! plain-old-data types (`bytemuck::Pod`), so they can be copied to and from mapped driver
//! memory byte-for-byte. Each type names the [`ResourceFormat`] the driver should use for it.
//!
//! # Available texel types
//!
//! ## Single channel
//! - `u8`, `i8`, `u16`, `i16`, `u32`, `i32`
//! - `f32` (R32Float), [`f16`] (R16Float)
//!
//! ## Multi-channel
//! - `[f32; 2]`, `[f32; 3]`, `[f32; 4]`
//! - [`Rgba8Unorm`], [`Bgra8Unorm`] (4 bytes)
//! - [`Rgba16Unorm`] (8 bytes)
//! - [`Rgba32Float`] (16 bytes)
//!
//! ```
//! use texels_and_buffers::pixel_formats::{Element, ResourceFormat, Rgba8Unorm};
//! let red = Rgba8Unorm { r: 255, g: 0, b: 0, a: 255 };
//! assert_eq!(Rgba8Unorm::FORMAT, ResourceFormat::R8G8B8A8Unorm);
//! # let _ = red;
//! ```

/*
Structs that are not a known format still make perfectly good buffer elements: the driver treats
those buffers as structured, with a stride of size_of::<E>().  They can't be textures.
 */

use std::fmt::Debug;

pub use half::f16;

/// Native format codes passed to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFormat {
    /// No typed format; the buffer is structured.
    Unknown,
    R8Uint,
    R8Sint,
    R16Uint,
    R16Sint,
    R16Float,
    R32Uint,
    R32Sint,
    R32Float,
    R32G32Float,
    R32G32B32Float,
    R32G32B32A32Float,
    R8G8B8A8Unorm,
    B8G8R8A8Unorm,
    R16G16B16A16Unorm,
}

/// A type that can be stored in a buffer.
pub trait Element: bytemuck::Pod + Debug + Send + Sync + 'static {
    /// Typed format of the element, or [`ResourceFormat::Unknown`] for structured data.
    const FORMAT: ResourceFormat = ResourceFormat::Unknown;
    /// Size of one element, in bytes.
    const SIZE: usize = std::mem::size_of::<Self>();
}

/**
A type that can be stored in a texture.

Only types with a typed [`ResourceFormat`] implement this.
*/
pub trait Texel: Element {}

macro_rules! typed_element {
    ($($t:ty => $f:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const FORMAT: ResourceFormat = ResourceFormat::$f;
            }
            impl Texel for $t {}
        )*
    };
}

typed_element! {
    u8 => R8Uint,
    i8 => R8Sint,
    u16 => R16Uint,
    i16 => R16Sint,
    f16 => R16Float,
    u32 => R32Uint,
    i32 => R32Sint,
    f32 => R32Float,
    [f32; 2] => R32G32Float,
    [f32; 3] => R32G32B32Float,
    [f32; 4] => R32G32B32A32Float,
    Rgba8Unorm => R8G8B8A8Unorm,
    Bgra8Unorm => B8G8R8A8Unorm,
    Rgba16Unorm => R16G16B16A16Unorm,
    Rgba32Float => R32G32B32A32Float,
}

/// 4-channel 8-bit normalized texel (0-255 mapped to 0.0-1.0).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgba8Unorm {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// 4-channel 8-bit normalized texel in BGRA order, the usual swapchain layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Bgra8Unorm {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl From<Rgba8Unorm> for Bgra8Unorm {
    fn from(p: Rgba8Unorm) -> Self {
        Bgra8Unorm {
            b: p.b,
            g: p.g,
            r: p.r,
            a: p.a,
        }
    }
}

/// 4-channel 16-bit normalized texel (0-65535 mapped to 0.0-1.0).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgba16Unorm {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}

/// 4-channel 32-bit float texel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgba32Float {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Views a slice of elements as raw bytes.
#[inline]
pub(crate) fn elements_as_bytes<E: Element>(e: &[E]) -> &[u8] {
    bytemuck::cast_slice(e)
}

/**
Decodes bytes read back from the driver into elements.

Mapped driver memory carries no alignment promise for `E`, so this always copies.
*/
pub(crate) fn elements_from_bytes<E: Element>(bytes: &[u8]) -> Vec<E> {
    let mut out = vec![E::zeroed(); bytes.len() / E::SIZE];
    let n = out.len() * E::SIZE;
    bytemuck::cast_slice_mut::<E, u8>(&mut out).copy_from_slice(&bytes[..n]);
    out
}

/**
Runs `f` over `bytes` reinterpreted as elements, writing any changes back.

Aligned memory is handed out in place; otherwise `f` sees a copy that is written back after it returns.
*/
pub(crate) fn with_elements_mut<E: Element, R>(bytes: &mut [u8], f: impl FnOnce(&mut [E]) -> R) -> R {
    match bytemuck::try_cast_slice_mut::<u8, E>(bytes) {
        Ok(elements) => f(elements),
        Err(_) => {
            let mut copy = elements_from_bytes::<E>(bytes);
            let r = f(&mut copy);
            let written = elements_as_bytes(&copy);
            bytes[..written.len()].copy_from_slice(written);
            r
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    #[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    struct Particle {
        position: [f32; 3],
        age: f32,
    }
    impl Element for Particle {}

    #[test]
    fn structured_elements_have_unknown_format() {
        assert_eq!(Particle::FORMAT, ResourceFormat::Unknown);
        assert_eq!(Particle::SIZE, 16);
    }

    #[test]
    fn typed_sizes() {
        assert_eq!(<f16 as Element>::SIZE, 2);
        assert_eq!(Rgba16Unorm::SIZE, 8);
        assert_eq!(<[f32; 3] as Element>::FORMAT, ResourceFormat::R32G32B32Float);
    }

    #[test]
    fn bytes_round_trip_unaligned() {
        let values = [1.5f32, -2.0, 3.25];
        let bytes = elements_as_bytes(&values);
        let mut shifted = vec![0u8; 1];
        shifted.extend_from_slice(bytes);
        let back: Vec<f32> = elements_from_bytes(&shifted[1..]);
        assert_eq!(back, values);
    }

    #[test]
    fn in_place_edit_survives_misalignment() {
        let values = [1u32, 2, 3];
        let mut shifted = vec![0u8; 1];
        shifted.extend_from_slice(elements_as_bytes(&values));
        with_elements_mut::<u32, _>(&mut shifted[1..], |e| {
            for v in e.iter_mut() {
                *v *= 10;
            }
        });
        let back: Vec<u32> = elements_from_bytes(&shifted[1..]);
        assert_eq!(back, [10, 20, 30]);
    }

    #[test]
    fn trailing_partial_element_is_dropped() {
        let mut bytes = elements_as_bytes(&[7u16, 8]).to_vec();
        bytes.push(0xff);
        let back: Vec<u16> = elements_from_bytes(&bytes);
        assert_eq!(back, [7, 8]);
    }
}
