// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Mip and subresource arithmetic.

Nothing in this module touches the driver. Every function that takes an index validates it
and returns [`Error::Bounds`] rather than producing a wrapped or out-of-range value.
*/

use crate::error::{Error, Result};

/// Dimension of one axis at mip `level`: `max(1, base >> level)`.
#[inline]
pub const fn mip_dimension(base: u32, level: u32) -> u32 {
    let shift = if level > 31 { 31 } else { level };
    let d = base >> shift;
    if d == 0 { 1 } else { d }
}

/**
Number of mips in a full chain for the given extents.

Only power-of-two textures are mipmapped; for them this is `log2(largest) + 1`. Any other extent
yields a single level.
*/
pub const fn full_mip_count(width: u32, height: u32, depth: u32) -> u32 {
    if !width.is_power_of_two() || !height.is_power_of_two() || !depth.is_power_of_two() {
        return 1;
    }
    let mut largest = width;
    if height > largest {
        largest = height;
    }
    if depth > largest {
        largest = depth;
    }
    largest.trailing_zeros() + 1
}

/// Texels in mip `level` of a `width x height x depth` texture.
#[inline]
pub const fn texels_in_mip(width: u32, height: u32, depth: u32, level: u32) -> u64 {
    mip_dimension(width, level) as u64
        * mip_dimension(height, level) as u64
        * mip_dimension(depth, level) as u64
}

/// Total texels across `num_mips` levels.
pub const fn texels_in_chain(width: u32, height: u32, depth: u32, num_mips: u32) -> u64 {
    let mut total = 0;
    let mut level = 0;
    while level < num_mips {
        total += texels_in_mip(width, height, depth, level);
        level += 1;
    }
    total
}

pub(crate) fn check_mip(mip: u32, num_mips: u32) -> Result<()> {
    if mip < num_mips {
        Ok(())
    } else {
        Err(Error::Bounds(format!(
            "mip index {mip} out of range: only {num_mips} present"
        )))
    }
}

pub(crate) fn check_array_index(array_index: u32, array_length: u32) -> Result<()> {
    if array_index < array_length {
        Ok(())
    } else {
        Err(Error::Bounds(format!(
            "array index {array_index} out of range: array length is {array_length}"
        )))
    }
}

/// Subresource index of `mip` on a standalone texture.
pub fn subresource_index(mip: u32, num_mips: u32) -> Result<u32> {
    check_mip(mip, num_mips)?;
    Ok(mip)
}

/// Subresource index of `mip` on element `array_index` of a texture array.
pub fn array_subresource_index(
    mip: u32,
    num_mips: u32,
    array_index: u32,
    array_length: u32,
) -> Result<u32> {
    check_mip(mip, num_mips)?;
    check_array_index(array_index, array_length)?;
    Ok(mip + array_index * num_mips)
}

/**
A region of a subresource, in texels (or bytes, for buffers).

Bounds are half-open: `left..right`, `top..bottom`, `front..back`.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubresourceBox {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
    pub front: u32,
    pub back: u32,
}

impl SubresourceBox {
    /// A one-dimensional span; the other axes cover a single row and slice.
    pub const fn span(left: u32, right: u32) -> Self {
        Self::area(left, right, 0, 1)
    }

    pub const fn area(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self::volume_of(left, right, top, bottom, 0, 1)
    }

    pub const fn volume_of(
        left: u32,
        right: u32,
        top: u32,
        bottom: u32,
        front: u32,
        back: u32,
    ) -> Self {
        SubresourceBox {
            left,
            right,
            top,
            bottom,
            front,
            back,
        }
    }

    pub const fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub const fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub const fn depth(&self) -> u32 {
        self.back.saturating_sub(self.front)
    }

    pub const fn volume(&self) -> u64 {
        self.width() as u64 * self.height() as u64 * self.depth() as u64
    }

    /// Verifies the box is well-formed and lies within `width x height x depth`.
    pub(crate) fn check_within(&self, width: u32, height: u32, depth: u32) -> Result<()> {
        if self.left > self.right || self.top > self.bottom || self.front > self.back {
            return Err(Error::Bounds(format!("inverted region {self:?}")));
        }
        if self.right > width || self.bottom > height || self.back > depth {
            return Err(Error::Bounds(format!(
                "region {self:?} exceeds extents {width}x{height}x{depth}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 256)]
    #[case(1, 128)]
    #[case(7, 2)]
    #[case(8, 1)]
    #[case(9, 1)]
    #[case(40, 1)]
    fn mip_dimensions_of_256(#[case] level: u32, #[case] expected: u32) {
        assert_eq!(mip_dimension(256, level), expected);
    }

    #[test]
    fn odd_dimensions_floor() {
        assert_eq!(mip_dimension(7, 1), 3);
        assert_eq!(mip_dimension(7, 2), 1);
        assert_eq!(mip_dimension(1, 0), 1);
    }

    #[test]
    fn mip_counts() {
        assert_eq!(full_mip_count(256, 256, 1), 9);
        assert_eq!(full_mip_count(256, 4, 1), 9);
        assert_eq!(full_mip_count(1, 1, 1), 1);
        assert_eq!(full_mip_count(100, 64, 1), 1);
    }

    #[test]
    fn chain_size() {
        // 4x4 + 2x2 + 1x1
        assert_eq!(texels_in_chain(4, 4, 1, 3), 21);
        // 8 + 4 + 2 + 1
        assert_eq!(texels_in_chain(8, 1, 1, 4), 15);
        // 4x4x4 + 2x2x2 + 1
        assert_eq!(texels_in_chain(4, 4, 4, 3), 73);
    }

    #[test]
    fn subresource_indices() {
        assert_eq!(subresource_index(2, 3).unwrap(), 2);
        assert_eq!(array_subresource_index(1, 3, 2, 4).unwrap(), 7);
        assert_eq!(array_subresource_index(0, 1, 3, 4).unwrap(), 3);
        assert!(matches!(subresource_index(3, 3), Err(Error::Bounds(_))));
        assert!(matches!(
            array_subresource_index(0, 3, 4, 4),
            Err(Error::Bounds(_))
        ));
    }

    #[test]
    fn box_defaults() {
        let b = SubresourceBox::span(2, 6);
        assert_eq!((b.width(), b.height(), b.depth()), (4, 1, 1));
        assert_eq!(b.volume(), 4);
        let b = SubresourceBox::area(0, 3, 1, 3);
        assert_eq!(b.volume(), 6);
        assert!(b.check_within(3, 3, 1).is_ok());
        assert!(b.check_within(2, 3, 1).is_err());
        assert!(SubresourceBox::span(5, 2).check_within(10, 1, 1).is_err());
    }
}
