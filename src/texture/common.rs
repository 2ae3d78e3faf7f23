// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

/// Implements the accessors and operations every texture type shares.
macro_rules! texture_common {
    ($name:ident) => {
        impl<T: $crate::pixel_formats::Texel> $name<T> {
            pub fn width(&self) -> u32 {
                self.inner.shape().width
            }

            pub fn num_mips(&self) -> u32 {
                self.inner.shape().num_mips
            }

            pub fn is_mipmapped(&self) -> bool {
                self.inner.shape().mipmapped
            }

            pub fn is_mip_generation_target(&self) -> bool {
                self.inner.shape().mip_generation_target
            }

            pub fn is_dynamic_detail_target(&self) -> bool {
                self.inner.shape().dynamic_detail_target
            }

            pub fn is_multisampled(&self) -> bool {
                self.inner.shape().multisampled
            }

            pub fn is_array_member(&self) -> bool {
                self.inner.core().is_array_member()
            }

            /// Position within the owning array; 0 for standalone textures.
            pub fn array_index(&self) -> u32 {
                self.inner.array_index()
            }

            pub fn mip_width(&self, mip: u32) -> $crate::error::Result<u32> {
                Ok(self.inner.mip_extents(mip)?.0)
            }

            /// The native subresource index addressing `mip` of this texture.
            pub fn subresource_index(&self, mip: u32) -> $crate::error::Result<u32> {
                self.inner.subresource(mip)
            }

            /// Reads one mip.
            pub fn read(&self, mip: u32) -> $crate::error::Result<$crate::texture::TexelArray<T>> {
                self.inner.read(mip)
            }

            /// Reads every mip into one vector, smallest mip index first.
            pub fn read_all(&self) -> $crate::error::Result<Vec<T>> {
                self.inner.read_all()
            }

            /**
            Maps `mip` for reading and writing and passes it to `f`.

            The view honours the driver's row and depth pitch.
            */
            pub fn read_write(
                &self,
                mip: u32,
                f: impl FnOnce($crate::texture::TexelView<'_, T>),
            ) -> $crate::error::Result<()> {
                self.inner.read_write(mip, f)
            }

            /// Copies every mip into `dest`.
            pub fn copy_to(&self, dest: &$name<T>) -> $crate::error::Result<()> {
                self.inner.copy_to(&dest.inner)
            }

            /// Copies `region` of `src_mip` into `dst_mip` of `dest` at `(x, y, z)`.
            #[allow(clippy::too_many_arguments)]
            pub fn copy_region_to(
                &self,
                dest: &$name<T>,
                region: $crate::addressing::SubresourceBox,
                src_mip: u32,
                dst_mip: u32,
                x: u32,
                y: u32,
                z: u32,
            ) -> $crate::error::Result<()> {
                self.inner.copy_region_to(&dest.inner, region, src_mip, dst_mip, x, y, z)
            }

            /// A shader-resource view of `num_mips` mips starting at `first_mip`.
            pub fn create_view(
                &self,
                first_mip: u32,
                num_mips: u32,
            ) -> $crate::error::Result<$crate::view::ShaderResourceView> {
                self.inner.create_view(first_mip, num_mips)
            }

            /// Fills mips `1..` from mip 0. Requires a mip generation target.
            pub fn generate_mips(&self) -> $crate::error::Result<()> {
                self.inner.generate_mips()
            }
        }

        impl<T: $crate::pixel_formats::Texel> $crate::lifecycle::Resource for $name<T> {
            fn core(&self) -> &$crate::lifecycle::ResourceCore {
                self.inner.core()
            }
        }

        impl<T: $crate::pixel_formats::Texel> std::fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Debug::fmt(&self.inner, f)
            }
        }

        impl<T: $crate::pixel_formats::Texel> std::fmt::Display for $name<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.inner, f)
            }
        }
    };
}
