// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Texture arrays.

An array owns one native resource. Its members are ordinary [`Texture1D`]/[`Texture2D`] values
flagged as array members: they share the array's [`ResourceId`](crate::ResourceId), address their
own subresources (`mip + array_index * num_mips`), and refuse to be disposed on their own.
Disposing the array marks every member disposed and releases the native resource once.
*/

use std::ops::Index;

use crate::error::Result;
use crate::lifecycle::{Resource, ResourceCore};
use crate::native::{ViewKind, ViewRange};
use crate::pixel_formats::Texel;
use crate::view::{check_range, ResourceView, ShaderResourceView, UnorderedAccessView};

use super::{generate_mips_over, Texture1D, Texture2D, TextureShape};

macro_rules! texture_array {
    ($(#[$meta:meta])* $name:ident of $member:ident) => {
        $(#[$meta])*
        pub struct $name<T: Texel> {
            core: ResourceCore,
            members: Vec<$member<T>>,
        }

        impl<T: Texel> $name<T> {
            pub(crate) fn from_parts(core: ResourceCore, members: Vec<$member<T>>) -> Self {
                $name { core, members }
            }

            fn shape(&self) -> Option<&TextureShape> {
                self.members.first().map(|m| m.inner().shape())
            }

            /// Number of members.
            pub fn len(&self) -> usize {
                self.members.len()
            }

            pub fn is_empty(&self) -> bool {
                self.members.is_empty()
            }

            pub fn get(&self, index: usize) -> Option<&$member<T>> {
                self.members.get(index)
            }

            pub fn iter(&self) -> std::slice::Iter<'_, $member<T>> {
                self.members.iter()
            }

            pub fn num_mips(&self) -> u32 {
                self.shape().map_or(1, |s| s.num_mips)
            }

            fn array_range(
                &self,
                first_mip: u32,
                num_mips: u32,
                first_array: u32,
                array_count: u32,
            ) -> Result<ViewRange> {
                check_range("array element", first_array, array_count, self.len() as u32)?;
                Ok(ViewRange::Texture {
                    first_mip,
                    num_mips,
                    first_array,
                    array_count,
                    is_array: true,
                })
            }

            /// A shader-resource view over a range of mips and array elements.
            pub fn create_view(
                &self,
                first_mip: u32,
                num_mips: u32,
                first_array: u32,
                array_count: u32,
            ) -> Result<ShaderResourceView> {
                check_range("mip", first_mip, num_mips, self.num_mips())?;
                let range = self.array_range(first_mip, num_mips, first_array, array_count)?;
                ResourceView::create(&self.core, ViewKind::ShaderResource, T::FORMAT, range)
                    .map(ShaderResourceView)
            }

            /// An unordered-access view of one mip over a range of array elements.
            pub fn create_unordered_access_view(
                &self,
                mip: u32,
                first_array: u32,
                array_count: u32,
            ) -> Result<UnorderedAccessView> {
                check_range("mip", mip, 1, self.num_mips())?;
                let range = self.array_range(mip, 1, first_array, array_count)?;
                ResourceView::create(
                    &self.core,
                    ViewKind::UnorderedAccess {
                        append_consume: false,
                        include_counter: false,
                        raw: false,
                    },
                    T::FORMAT,
                    range,
                )
                .map(UnorderedAccessView)
            }

            /// Regenerates the mips of every member.
            pub fn generate_mips(&self) -> Result<()> {
                let Some(shape) = self.shape() else {
                    return Ok(());
                };
                let range = ViewRange::Texture {
                    first_mip: 0,
                    num_mips: shape.num_mips,
                    first_array: 0,
                    array_count: self.len() as u32,
                    is_array: true,
                };
                generate_mips_over::<T>(&self.core, shape, range)
            }
        }

        impl<T: Texel> Index<usize> for $name<T> {
            type Output = $member<T>;
            fn index(&self, index: usize) -> &$member<T> {
                &self.members[index]
            }
        }

        impl<'a, T: Texel> IntoIterator for &'a $name<T> {
            type Item = &'a $member<T>;
            type IntoIter = std::slice::Iter<'a, $member<T>>;
            fn into_iter(self) -> Self::IntoIter {
                self.members.iter()
            }
        }

        impl<T: Texel> Resource for $name<T> {
            fn core(&self) -> &ResourceCore {
                &self.core
            }

            /// Marks every member disposed, then releases the shared native resource once.
            fn dispose(&self) -> Result<()> {
                for member in &self.members {
                    member.inner().core().mark_disposed();
                }
                self.core.dispose()
            }
        }

        impl<T: Texel> std::fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("core", &self.core)
                    .field("len", &self.members.len())
                    .finish()
            }
        }

        impl<T: Texel> std::fmt::Display for $name<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} ({} elements, {} mips)", self.core, self.len(), self.num_mips())
            }
        }
    };
}

texture_array!(
    /// An array of 1D textures in one native resource.
    Texture1DArray of Texture1D
);
texture_array!(
    /// An array of 2D textures in one native resource.
    Texture2DArray of Texture2D
);
