//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Decoded samples are cast into `Self`; change arithmetic always promotes
/// to `f64` through [`RasterElement::to_f64`] before subtracting, so integer
/// source types never wrap or lose sign.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Value stored when a decoded sample cannot be represented in `Self`
    fn fill_value() -> Self;

    /// Convert self to f64
    fn to_f64(self) -> f64 {
        NumCast::from(self).unwrap_or(f64::NAN)
    }

    /// Cast any numeric sample into `Self`, using the fill value on overflow
    fn from_sample<S: NumCast>(sample: S) -> Self {
        num_traits::cast(sample).unwrap_or_else(Self::fill_value)
    }
}

macro_rules! impl_raster_element_int {
    ($t:ty) => {
        impl RasterElement for $t {
            fn fill_value() -> Self {
                <$t>::MIN
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn fill_value() -> Self {
                <$t>::NAN
            }
        }
    };
}

impl_raster_element_int!(i8);
impl_raster_element_int!(i16);
impl_raster_element_int!(i32);
impl_raster_element_int!(i64);
impl_raster_element_int!(u8);
impl_raster_element_int!(u16);
impl_raster_element_int!(u32);
impl_raster_element_int!(u64);
impl_raster_element_float!(f32);
impl_raster_element_float!(f64);
