use num::{Float, NumCast, Zero};
use rand::distributions::uniform::SampleUniform;
use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{Add, AddAssign, Sub, SubAssign},
};

/// Floating-point primitive the engine can calculate with.
///
/// The storage width is selected once, at construction of the [`crate::KMeans`]
/// entry struct. All per-point arithmetic in the hot loop is monomorphized over
/// this type, so there is no dispatch cost for choosing `f32` over `f64`.
pub trait Primitive:
    Add + AddAssign + Sum + Sub + SubAssign + Zero + Float + NumCast + SampleUniform
    + PartialOrd + Copy + Default + Display + Debug + Sync + Send + 'static
    + for<'a> AddAssign<&'a Self>
{
}
impl Primitive for f32 {}
impl Primitive for f64 {}
