use std::fmt::{Debug, Display};
use std::ops::{Add, Mul, Sub};

/// The floating-point type distances are computed in.
///
/// `f32` reproduces the single-precision reference numerics; `f64` trades
/// twice the memory for much smaller error near antipodes and at short range.
pub trait Real:
    Copy
    + Send
    + Sync
    + PartialOrd
    + Debug
    + Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + 'static
{
    const ZERO: Self;

    fn from_f64(x: f64) -> Self;
    fn to_f64(self) -> f64;
    fn to_radians(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn sqrt(self) -> Self;
    fn abs(self) -> Self;
    fn atan2(self, other: Self) -> Self;
}

macro_rules! impl_real {
    ($t:ty) => {
        impl Real for $t {
            const ZERO: Self = 0.0;

            #[inline]
            fn from_f64(x: f64) -> Self {
                x as $t
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn to_radians(self) -> Self {
                <$t>::to_radians(self)
            }

            #[inline]
            fn sin(self) -> Self {
                <$t>::sin(self)
            }

            #[inline]
            fn cos(self) -> Self {
                <$t>::cos(self)
            }

            #[inline]
            fn sqrt(self) -> Self {
                <$t>::sqrt(self)
            }

            #[inline]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }

            #[inline]
            fn atan2(self, other: Self) -> Self {
                <$t>::atan2(self, other)
            }
        }
    };
}

impl_real!(f32);
impl_real!(f64);

#[cfg(test)]
mod tests {
    use super::Real;

    #[test]
    fn single_precision_rounds_on_entry() {
        let x = <f32 as Real>::from_f64(1.01);
        assert_eq!(x, 1.01_f32);
        assert_ne!(x.to_f64(), 1.01_f64);
    }

    #[test]
    fn radians_follow_the_working_precision() {
        let half_turn = <f32 as Real>::from_f64(180.0);
        assert!((Real::to_radians(half_turn) - std::f32::consts::PI).abs() < 1e-6);
        assert!((Real::to_radians(180.0_f64) - std::f64::consts::PI).abs() < 1e-15);
    }
}
