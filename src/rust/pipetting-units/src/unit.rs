// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

pub(crate) fn round_to_significant_digits(x: f64, n: u32) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        let order = x.abs().log10().floor();
        let scale = 10f64.powf((n as f64) - 1.0 - order);
        (x * scale).round() / scale
    }
}

/// Defines a quantity type `$ident<U, T = f64>` tagged with a unit `U`.
///
/// Quantities with different units are different types, so a volume can never
/// be passed where a delay is expected. Arithmetic is only defined between
/// quantities of the same unit, and with scalars of the underlying type.
macro_rules! quantity {
    ($ident:ident) => {
        /// A quantity represented with unit type.
        ///
        /// # Type Parameter
        /// - `T`: The underlying value (typically a floating point number)
        /// - `U`: The unit of the value. Typically, it is a zero-sized type.
        #[derive(Clone, Copy, Default, Debug)]
        pub struct $ident<U, T = f64> {
            pub(crate) value: T,
            pub(crate) unit: U,
        }

        impl<U, T> $ident<U, T> {
            pub fn value(self) -> T {
                self.value
            }

            /// The dimensionless ratio `self / other`.
            pub fn ratio(self, other: Self) -> T
            where
                T: std::ops::Div<Output = T>,
            {
                self.value / other.value
            }
        }

        impl<U, T: num_traits::Zero + PartialEq> PartialEq for $ident<U, T> {
            fn eq(&self, other: &Self) -> bool {
                let a = &self.value;
                let b = &other.value;
                if a.is_zero() && b.is_zero() {
                    true
                } else {
                    a == b
                }
            }
        }

        impl<U, T: num_traits::Zero + PartialOrd> PartialOrd for $ident<U, T> {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                if self == other {
                    Some(std::cmp::Ordering::Equal)
                } else {
                    self.value.partial_cmp(&other.value)
                }
            }
        }

        impl<U, T> std::ops::Add for $ident<U, T>
        where
            T: std::ops::Add<Output = T> + Copy,
            U: Copy,
        {
            type Output = Self;

            fn add(self, rhs: Self) -> Self::Output {
                $ident {
                    value: self.value + rhs.value,
                    unit: self.unit,
                }
            }
        }

        impl<U, T> std::ops::AddAssign for $ident<U, T>
        where
            T: std::ops::AddAssign + Copy,
        {
            fn add_assign(&mut self, rhs: Self) {
                self.value += rhs.value;
            }
        }

        impl<U, T> std::ops::Sub for $ident<U, T>
        where
            T: std::ops::Sub<Output = T> + Copy,
            U: Copy,
        {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self::Output {
                $ident {
                    value: self.value - rhs.value,
                    unit: self.unit,
                }
            }
        }

        impl<U, T> std::ops::SubAssign for $ident<U, T>
        where
            T: std::ops::SubAssign + Copy,
        {
            fn sub_assign(&mut self, rhs: Self) {
                self.value -= rhs.value;
            }
        }

        impl<U, T> std::ops::Mul<T> for $ident<U, T>
        where
            T: std::ops::Mul<T, Output = T> + Copy,
            U: Copy,
        {
            type Output = Self;

            fn mul(self, rhs: T) -> Self::Output {
                $ident {
                    value: self.value * rhs,
                    unit: self.unit,
                }
            }
        }

        impl<U, T> std::ops::Div<T> for $ident<U, T>
        where
            T: std::ops::Div<T, Output = T> + Copy,
            U: Copy,
        {
            type Output = Self;

            fn div(self, rhs: T) -> Self::Output {
                $ident {
                    value: self.value / rhs,
                    unit: self.unit,
                }
            }
        }

        impl<U, T> std::ops::Neg for $ident<U, T>
        where
            T: std::ops::Neg<Output = T> + Copy,
            U: Copy,
        {
            type Output = Self;

            fn neg(self) -> Self::Output {
                $ident {
                    value: -self.value,
                    unit: self.unit,
                }
            }
        }

        impl<U, T> std::iter::Sum for $ident<U, T>
        where
            T: num_traits::Zero + Copy,
            U: Copy + Default,
        {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(<Self as num_traits::Zero>::zero(), |acc, x| acc + x)
            }
        }

        impl<U, T> std::fmt::Display for $ident<U, T>
        where
            T: std::fmt::Display + std::fmt::Debug + num_traits::AsPrimitive<f64> + num_traits::Float,
            U: std::fmt::Display,
        {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                if f.alternate() {
                    std::fmt::Display::fmt(&self.value, f)?;
                } else {
                    // Round to a number of significand digits slightly below that of epsilon,
                    // so that accumulated rounding errors do not show up in the output.
                    let significand_digits = (-T::epsilon().log10() - T::one()).as_() as u32;
                    let value = $crate::unit::round_to_significant_digits(
                        self.value.as_(),
                        significand_digits,
                    );
                    std::fmt::Debug::fmt(&value, f)?;
                }
                write!(f, " ")?;
                self.unit.fmt(f)
            }
        }

        impl<U, T> From<T> for $ident<U, T>
        where
            T: num_traits::Num,
            U: Default,
        {
            fn from(value: T) -> Self {
                $ident {
                    value,
                    unit: U::default(),
                }
            }
        }

        impl<U> From<$ident<U, f64>> for f64 {
            fn from(value: $ident<U, f64>) -> Self {
                value.value
            }
        }

        impl<U, T> num_traits::Zero for $ident<U, T>
        where
            T: num_traits::Zero + Copy,
            U: Copy + Default,
        {
            fn zero() -> Self {
                Self {
                    value: T::zero(),
                    unit: U::default(),
                }
            }

            fn is_zero(&self) -> bool {
                self.value.is_zero()
            }
        }

        // Quantities are written as bare numbers; the unit is implied by the type.
        impl<U, T: serde::Serialize> serde::Serialize for $ident<U, T> {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.value.serialize(serializer)
            }
        }

        impl<'de, U: Default, T: serde::Deserialize<'de>> serde::Deserialize<'de>
            for $ident<U, T>
        {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                T::deserialize(deserializer).map(|value| $ident {
                    value,
                    unit: U::default(),
                })
            }
        }
    };
}

pub(crate) use quantity;
