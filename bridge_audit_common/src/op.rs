/// Implements a std::ops trait for a single-field newtype by delegating to the wrapped value.
#[macro_export]
macro_rules! op {
    (binary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl std::ops::$impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self, rhs: Self) -> Self::Output {
                Self(std::ops::$impl_trait::$impl_fn(self.0, rhs.0))
            }
        }

        impl<'a> std::ops::$impl_trait<&'a $for_struct> for &'a $for_struct {
            type Output = $for_struct;

            fn $impl_fn(self, rhs: &'a $for_struct) -> Self::Output {
                $for_struct(std::ops::$impl_trait::$impl_fn(&self.0, &rhs.0))
            }
        }
    };

    (inplace $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl std::ops::$impl_trait for $for_struct {
            fn $impl_fn(&mut self, rhs: Self) {
                std::ops::$impl_trait::$impl_fn(&mut self.0, rhs.0)
            }
        }

        impl<'a> std::ops::$impl_trait<&'a $for_struct> for $for_struct {
            fn $impl_fn(&mut self, rhs: &'a $for_struct) {
                std::ops::$impl_trait::$impl_fn(&mut self.0, &rhs.0)
            }
        }
    };
}
