//! Typed indices for steps and jobs.
//!
//! Thin wrappers over an int width sized to the collection they index,
//! with the `usize` conversions `IdVec` wants. Distinct types keep a step
//! index from ever reaching a job table.

macro_rules! typed_id {
    ($name:ident, $ty:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name($ty);

        impl From<usize> for $name {
            fn from(val: usize) -> Self {
                Self(val as $ty)
            }
        }

        impl From<$name> for usize {
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }
    };
}

typed_id!(StepId, u16);
typed_id!(JobId, u32);
