//! Power-of-two rounding for offsets and lengths.
//!
//! An alignment of zero leaves the value alone. Rounding up saturates at the
//! top of the type instead of wrapping.

macro_rules! alignment_helpers {
    ($($ty:ident),*) => {
        paste::paste! {
            $(
                #[inline(always)]
                pub const fn [<align_down_ $ty>](value: $ty, alignment: $ty) -> $ty {
                    match alignment {
                        0 => value,
                        a => value & !(a - 1),
                    }
                }

                #[inline(always)]
                pub const fn [<align_up_ $ty>](value: $ty, alignment: $ty) -> $ty {
                    match alignment {
                        0 => value,
                        a => [<align_down_ $ty>](value.saturating_add(a - 1), a),
                    }
                }
            )*
        }
    };
}

alignment_helpers!(u64, usize);
