//! Leveled assertions for the kernel.
//!
//! Simple assertions are always checked. The more expensive levels are only enabled when the
//! `debug-checks` feature is active, since some of them re-derive state that the engine maintains
//! incrementally (e.g. recounting the cardinality of a bitset after every bound update).

#[cfg(not(feature = "debug-checks"))]
pub const FIXPOINT_ASSERT_LEVEL_DEFINITION: u8 = FIXPOINT_ASSERT_SIMPLE;

#[cfg(feature = "debug-checks")]
pub const FIXPOINT_ASSERT_LEVEL_DEFINITION: u8 = FIXPOINT_ASSERT_EXTREME;

pub const FIXPOINT_ASSERT_SIMPLE: u8 = 1;
pub const FIXPOINT_ASSERT_MODERATE: u8 = 2;
pub const FIXPOINT_ASSERT_ADVANCED: u8 = 3;
pub const FIXPOINT_ASSERT_EXTREME: u8 = 4;

#[macro_export]
#[doc(hidden)]
macro_rules! fixpoint_assert_simple {
    ($($arg:tt)*) => {
        if $crate::fixpoint_asserts::FIXPOINT_ASSERT_LEVEL_DEFINITION
            >= $crate::fixpoint_asserts::FIXPOINT_ASSERT_SIMPLE
        {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! fixpoint_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::fixpoint_asserts::FIXPOINT_ASSERT_LEVEL_DEFINITION
            >= $crate::fixpoint_asserts::FIXPOINT_ASSERT_MODERATE
        {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! fixpoint_assert_advanced {
    ($($arg:tt)*) => {
        if $crate::fixpoint_asserts::FIXPOINT_ASSERT_LEVEL_DEFINITION
            >= $crate::fixpoint_asserts::FIXPOINT_ASSERT_ADVANCED
        {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! fixpoint_assert_extreme {
    ($($arg:tt)*) => {
        if $crate::fixpoint_asserts::FIXPOINT_ASSERT_LEVEL_DEFINITION
            >= $crate::fixpoint_asserts::FIXPOINT_ASSERT_EXTREME
        {
            assert!($($arg)*);
        }
    };
}
