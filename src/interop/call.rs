//! Variadic call replay
//!
//! A native variadic call cannot be assembled from a runtime array in
//! portable Rust. Instead the build script emits a closed family of call
//! shapes for the target ABI: register files always passed in full, plus a
//! stack tail padded to a fixed depth bucket. The replay plans where each
//! wire argument lands and picks the shape by table lookup.

use super::abi::{CallingConvention, RegisterAllocator, SlotPlan};
use super::types::WireArg;
use crate::format::MAX_ARGS;
use core::ffi::{c_int, c_void};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::trace;

/// Printf-family entry point: two fixed pointers, then the variadic part
pub type VariadicTarget = unsafe extern "C" fn(*mut c_void, *const c_void, ...) -> c_int;

type CallShape = unsafe fn(
    VariadicTarget,
    *mut c_void,
    *const c_void,
    &SlotPlan,
    &[u64],
) -> Result<c_int, CallError>;

mod shapes {
    use super::{CallError, CallShape, CallingConvention, SlotPlan, VariadicTarget};
    use core::ffi::{c_int, c_void};

    include!(concat!(env!("OUT_DIR"), "/call_shapes.rs"));
}

/// Variadic replay errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("expected {expected} floating arguments, got {got}")]
    ArgCountMismatch { expected: usize, got: usize },

    #[error("{count} arguments exceed the limit of {}", MAX_ARGS)]
    TooManyArgs { count: usize },

    #[error("no call shape holds {depth} stack slots")]
    StackTooDeep { depth: usize },

    #[error("call shape expects {expected} stack slots, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("{0:?} calls cannot be replayed on this target")]
    UnsupportedConvention(CallingConvention),

    #[error("architecture not supported")]
    UnsupportedArchitecture,
}

/// Shape covering `depth` stack slots: its padded depth and entry point
fn select_shape(depth: usize) -> Option<(usize, CallShape)> {
    shapes::CALL_SHAPES
        .iter()
        .copied()
        .find(|&(bucket, _)| bucket >= depth)
}

/// Largest stack tail any generated shape can carry
pub fn max_stack_depth() -> usize {
    shapes::CALL_SHAPES.last().map_or(0, |&(bucket, _)| bucket)
}

/// Replayable variadic function
#[derive(Clone, Copy)]
pub struct VariadicCall {
    target: VariadicTarget,
    convention: CallingConvention,
}

impl VariadicCall {
    /// Wrap a target using the native convention
    pub fn new(target: VariadicTarget) -> Result<Self, CallError> {
        let convention = shapes::SHAPE_CONVENTION.ok_or(CallError::UnsupportedArchitecture)?;
        Ok(Self { target, convention })
    }

    #[inline]
    pub fn convention(&self) -> CallingConvention {
        self.convention
    }

    /// Replay `args` after the two fixed pointers
    ///
    /// # Safety
    /// Caller must ensure:
    /// - `target` is a valid variadic function with the declared prototype
    /// - `dst` and `fmt` are what the target expects
    /// - every integer payload the format dereferences is a valid pointer
    pub unsafe fn call(
        &self,
        dst: *mut c_void,
        fmt: *const c_void,
        args: &[WireArg],
        float_count: usize,
    ) -> Result<c_int, CallError> {
        if args.len() > MAX_ARGS {
            return Err(CallError::TooManyArgs { count: args.len() });
        }
        let floats = args.iter().filter(|a| a.is_floating).count();
        if floats != float_count {
            return Err(CallError::ArgCountMismatch {
                expected: float_count,
                got: floats,
            });
        }

        let plan = RegisterAllocator::new(self.convention).plan(args);
        let depth = plan.stack.len();
        let (bucket, shape) = select_shape(depth).ok_or(CallError::StackTooDeep { depth })?;

        let mut stack: SmallVec<[u64; 16]> = plan.stack.clone();
        stack.resize(bucket, 0);

        trace!(
            ints = plan.int_used,
            floats = plan.fp_used,
            stack = depth,
            bucket,
            "replaying variadic call"
        );

        shape(self.target, dst, fmt, &plan, &stack)
    }
}

impl core::fmt::Debug for VariadicCall {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VariadicCall")
            .field("target", &(self.target as *const ()))
            .field("convention", &self.convention)
            .finish()
    }
}

/// High-level API: replay a wire argument array onto `target`
///
/// # Safety
/// See [`VariadicCall::call`] safety requirements
#[inline]
pub unsafe fn call_va(
    target: VariadicTarget,
    dst: *mut c_void,
    fmt: *const c_void,
    args: &[WireArg],
    float_count: usize,
) -> Result<c_int, CallError> {
    VariadicCall::new(target)?.call(dst, fmt, args, float_count)
}
