//! ABI (Application Binary Interface) handling for variadic calls
//!
//! Variadic arguments are laid out in one of two ways:
//! - split classes: integers and doubles fill separate register files, each
//!   class spilling to the stack in call order once its file is full
//!   (System V x86-64, AAPCS64)
//! - positional: every argument takes the next 8-byte slot regardless of
//!   class (Win64, Apple arm64)

use super::types::WireArg;
use smallvec::SmallVec;

/// Fixed pointer parameters ahead of the variadic part (stream/buffer, format)
pub const FIXED_PARAMS: usize = 2;

/// Largest variadic integer register file among supported conventions
pub const MAX_INT_REGS: usize = 6;

/// Largest variadic floating register file among supported conventions
pub const MAX_FP_REGS: usize = 8;

/// Calling convention specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CallingConvention {
    /// System V AMD64 ABI (Unix x86-64)
    SysV,
    /// Microsoft x64 calling convention (Windows)
    Win64,
    /// ARM64 procedure call standard (Linux, BSD)
    Aarch64,
    /// Apple arm64, variadic arguments always on the stack
    AppleArm64,
}

/// How a convention places variadic arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariadicLayout {
    SplitClasses { int_regs: usize, fp_regs: usize },
    Positional,
}

impl CallingConvention {
    /// Convention of the compilation target, if supported
    #[inline]
    pub const fn native() -> Option<Self> {
        #[cfg(all(target_arch = "x86_64", target_os = "windows"))]
        return Some(Self::Win64);

        #[cfg(all(target_arch = "x86_64", not(target_os = "windows")))]
        return Some(Self::SysV);

        #[cfg(all(target_arch = "aarch64", target_vendor = "apple"))]
        return Some(Self::AppleArm64);

        #[cfg(all(target_arch = "aarch64", not(target_vendor = "apple")))]
        return Some(Self::Aarch64);

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        return None;
    }

    /// Maximum integer register arguments, fixed parameters included
    #[inline]
    pub const fn max_register_args(self) -> usize {
        match self {
            Self::SysV => 6,    // RDI, RSI, RDX, RCX, R8, R9
            Self::Win64 => 4,   // RCX, RDX, R8, R9
            Self::Aarch64 => 8, // X0-X7
            Self::AppleArm64 => 8,
        }
    }

    /// Maximum floating register arguments
    #[inline]
    pub const fn max_fp_register_args(self) -> usize {
        match self {
            Self::SysV => 8,    // XMM0-XMM7
            Self::Win64 => 4,   // shadowed by the integer slots
            Self::Aarch64 => 8, // V0-V7
            Self::AppleArm64 => 8,
        }
    }

    /// Check if floating-point args use separate registers
    #[inline]
    pub const fn has_fp_registers(self) -> bool {
        matches!(self.variadic_layout(), VariadicLayout::SplitClasses { .. })
    }

    /// Placement rule for the variadic part of a call
    #[inline]
    pub const fn variadic_layout(self) -> VariadicLayout {
        match self {
            Self::SysV | Self::Aarch64 => VariadicLayout::SplitClasses {
                int_regs: self.max_register_args() - FIXED_PARAMS,
                fp_regs: self.max_fp_register_args(),
            },
            Self::Win64 | Self::AppleArm64 => VariadicLayout::Positional,
        }
    }
}

/// Register allocation state for one variadic call
///
/// Tracks the next free integer and floating register independently; the
/// fixed parameters are already accounted for.
#[derive(Debug, Clone)]
pub struct RegisterAllocator {
    convention: CallingConvention,
    int_regs_used: usize,
    fp_regs_used: usize,
}

impl RegisterAllocator {
    /// Create allocator for calling convention
    #[inline]
    pub const fn new(convention: CallingConvention) -> Self {
        Self {
            convention,
            int_regs_used: 0,
            fp_regs_used: 0,
        }
    }

    /// Check if next arg goes in register
    #[inline]
    pub fn can_use_register(&self, is_float: bool) -> bool {
        match self.convention.variadic_layout() {
            VariadicLayout::SplitClasses { int_regs, fp_regs } => {
                if is_float {
                    self.fp_regs_used < fp_regs
                } else {
                    self.int_regs_used < int_regs
                }
            }
            VariadicLayout::Positional => false,
        }
    }

    /// Mark register as used
    #[inline]
    pub fn use_register(&mut self, is_float: bool) {
        if is_float {
            self.fp_regs_used += 1;
        } else {
            self.int_regs_used += 1;
        }
    }

    /// Reset for new call
    #[inline]
    pub fn reset(&mut self) {
        self.int_regs_used = 0;
        self.fp_regs_used = 0;
    }

    /// Assign every argument to a register or stack slot, in call order
    pub fn plan(&mut self, args: &[WireArg]) -> SlotPlan {
        self.reset();
        let mut plan = SlotPlan::default();

        for arg in args {
            if self.can_use_register(arg.is_floating) {
                if arg.is_floating {
                    plan.fp[self.fp_regs_used] = arg.as_f64();
                } else {
                    plan.int[self.int_regs_used] = arg.payload;
                }
                self.use_register(arg.is_floating);
            } else {
                // Stack slots are 8 bytes for both classes; a double's bit
                // pattern occupies its slot exactly.
                plan.stack.push(arg.payload);
            }
        }

        plan.int_used = self.int_regs_used;
        plan.fp_used = self.fp_regs_used;
        plan
    }
}

/// Physical placement of one call's variadic arguments
///
/// Unused register entries stay zero; the callee never reads past the
/// arguments its format string names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotPlan {
    pub int: [u64; MAX_INT_REGS],
    pub fp: [f64; MAX_FP_REGS],
    pub stack: SmallVec<[u64; 16]>,
    pub int_used: usize,
    pub fp_used: usize,
}
