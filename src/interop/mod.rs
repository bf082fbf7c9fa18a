//! Interoperability - move variadic calls across the guest/host boundary
//!
//! Design: every argument is normalized to a tagged 64-bit slot on the guest
//! side and replayed as a genuine variadic call on the host side.
//!
//! Architecture:
//! - `types.rs` - wire argument and caller argument representations
//! - `marshal.rs` - argument sources and message packing
//! - `abi.rs` - calling convention and register/stack placement
//! - `call.rs` - variadic replay through generated call shapes

mod abi;
mod call;
mod marshal;
mod types;

pub use abi::{
    CallingConvention, RegisterAllocator, SlotPlan, VariadicLayout, FIXED_PARAMS, MAX_FP_REGS,
    MAX_INT_REGS,
};
pub use call::{call_va, max_stack_depth, CallError, VariadicCall, VariadicTarget};
pub use marshal::{marshal, marshal_arg, ArgSource, SlotReader, VarArgs};
pub use types::{Arg, WireArg};
