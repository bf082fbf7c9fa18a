use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

/// Stack-depth buckets; a call is padded up to the next bucket
const STACK_BUCKETS: [usize; 8] = [0, 4, 8, 16, 32, 64, 128, 256];

/// Floating registers in the split-class conventions
const FP_REGS: usize = 8;

enum Layout {
    Split { int_regs: usize, convention: &'static str },
    Positional { convention: &'static str },
    Unsupported,
}

fn native_layout() -> Layout {
    let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let vendor = env::var("CARGO_CFG_TARGET_VENDOR").unwrap_or_default();

    match (arch.as_str(), os.as_str(), vendor.as_str()) {
        ("x86_64", "windows", _) => Layout::Positional { convention: "Win64" },
        ("x86_64", _, _) => Layout::Split { int_regs: 4, convention: "SysV" },
        ("aarch64", _, "apple") => Layout::Positional { convention: "AppleArm64" },
        ("aarch64", _, _) => Layout::Split { int_regs: 6, convention: "Aarch64" },
        _ => Layout::Unsupported,
    }
}

fn list(prefix: &str, count: usize) -> String {
    (0..count).map(|i| format!("{prefix}[{i}], ")).collect()
}

fn shape_fn(out: &mut String, depth: usize, registers: &str) {
    let name = format!("shape_s{depth}");
    let stack = list("s", depth);
    let _ = writeln!(
        out,
        "unsafe fn {name}(target: VariadicTarget, dst: *mut c_void, fmt: *const c_void, \
         plan: &SlotPlan, stack: &[u64]) -> Result<c_int, CallError> {{"
    );
    let _ = writeln!(out, "    let _ = plan;");
    let _ = writeln!(
        out,
        "    let s: &[u64; {depth}] = stack.try_into().map_err(|_| CallError::ShapeMismatch {{ expected: {depth}, got: stack.len() }})?;"
    );
    let _ = writeln!(out, "    let _ = s;");
    let _ = writeln!(out, "    Ok(target(dst, fmt, {registers}{stack}))");
    let _ = writeln!(out, "}}\n");
}

fn generate() -> String {
    let mut out = String::from("// Generated by build.rs: variadic call shapes for the target ABI.\n\n");

    let (convention, registers) = match native_layout() {
        Layout::Split { int_regs, convention } => {
            let registers = format!(
                "{}{}",
                list("plan.int", int_regs),
                list("plan.fp", FP_REGS)
            );
            (Some(convention), registers)
        }
        Layout::Positional { convention } => (Some(convention), String::new()),
        Layout::Unsupported => (None, String::new()),
    };

    match convention {
        Some(name) => {
            let _ = writeln!(
                out,
                "pub(crate) const SHAPE_CONVENTION: Option<CallingConvention> = Some(CallingConvention::{name});\n"
            );
            for depth in STACK_BUCKETS {
                shape_fn(&mut out, depth, &registers);
            }
            let entries: String = STACK_BUCKETS
                .iter()
                .map(|d| format!("({d}, shape_s{d} as CallShape), "))
                .collect();
            let _ = writeln!(
                out,
                "pub(crate) static CALL_SHAPES: &[(usize, CallShape)] = &[{entries}];"
            );
        }
        None => {
            out.push_str("pub(crate) const SHAPE_CONVENTION: Option<CallingConvention> = None;\n");
            out.push_str("pub(crate) static CALL_SHAPES: &[(usize, CallShape)] = &[];\n");
        }
    }

    out
}

fn main() {
    let Some(out_dir) = env::var_os("OUT_DIR") else {
        panic!("OUT_DIR not set by cargo");
    };
    let path = PathBuf::from(out_dir).join("call_shapes.rs");

    if let Err(err) = fs::write(&path, generate()) {
        panic!("failed to write {}: {err}", path.display());
    }

    println!("cargo:rerun-if-changed=build.rs");
}
