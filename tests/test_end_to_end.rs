//! Guest call → wire → host replay, against the real C runtime

#![cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]

mod common;

use common::{buffer_text, wide, Capture};
use std::ffi::{c_char, CString};
use std::sync::Arc;
use vabridge::{
    local, scan, vargs, Arg, ArgClass, BridgeConfig, CallSelector, Dispatcher, Guest, IdentitySpace,
    LocalBridge, OffsetSpace, SerializedBridge, SlotReader, MAX_ARGS,
};

fn capture_guest(capture: &Capture) -> Guest<LocalBridge> {
    let dispatcher = Dispatcher::new(Arc::new(IdentitySpace), capture.provider());
    Guest::new(LocalBridge::new(dispatcher))
}

#[test]
fn test_int_and_float_scenario() {
    let format = c"%d and %f\n";
    let classes = scan(format.to_bytes()).unwrap();
    assert_eq!(classes.as_slice(), &[ArgClass::Integer, ArgClass::Floating]);

    let guest = local(&BridgeConfig::default()).unwrap();
    let mut buf = [0u8; 64];
    let written = unsafe { guest.sprintf(buf.as_mut_ptr().cast(), format, vargs![7, 2.5]) }.unwrap();

    assert_eq!(buffer_text(&buf), "7 and 2.500000\n");
    assert_eq!(written, 15);

    let stats = guest.transport().dispatcher().stats();
    assert_eq!(stats.calls_made, 1);
    assert_eq!(stats.float_args, 1);
}

#[test]
fn test_percent_escape_only() {
    let guest = local(&BridgeConfig::default()).unwrap();
    let mut buf = [0u8; 32];
    let written = unsafe { guest.sprintf(buf.as_mut_ptr().cast(), c"100%% done", vargs![]) }.unwrap();
    assert_eq!(buffer_text(&buf), "100% done");
    assert_eq!(written, 9);
}

#[test]
fn test_printf_goes_to_default_stream() {
    let mut capture = Capture::new();
    let guest = capture_guest(&capture);

    let name = CString::new("world").unwrap();
    let written = unsafe { guest.printf(c"hello %s #%u\n", vargs![name.as_c_str(), 3u32]) }.unwrap();

    assert_eq!(capture.contents(), "hello world #3\n");
    assert_eq!(written, 15);
}

#[test]
fn test_fprintf_explicit_stream() {
    let mut capture = Capture::new();
    let guest = local(&BridgeConfig::default()).unwrap();

    unsafe {
        guest
            .fprintf(capture.stream(), c"%c%c|%-4d|%+.3f\n", vargs!['o', 'k', 12, -0.125f32])
            .unwrap();
        guest
            .fprintf(capture.stream(), c"%#o %#x %p\n", vargs![8, 255, std::ptr::null::<u8>()])
            .unwrap();
    }

    let text = capture.contents();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("ok|12  |-0.125"));
    assert!(lines.next().unwrap().starts_with("010 0xff "));
}

#[test]
fn test_wide_calls() {
    let mut capture = Capture::new();
    let guest = capture_guest(&capture);

    let format = wide("%d:%.2f|");
    unsafe {
        assert_eq!(guest.wprintf(&format, vargs![5, 0.5]).unwrap(), 7);
        assert_eq!(
            guest
                .fwprintf(capture.stream(), &format, vargs![-1, 10.0])
                .unwrap(),
            9
        );
    }
    assert_eq!(capture.contents(), "5:0.50|-1:10.00|");
}

#[test]
fn test_vsprintf_from_guest_slots() {
    let guest = local(&BridgeConfig::default()).unwrap();
    let mut block = Vec::new();
    for word in [40u64, 2.0f64.to_bits(), u64::from(b'!')] {
        block.extend_from_slice(&word.to_le_bytes());
    }

    let mut buf = [0u8; 32];
    let mut slots = SlotReader::new(&block);
    unsafe { guest.vsprintf(buf.as_mut_ptr().cast(), c"%lu+%g%c", &mut slots) }.unwrap();
    assert_eq!(buffer_text(&buf), "40+2!");
}

#[test]
fn test_offset_address_space() {
    // One block stands in for guest memory; the guest sees offsets into it
    let mut memory = vec![0u8; 512];
    memory[0x20..0x20 + 9].copy_from_slice(b"[%s|%d]\0\0");
    memory[0x40..0x40 + 4].copy_from_slice(b"abc\0");
    let base = memory.as_mut_ptr();

    let space = Arc::new(OffsetSpace::new(base));
    let guest = Guest::new(LocalBridge::from_config(&BridgeConfig::default(), space));

    let written = unsafe {
        let format = std::ffi::CStr::from_ptr(base.add(0x20).cast::<c_char>());
        let buffer = base.add(0x100).cast::<c_char>();
        // %s payloads are not translated, so pass the host pointer
        guest.sprintf(buffer, format, vargs![base.add(0x40) as *const u8, 9])
    }
    .unwrap();

    assert_eq!(written, 7);
    assert_eq!(buffer_text(&memory[0x100..]), "[abc|9]");
}

#[test]
fn test_serialized_transport() {
    let guest = Guest::new(SerializedBridge::new(LocalBridge::identity()));
    let mut buf = [0u8; 32];
    unsafe { guest.sprintf(buf.as_mut_ptr().cast(), c"%05.1f", vargs![3.14159]) }.unwrap();
    assert_eq!(buffer_text(&buf), "003.1");
    assert_eq!(guest.transport().inner().dispatcher().stats().calls_made, 1);
}

#[test]
fn test_argument_limit_round_trip() {
    let guest = local(&BridgeConfig::default()).unwrap();
    let format = CString::new("%d ".repeat(MAX_ARGS)).unwrap();
    let args: Vec<i32> = (0..MAX_ARGS as i32).collect();
    let expected: String = args.iter().map(|i| format!("{i} ")).collect();

    let mut buf = vec![0u8; 4096];
    let written = unsafe {
        guest.sprintf(
            buf.as_mut_ptr().cast(),
            &format,
            args.iter().copied().map(Arg::from).collect(),
        )
    }
    .unwrap();

    assert_eq!(buffer_text(&buf), expected);
    assert_eq!(written as usize, expected.len());
}

#[test]
fn test_unknown_selector_is_an_error() {
    use vabridge::Transport;

    let bridge = LocalBridge::identity();
    let mut bytes = vabridge::CallMessage {
        selector: CallSelector::Printf,
        destination: 0,
        format: 0,
        float_count: 0,
        args: vec![],
    }
    .encode();
    bytes[..8].copy_from_slice(&7u64.to_le_bytes());

    let err = bridge.invoke(&bytes).unwrap_err();
    assert!(err.is_unknown_selector());
    assert_eq!(bridge.dispatcher().stats().unknown_selectors, 1);
}
