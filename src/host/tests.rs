use super::*;
use crate::bridge::IdentitySpace;
use crate::interop::WireArg;
use crate::protocol::CallSelector;
use core::ptr::NonNull;
use std::ffi::CString;
use std::io::{Read, Seek, SeekFrom};
use std::os::fd::AsRawFd;

/// A host `FILE *` backed by a temporary file
struct Capture {
    file: std::fs::File,
    stream: *mut libc::FILE,
}

impl Capture {
    fn new() -> Self {
        let file = tempfile::tempfile().unwrap();
        let stream = unsafe {
            let fd = libc::dup(file.as_raw_fd());
            libc::fdopen(fd, b"w+\0".as_ptr().cast())
        };
        assert!(!stream.is_null());
        Self { file, stream }
    }

    fn addr(&self) -> u64 {
        self.stream as u64
    }

    fn provider(&self) -> Arc<dyn StreamProvider> {
        let stream = NonNull::new(self.stream.cast::<c_void>()).unwrap();
        Arc::new(unsafe { FixedStream::new(stream) })
    }

    fn contents(&mut self) -> String {
        unsafe { libc::fflush(self.stream) };
        self.file.seek(SeekFrom::Start(0)).unwrap();
        let mut out = String::new();
        self.file.read_to_string(&mut out).unwrap();
        out
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        unsafe { libc::fclose(self.stream) };
    }
}

fn dispatcher_with(streams: Arc<dyn StreamProvider>) -> Dispatcher {
    Dispatcher::new(Arc::new(IdentitySpace), streams)
}

fn message(
    selector: CallSelector,
    destination: u64,
    format: &CStr,
    args: Vec<WireArg>,
) -> CallMessage {
    CallMessage {
        selector,
        destination,
        format: format.as_ptr() as u64,
        float_count: args.iter().filter(|a| a.is_floating).count(),
        args,
    }
}

fn wide(text: &str) -> Vec<libc::wchar_t> {
    text.chars()
        .map(|c| c as libc::wchar_t)
        .chain(core::iter::once(0))
        .collect()
}

#[test]
fn test_sprintf_into_buffer() {
    let dispatcher = dispatcher_with(Arc::new(StdStreams::default()));
    let mut buf = [0u8; 64];
    let msg = message(
        CallSelector::Sprintf,
        buf.as_mut_ptr() as u64,
        c"%d and %f\n",
        vec![WireArg::integer(7), WireArg::double(2.5)],
    );

    let written = dispatcher.dispatch(&msg.encode()).unwrap();
    assert_eq!(written, 15);
    assert_eq!(
        CStr::from_bytes_until_nul(&buf).unwrap().to_str().unwrap(),
        "7 and 2.500000\n"
    );

    let stats = dispatcher.stats();
    assert_eq!(stats.calls_made, 1);
    assert_eq!(stats.float_args, 1);
}

#[test]
fn test_fprintf_to_stream() {
    let mut capture = Capture::new();
    let dispatcher = dispatcher_with(Arc::new(StdStreams::default()));
    let name = c"bridge";
    let msg = message(
        CallSelector::Fprintf,
        capture.addr(),
        c"[%s] %5.2f %x %c\n",
        vec![
            WireArg::integer(name.as_ptr() as u64),
            WireArg::double(3.14159),
            WireArg::integer(255),
            WireArg::integer(u64::from(b'z')),
        ],
    );

    let written = dispatcher.invoke(&msg).unwrap();
    let text = capture.contents();
    assert_eq!(text, "[bridge]  3.14 ff z\n");
    assert_eq!(written as usize, text.len());
}

#[test]
fn test_printf_uses_default_stream() {
    let mut capture = Capture::new();
    let dispatcher = dispatcher_with(capture.provider());

    // Printf ignores whatever destination the message carries
    let msg = message(
        CallSelector::Printf,
        0xdead_0000,
        c"%d-%d",
        vec![WireArg::integer(1), WireArg::integer(2)],
    );
    assert_eq!(dispatcher.invoke(&msg).unwrap(), 3);
    assert_eq!(capture.contents(), "1-2");
}

#[test]
fn test_fprintf_null_stream_means_default() {
    let mut capture = Capture::new();
    let dispatcher = dispatcher_with(capture.provider());
    let msg = message(CallSelector::Fprintf, 0, c"%g", vec![WireArg::double(0.25)]);

    assert_eq!(dispatcher.invoke(&msg).unwrap(), 4);
    assert_eq!(capture.contents(), "0.25");
}

#[test]
fn test_wide_printf() {
    let mut capture = Capture::new();
    let dispatcher = dispatcher_with(capture.provider());
    let format = wide("%d/%.1f");
    let msg = CallMessage {
        selector: CallSelector::Wprintf,
        destination: 0,
        format: format.as_ptr() as u64,
        float_count: 1,
        args: vec![WireArg::integer(42), WireArg::double(1.5)],
    };

    assert_eq!(dispatcher.invoke(&msg).unwrap(), 6);
    assert_eq!(capture.contents(), "42/1.5");
}

#[test]
fn test_many_arguments_through_dispatch() {
    let dispatcher = dispatcher_with(Arc::new(StdStreams::default()));
    let mut buf = vec![0u8; 4096];
    let mut format = String::new();
    let mut args = Vec::new();
    let mut expected = String::new();
    for i in 0..40u64 {
        if i % 3 == 0 {
            format.push_str("%.2f ");
            args.push(WireArg::double(i as f64 / 4.0));
            expected.push_str(&format!("{:.2} ", i as f64 / 4.0));
        } else {
            format.push_str("%llu ");
            args.push(WireArg::integer(i * 1000));
            expected.push_str(&format!("{} ", i * 1000));
        }
    }
    let format = CString::new(format).unwrap();
    let msg = message(CallSelector::Sprintf, buf.as_mut_ptr() as u64, &format, args);

    dispatcher.invoke(&msg).unwrap();
    let text = CStr::from_bytes_until_nul(&buf).unwrap();
    assert_eq!(text.to_str().unwrap(), expected);
}

#[test]
fn test_unknown_selector() {
    let dispatcher = dispatcher_with(Arc::new(StdStreams::default()));
    let mut bytes = message(CallSelector::Printf, 0, c"x", vec![]).encode();
    bytes[..8].copy_from_slice(&99u64.to_le_bytes());

    let err = dispatcher.dispatch(&bytes).unwrap_err();
    assert!(err.is_unknown_selector());
    assert_eq!(dispatcher.stats().unknown_selectors, 1);
    assert_eq!(dispatcher.stats().calls_made, 0);

    // Still serves later calls
    let mut buf = [0u8; 8];
    let msg = message(CallSelector::Sprintf, buf.as_mut_ptr() as u64, c"ok", vec![]);
    assert_eq!(dispatcher.dispatch(&msg.encode()).unwrap(), 2);
}

#[test]
fn test_malformed_message_counted() {
    let dispatcher = dispatcher_with(Arc::new(StdStreams::default()));
    let err = dispatcher.dispatch(&[0u8; 12]).unwrap_err();
    assert!(matches!(err, BridgeError::Wire(WireError::Truncated { len: 12 })));
    assert_eq!(dispatcher.stats().failed_calls, 1);
}

#[test]
fn test_null_format() {
    let dispatcher = dispatcher_with(Arc::new(StdStreams::default()));
    let mut buf = [0u8; 8];
    let msg = CallMessage {
        selector: CallSelector::Sprintf,
        destination: buf.as_mut_ptr() as u64,
        format: 0,
        float_count: 0,
        args: vec![],
    };

    let err = dispatcher.invoke(&msg).unwrap_err();
    assert!(matches!(err, BridgeError::NullFormat { selector: "sprintf" }));
    assert_eq!(dispatcher.stats().failed_calls, 1);
}

#[test]
fn test_sprintf_null_buffer() {
    let dispatcher = dispatcher_with(Arc::new(StdStreams::default()));
    let msg = message(CallSelector::Sprintf, 0, c"%d", vec![WireArg::integer(1)]);

    let err = dispatcher.invoke(&msg).unwrap_err();
    assert!(matches!(err, BridgeError::NullDestination { selector: "sprintf" }));
}

#[cfg(target_os = "linux")]
#[test]
fn test_negative_result_passed_through() {
    let mut capture = Capture::new();
    let dispatcher = dispatcher_with(Arc::new(StdStreams::default()));

    // The first narrow write fixes the stream's orientation; glibc then
    // refuses wide output on it and returns -1.
    let narrow = message(CallSelector::Fprintf, capture.addr(), c"n", vec![]);
    assert_eq!(dispatcher.invoke(&narrow).unwrap(), 1);

    let format = wide("w");
    let msg = CallMessage {
        selector: CallSelector::Fwprintf,
        destination: capture.addr(),
        format: format.as_ptr() as u64,
        float_count: 0,
        args: vec![],
    };
    assert_eq!(dispatcher.invoke(&msg).unwrap(), -1);
    assert_eq!(capture.contents(), "n");
    assert_eq!(dispatcher.stats().calls_made, 2);
}

#[test]
fn test_format_preview() {
    let narrow = unsafe { format_preview(CallSelector::Printf, c"%d\n".as_ptr().cast()) };
    assert_eq!(narrow, "%d\n");

    let units = wide("%ls!");
    let wide = unsafe { format_preview(CallSelector::Fwprintf, units.as_ptr().cast()) };
    assert_eq!(wide, "%ls!");
}

#[test]
fn test_std_streams_available() {
    let streams = StdStreams::new(crate::config::DefaultStream::Stderr);
    assert!(streams.default_stream().is_ok());
    assert_eq!(streams.which(), crate::config::DefaultStream::Stderr);
}
