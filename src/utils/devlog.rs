//! Developer trace lines with a thread-local sink so tests can assert on them
//! without racing the global logger.

use std::cell::RefCell;

thread_local! {
    static TL_SINK: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Guard that disables the thread-local sink on drop.
pub struct DevSinkGuard;
impl Drop for DevSinkGuard {
    fn drop(&mut self) {
        TL_SINK.with(|s| *s.borrow_mut() = None);
    }
}

/// Enable capture for the current thread until the returned guard is dropped.
#[must_use]
pub fn enable_thread_sink() -> DevSinkGuard {
    TL_SINK.with(|s| *s.borrow_mut() = Some(Vec::new()));
    DevSinkGuard
}

pub fn write_str(msg: &str) {
    TL_SINK.with(|s| {
        if let Some(buf) = s.borrow_mut().as_mut() {
            buf.push(msg.to_owned());
        }
    });
}

/// Drain the captured lines for the current thread. Empty when capture is off.
pub fn drain() -> Vec<String> {
    TL_SINK.with(|s| s.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
}

/// Emit a developer trace line (target `devcamper::dev`) and capture it when enabled.
#[macro_export]
macro_rules! devlog {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        $crate::utils::devlog::write_str(&__s);
        log::log!(target: "devcamper::dev", log::Level::Trace, "{}", __s);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_captures_and_drains() {
        let _g = enable_thread_sink();
        crate::devlog!("count {}", 3);
        crate::devlog!("find");
        let lines = drain();
        assert_eq!(lines, vec!["count 3".to_string(), "find".to_string()]);
        assert!(drain().is_empty());
    }

    #[test]
    fn other_threads_are_not_captured() {
        let _g = enable_thread_sink();
        crate::devlog!("main-thread");
        let child = std::thread::spawn(|| {
            crate::devlog!("child-thread");
            drain()
        })
        .join()
        .unwrap();
        assert!(child.is_empty());
        assert_eq!(drain(), vec!["main-thread".to_string()]);
    }
}
