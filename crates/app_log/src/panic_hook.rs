//! Panic hook for crash reporting

use backtrace::Backtrace;
use chrono::Local;
#[allow(deprecated)]
use std::panic::PanicInfo;

/// Initialize the panic hook for crash reporting
pub fn init_panic_hook() {
    std::panic::set_hook(Box::new(panic_handler));
    tracing::debug!("Panic hook initialized");
}

#[allow(deprecated)] // PanicHookInfo needs Rust 1.81
fn panic_handler(info: &PanicInfo) {
    let backtrace = Backtrace::new();
    let thread = std::thread::current();
    let thread_name = thread.name().unwrap_or("<unnamed>");
    let report = crash_report(
        &Local::now().to_rfc3339(),
        thread_name,
        &format!("{:?}", info.location()),
        payload_message(info.payload()),
        &format!("{:?}", backtrace),
    );

    // 1. Log to stderr (always available)
    eprintln!("{}", report);

    // 2. Log via tracing
    tracing::error!("{}", report);

    // 3. Write crash dump file
    let dump_filename = format!(
        "imagesack_crash_{}.txt",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let dump_path = std::env::temp_dir().join(&dump_filename);

    if let Err(e) = std::fs::write(&dump_path, &report) {
        eprintln!("Failed to write crash dump: {}", e);
    }
}

fn payload_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<unknown>"
    }
}

fn crash_report(timestamp: &str, thread: &str, location: &str, payload: &str, trace: &str) -> String {
    format!(
        "=== CRITICAL PANIC ===\n\
         Timestamp: {}\n\
         Thread: {}\n\
         Location: {}\n\
         Payload: {}\n\n\
         Stack Trace:\n{}",
        timestamp, thread, location, payload, trace
    )
}
