use log::error;
use std::panic;

/// Install `better_panic` plus a hook that records the panic in the log
/// before the backtrace is printed.
///
/// Only the binary installs this; library callers keep their own hook.
pub fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        log_panic(panic_info);

        default_hook(panic_info);

        std::process::exit(1);
    }));
}

fn log_panic(panic_info: &panic::PanicHookInfo<'_>) {
    let location = panic_info
        .location()
        .map(|l| format!("{}:{}", l.file(), l.line()))
        .unwrap_or_else(|| "unknown location".to_string());
    error!("Panic at {location}: {}", panic_message(panic_info.payload()));
    log::logger().flush();
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
