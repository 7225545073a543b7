//! Process-wide panic guard
//!
//! Panics inside spawned tasks are already isolated by tokio; this hook makes
//! sure they show up in the log instead of only on stderr.

use log::error;
use std::panic;

pub fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());

        error!("💥 Panic at {location}: {message}");
        default_hook(info);
    }));
}
