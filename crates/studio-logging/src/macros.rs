//! ---
//! studio_section: "03-logging"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Structured logging helpers for console events."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---

#[doc(hidden)]
#[macro_export]
macro_rules! __console_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            actor = ctx.actor.unwrap_or(""),
            role = ctx.role.unwrap_or(""),
            section = ctx.section.unwrap_or(""),
            subject = ctx.subject.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with console context.
#[macro_export]
macro_rules! console_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__console_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__console_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with console context.
#[macro_export]
macro_rules! console_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__console_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__console_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with console context.
#[macro_export]
macro_rules! console_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__console_event!(tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__console_event!(tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with console context.
#[macro_export]
macro_rules! console_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__console_event!(tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__console_event!(tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
