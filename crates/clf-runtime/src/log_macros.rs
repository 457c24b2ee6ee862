//! Log macros that tag every event with a `domain` field.
//!
//! Domains are bare identifiers: `sys` (process lifecycle), `conf` (loading
//! `clf.toml`, specs and secrets) and `gen` (compiling and writing output).
//!
//! ```ignore
//! clf_info!(gen, dialect = %dialect, bytes = text.len(), "configuration written");
//! clf_warn!(conf, path = %path.display(), "secrets dir is empty");
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! clf_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        $crate::__tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

#[macro_export]
macro_rules! clf_error {
    ($domain:ident, $($rest:tt)*) => {
        $crate::clf_log!(error, $domain, $($rest)*)
    };
}

#[macro_export]
macro_rules! clf_warn {
    ($domain:ident, $($rest:tt)*) => {
        $crate::clf_log!(warn, $domain, $($rest)*)
    };
}

#[macro_export]
macro_rules! clf_info {
    ($domain:ident, $($rest:tt)*) => {
        $crate::clf_log!(info, $domain, $($rest)*)
    };
}

#[macro_export]
macro_rules! clf_debug {
    ($domain:ident, $($rest:tt)*) => {
        $crate::clf_log!(debug, $domain, $($rest)*)
    };
}

#[macro_export]
macro_rules! clf_trace {
    ($domain:ident, $($rest:tt)*) => {
        $crate::clf_log!(trace, $domain, $($rest)*)
    };
}
