//  Internal macros.
//
//  #   Why a macro?
//
//  The `log` dependency is optional, and `no_std` code has no better place to send diagnostics. A macro lets call
//  sites stay unconditional, and compiles down to nothing when the feature is disabled.

//  Emits a trace event, if the `log` feature is enabled.
#[cfg(feature = "log")]
macro_rules! trace {
    ($($arg:tt)+) => {
        ::log::trace!(target: "storage_array", $($arg)+)
    };
}

//  Emits a trace event, if the `log` feature is enabled.
#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($arg:tt)+) => {{}};
}
