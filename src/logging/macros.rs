#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        let logger = $crate::logging::Logger::new();
        let _ = logger.log($crate::logging::LogLevel::Debug, &format!($($arg)*));
    }};
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        let logger = $crate::logging::Logger::new();
        let _ = logger.log($crate::logging::LogLevel::Info, &format!($($arg)*));
    }};
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        let logger = $crate::logging::Logger::new();
        let _ = logger.log($crate::logging::LogLevel::Warn, &format!($($arg)*));
    }};
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        let logger = $crate::logging::Logger::new();
        let _ = logger.log($crate::logging::LogLevel::Error, &format!($($arg)*));
    }};
}
