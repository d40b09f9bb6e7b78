/// Get environment variable as String
pub fn get_var(key: &str) -> Result<String, std::env::VarError> {
    std::env::var(key)
}

pub fn get_log_level() -> Result<String, std::env::VarError> {
    get_var("SUM_REPORT_LOG_LEVEL")
}

pub fn get_rust_log() -> Result<String, std::env::VarError> {
    get_var("RUST_LOG")
}
