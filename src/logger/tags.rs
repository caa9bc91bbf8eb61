/// Log tags identify the subsystem a log line belongs to
///
/// Each tag maps to a `--debug-<key>` flag that enables DEBUG output for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Api,
    Cache,
    Discovery,
    Tokens,
    Enrichment,
    Scoring,
    Database,
    Scanner,
    Webserver,
    Test,
    Other(String),
}

impl LogTag {
    /// Key used by `--debug-<key>` / `--verbose-<key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::Api => "api".to_string(),
            LogTag::Cache => "cache".to_string(),
            LogTag::Discovery => "discovery".to_string(),
            LogTag::Tokens => "tokens".to_string(),
            LogTag::Enrichment => "enrichment".to_string(),
            LogTag::Scoring => "scoring".to_string(),
            LogTag::Database => "database".to_string(),
            LogTag::Scanner => "scanner".to_string(),
            LogTag::Webserver => "webserver".to_string(),
            LogTag::Test => "test".to_string(),
            LogTag::Other(s) => s.to_lowercase(),
        }
    }

    /// Uncolored label used in log files
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Api => "API".to_string(),
            LogTag::Cache => "CACHE".to_string(),
            LogTag::Discovery => "DISCOVER".to_string(),
            LogTag::Tokens => "TOKENS".to_string(),
            LogTag::Enrichment => "ENRICH".to_string(),
            LogTag::Scoring => "SCORING".to_string(),
            LogTag::Database => "DATABASE".to_string(),
            LogTag::Scanner => "SCANNER".to_string(),
            LogTag::Webserver => "WEBSERVER".to_string(),
            LogTag::Test => "TEST".to_string(),
            LogTag::Other(s) => s.to_uppercase(),
        }
    }

    /// All known tags (used for help output)
    pub fn all() -> Vec<LogTag> {
        vec![
            LogTag::System,
            LogTag::Config,
            LogTag::Api,
            LogTag::Cache,
            LogTag::Discovery,
            LogTag::Tokens,
            LogTag::Enrichment,
            LogTag::Scoring,
            LogTag::Database,
            LogTag::Scanner,
            LogTag::Webserver,
        ]
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
