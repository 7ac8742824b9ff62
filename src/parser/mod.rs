use std::{fmt, str::FromStr, sync::OnceLock};

pub mod access;

pub use access::AccessLogParser;

/// One access log line split into its fields. Every string borrows from the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub ip: &'a str,
    pub date: &'a str,
    pub timezone: &'a str,
    pub method: &'a str,
    pub path: &'a str,
    /// `HTTP/<version>` when the request carried one
    pub protocol: Option<&'a str>,
    pub status: &'a str,
    pub length: &'a str,
    pub referrer: &'a str,
    pub user_agent: &'a str,
    pub duration: u64,
}

impl LogRecord<'_> {
    /// Date and timezone as they appeared between the brackets, e.g. `[10/Oct/2023:13:55:36 +0000]`
    pub fn bracketed_date(&self) -> String {
        format!("[{} {}]", self.date, self.timezone)
    }
}

pub trait LogParser {
    /// Returns `None` when the line does not follow the format.
    fn parse<'a>(&self, line: &'a str) -> Option<LogRecord<'a>>;
}

/// Parse a line with a shared [`AccessLogParser`].
pub fn parse_line(line: &str) -> Option<LogRecord<'_>> {
    static PARSER: OnceLock<AccessLogParser> = OnceLock::new();
    PARSER.get_or_init(AccessLogParser::new).parse(line)
}

/// Request methods that get their own counter in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 6] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized request method: {}", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    // Case-sensitive: "get" is not GET
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}
