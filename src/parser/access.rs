// parse access log lines with a trailing request duration, e.g.
// 192.168.1.10 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 2326 "-" "curl/8.0" 120
//
// The match is anchored at the start of the line only: anything after the
// duration digits is ignored.

use regex::Regex;

use super::{LogParser, LogRecord};

const ACCESS_LOG_PATTERN: &str = concat!(
    r#"^(?P<ip>.*?) (-) (-) "#,
    r#"\[(?P<date>.*?) (?P<timezone>.*?)\] "#,
    r#""(?P<method>.*?) (?P<path>.*?)(?P<version> HTTP/.*)?" "#,
    r#"(?P<status>.*?) (?P<length>.*?) "#,
    r#""(?P<referrer>.*?)" "(?P<user_agent>.*?)" "#,
    r#"(?P<duration>[0-9]+)"#,
);

pub struct AccessLogParser {
    pattern: Regex,
}

impl AccessLogParser {
    pub fn new() -> Self {
        AccessLogParser {
            pattern: Regex::new(ACCESS_LOG_PATTERN).expect("access log pattern is valid"),
        }
    }
}

impl Default for AccessLogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser for AccessLogParser {
    fn parse<'a>(&self, line: &'a str) -> Option<LogRecord<'a>> {
        let Some(caps) = self.pattern.captures(line) else {
            tracing::trace!("line does not match: {:?}", line);
            return None;
        };
        let field = |name: &str| caps.name(name).map(|m| m.as_str());

        // digits only, but may still overflow
        let duration = match field("duration")?.parse::<u64>() {
            Ok(duration) => duration,
            Err(e) => {
                tracing::trace!("duration out of range ({}): {:?}", e, line);
                return None;
            }
        };

        Some(LogRecord {
            ip: field("ip")?,
            date: field("date")?,
            timezone: field("timezone")?,
            method: field("method")?,
            path: field("path")?,
            protocol: field("version").map(|v| v.trim_start_matches(' ')),
            status: field("status")?,
            length: field("length")?,
            referrer: field("referrer")?,
            user_agent: field("user_agent")?,
            duration,
        })
    }
}
