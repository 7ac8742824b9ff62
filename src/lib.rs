// Shared part with the logstat binary
pub mod analyzer;
pub mod parser;
pub mod report;
pub mod sources;

pub use analyzer::{analyze, analyze_file, analyze_reader, AnalysisSummary, Analyzer, DEFAULT_TOP};
pub use parser::{parse_line, AccessLogParser, LogParser, LogRecord};
