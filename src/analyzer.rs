use anyhow::{Context, Result};
use serde::{ser::SerializeMap, Serialize, Serializer};
use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::parser::{parse_line, HttpMethod, LogRecord};

/// How many entries the ranked views keep unless told otherwise
pub const DEFAULT_TOP: usize = 3;

/// A matched request as it appears in `top_longest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlowRequest {
    pub ip: String,
    pub date: String,
    pub method: String,
    pub url: String,
    pub duration: u64,
}

impl From<&LogRecord<'_>> for SlowRequest {
    fn from(record: &LogRecord<'_>) -> Self {
        SlowRequest {
            ip: record.ip.to_string(),
            date: record.bracketed_date(),
            method: record.method.to_string(),
            url: record.path.to_string(),
            duration: record.duration,
        }
    }
}

/// Keeps the `capacity` items with the largest keys, largest first.
///
/// An item only goes in front of items with a strictly smaller key, so among
/// equal keys the one pushed first stays ahead. The result is the same as a
/// stable descending sort over everything pushed, cut to `capacity`.
#[derive(Debug, Clone)]
pub struct TopK<T> {
    capacity: usize,
    entries: Vec<(u64, T)>,
}

impl<T> TopK<T> {
    pub fn new(capacity: usize) -> Self {
        TopK {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, key: u64, item: T) {
        let pos = self.entries.partition_point(|(k, _)| *k >= key);
        if pos >= self.capacity {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop();
        }
        self.entries.insert(pos, (key, item));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.entries.into_iter().map(|(_, item)| item).collect()
    }
}

/// Requests per recognized method. Serializes as an object with keys in the
/// order the methods were first seen.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MethodCounts {
    counts: [u64; HttpMethod::ALL.len()],
    seen: Vec<HttpMethod>,
}

impl MethodCounts {
    pub fn record(&mut self, method: HttpMethod) {
        let count = &mut self.counts[method.index()];
        if *count == 0 {
            self.seen.push(method);
        }
        *count += 1;
    }

    pub fn get(&self, method: HttpMethod) -> u64 {
        self.counts[method.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HttpMethod, u64)> + '_ {
        self.seen.iter().map(|m| (*m, self.get(*m)))
    }
}

impl Serialize for MethodCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.seen.len()))?;
        for (method, count) in self.iter() {
            map.serialize_entry(method.as_str(), &count)?;
        }
        map.end()
    }
}

/// Requests per client IP, in first-seen order
#[derive(Debug, Default, Clone)]
pub struct IpCounts {
    index: HashMap<String, usize>,
    counts: Vec<(String, u64)>,
}

impl IpCounts {
    pub fn record(&mut self, ip: &str) {
        match self.index.get(ip) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(ip.to_string(), self.counts.len());
                self.counts.push((ip.to_string(), 1));
            }
        }
    }

    pub fn get(&self, ip: &str) -> u64 {
        self.index.get(ip).map_or(0, |&i| self.counts[i].1)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(ip, count)| (ip.as_str(), *count))
    }

    /// The `k` busiest clients; ties go to the client seen first
    pub fn top(&self, k: usize) -> TopIps {
        let mut top = TopK::new(k);
        for (ip, count) in self.iter() {
            top.push(count, (ip.to_string(), count));
        }
        TopIps(top.into_vec())
    }
}

/// Ranked `(ip, count)` pairs, serialized as an object keeping the ranking order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TopIps(pub Vec<(String, u64)>);

impl Serialize for TopIps {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (ip, count) in &self.0 {
            map.serialize_entry(ip, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub top_ips: TopIps,
    pub top_longest: Vec<SlowRequest>,
    pub total_stat: MethodCounts,
    pub total_requests: u64,
}

/// Single-pass fold over the lines of one log file
#[derive(Debug)]
pub struct Analyzer {
    top: usize,
    total_requests: u64,
    skipped: u64,
    methods: MethodCounts,
    ips: IpCounts,
    longest: TopK<SlowRequest>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::with_top(DEFAULT_TOP)
    }

    pub fn with_top(top: usize) -> Self {
        Analyzer {
            top,
            total_requests: 0,
            skipped: 0,
            methods: MethodCounts::default(),
            ips: IpCounts::default(),
            longest: TopK::new(top),
        }
    }

    /// Feed one raw line. Returns whether it matched the access log format;
    /// lines that do not match leave the statistics untouched.
    pub fn ingest(&mut self, line: &str) -> bool {
        match parse_line(line) {
            Some(record) => {
                self.ingest_record(&record);
                true
            }
            None => {
                self.skipped += 1;
                false
            }
        }
    }

    pub fn ingest_record(&mut self, record: &LogRecord<'_>) {
        self.total_requests += 1;
        if let Ok(method) = record.method.parse::<HttpMethod>() {
            self.methods.record(method);
        }
        self.ips.record(record.ip);
        self.longest.push(record.duration, record.into());
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn skipped_lines(&self) -> u64 {
        self.skipped
    }

    pub fn ip_counts(&self) -> &IpCounts {
        &self.ips
    }

    pub fn finish(self) -> AnalysisSummary {
        AnalysisSummary {
            top_ips: self.ips.top(self.top),
            top_longest: self.longest.into_vec(),
            total_stat: self.methods,
            total_requests: self.total_requests,
        }
    }
}

/// Summarize a sequence of lines, keeping the top 3 of each ranking
pub fn analyze<I, S>(lines: I) -> AnalysisSummary
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut analyzer = Analyzer::new();
    for line in lines {
        analyzer.ingest(line.as_ref());
    }
    analyzer.finish()
}

/// Summarize everything `reader` yields. A read error abandons the whole input.
pub fn analyze_reader<R: BufRead>(reader: R, top: usize) -> Result<AnalysisSummary> {
    let mut analyzer = Analyzer::with_top(top);
    for line in reader.lines() {
        let line = line.context("read line failed")?;
        analyzer.ingest(&line);
    }
    tracing::debug!(
        "Matched {} lines, skipped {}, {} distinct clients",
        analyzer.total_requests(),
        analyzer.skipped_lines(),
        analyzer.ip_counts().len()
    );
    Ok(analyzer.finish())
}

pub fn analyze_file(path: &Path, top: usize) -> Result<AnalysisSummary> {
    let file = File::open(path).with_context(|| format!("open {} failed", path.display()))?;
    if let Ok(metadata) = file.metadata() {
        tracing::debug!(
            "Analyzing {} ({})",
            path.display(),
            humansize::format_size(metadata.len(), humansize::BINARY)
        );
    }
    analyze_reader(BufReader::new(file), top)
        .with_context(|| format!("analyze {} failed", path.display()))
}
