use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use crate::analyzer::AnalysisSummary;

/// `dir/access.log` -> `dir/access_stats.json`
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}_stats.json", stem))
}

/// Pretty JSON with 4-space indentation, no trailing newline
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .context("serialize summary failed")?;
    Ok(String::from_utf8(buf)?)
}

pub fn save_json(json: &str, output: &Path) -> Result<()> {
    let mut file =
        File::create(output).with_context(|| format!("create {} failed", output.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("write {} failed", output.display()))?;
    Ok(())
}

/// Print the summary and, unless `dry_run`, save it next to the input.
/// Returns the path written to.
pub fn publish(input: &Path, summary: &AnalysisSummary, dry_run: bool) -> Result<Option<PathBuf>> {
    let json = to_json(summary)?;
    display(input, &json)?;

    let output = output_path(input);
    if dry_run {
        tracing::info!("Dry run, would write {}", output.display());
        return Ok(None);
    }
    save_json(&json, &output)?;
    display_saved(&output)?;
    Ok(Some(output))
}

pub fn display(input: &Path, json: &str) -> Result<()> {
    let term = console::Term::stdout();
    term.write_line(&format!(
        "{}\n",
        console::style(format!("Statistics for file {}:", input.display())).bold()
    ))?;
    term.write_line(json)?;
    Ok(())
}

pub fn display_saved(output: &Path) -> Result<()> {
    console::Term::stdout().write_line(&format!(
        "{} {}\n",
        console::style("Statistics saved to:").green(),
        output.display()
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use test_log::test;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("/var/log/nginx/access.log")),
            PathBuf::from("/var/log/nginx/access_stats.json")
        );
        assert_eq!(
            output_path(Path::new("archive.tar.log")),
            PathBuf::from("archive.tar_stats.json")
        );
        assert_eq!(
            output_path(Path::new("logs/access")),
            PathBuf::from("logs/access_stats.json")
        );
    }

    #[test]
    fn test_empty_summary_json() {
        let summary = analyze(Vec::<&str>::new());
        let expected = r#"{
    "top_ips": {},
    "top_longest": [],
    "total_stat": {},
    "total_requests": 0
}"#;
        assert_eq!(to_json(&summary).unwrap(), expected);
    }

    #[test]
    fn test_summary_json_layout() {
        let summary = analyze([
            r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 2326 "-" "curl/8.0" 120"#,
        ]);
        let expected = r#"{
    "top_ips": {
        "10.0.0.1": 1
    },
    "top_longest": [
        {
            "ip": "10.0.0.1",
            "date": "[10/Oct/2023:13:55:36 +0000]",
            "method": "GET",
            "url": "/index.html",
            "duration": 120
        }
    ],
    "total_stat": {
        "GET": 1
    },
    "total_requests": 1
}"#;
        assert_eq!(to_json(&summary).unwrap(), expected);
    }

    #[test]
    fn test_top_ips_keep_rank_order() {
        let line = |ip: &str| {
            format!(
                r#"{} - - [10/Oct/2023:13:55:36 +0000] "GET / HTTP/1.1" 200 1 "-" "-" 1"#,
                ip
            )
        };
        let summary = analyze([line("z"), line("a"), line("a")]);
        let value: serde_json::Value = serde_json::from_str(&to_json(&summary).unwrap()).unwrap();
        assert_eq!(value["top_ips"]["a"], 2);
        assert_eq!(value["top_ips"]["z"], 1);
        let json = to_json(&summary.top_ips).unwrap();
        assert!(json.find("\"a\"").unwrap() < json.find("\"z\"").unwrap());
    }

    #[test]
    fn test_save_json() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("access_stats.json");
        save_json("{}", &output).unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "{}");

        let missing = dir.path().join("no/such/dir/out.json");
        assert!(save_json("{}", &missing).is_err());
    }
}
