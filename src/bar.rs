use indicatif::{ProgressBar, ProgressStyle};

pub fn get_progress_bar(len: u64, message: &str, template: Option<&str>) -> ProgressBar {
    let style = ProgressStyle::with_template(template.unwrap_or("{msg}: {bar} ({pos}/{len})"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(len)
        .with_style(style)
        .with_message(message.to_string())
}
