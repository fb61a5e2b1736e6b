use std::path::Path;

use indicatif::ProgressStyle;

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {wide_msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
}

pub fn pb_style_speed() -> ProgressStyle {
    ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {per_sec} ETA {eta} {wide_msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// 检查文件后缀是否在允许的列表中，不区分大小写
pub fn has_extension(file_name: &str, allowed: &[&str]) -> bool {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| allowed.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_extension() {
        assert!(has_extension("a.JPG", &["png", "jpg"]));
        assert!(has_extension("dir.x/a.png", &["png"]));
        assert!(!has_extension("a.gif", &["png", "jpg"]));
        assert!(!has_extension("png", &["png"]));
    }
}
