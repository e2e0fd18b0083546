#[cfg(test)]
mod tests {
    use crate::units::{format_uptime, Size};

    #[test]
    fn size_renders_bytes() {
        assert_eq!(Size(0).to_string(), "0.0B");
        assert_eq!(Size(512).to_string(), "512.0B");
    }

    #[test]
    fn size_renders_kilobytes() {
        let rendered = Size(2048).to_string();
        assert_eq!(rendered, "2.0KB");
    }

    #[test]
    fn size_renders_megabytes_and_gigabytes() {
        assert_eq!(Size(5 * 1024 * 1024).to_string(), "5.0MB");
        assert_eq!(Size(3 * 1024 * 1024 * 1024).to_string(), "3.0GB");
    }

    #[test]
    fn uptime_zero_is_0s() {
        assert_eq!(format_uptime(0), "0s");
    }

    #[test]
    fn uptime_picks_the_largest_unit() {
        assert_eq!(format_uptime(5), "5s");
        assert_eq!(format_uptime(90), "2m");
        assert_eq!(format_uptime(3600 * 2), "2h");
        assert_eq!(format_uptime(86_400 * 3), "3D");
    }
}
