//! Rendered panel image references

use chrono::{DateTime, Duration, Utc};
use reqwest::Url;

use crate::config::{ImageAttributes, IMAGE_LOOKBACK_HOURS};

/// Time range rendered into a panel image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl RenderWindow {
    /// The fixed lookback window ending at `now`
    pub fn ending_at(now: DateTime<Utc>) -> Self {
        Self {
            from: now - Duration::hours(IMAGE_LOOKBACK_HOURS),
            to: now,
        }
    }

    /// The fixed lookback window ending at the current instant
    pub fn now() -> Self {
        Self::ending_at(Utc::now())
    }
}

/// Build the render URL of one panel. Pure; no request is made.
pub fn build_image_url(
    base_url: &Url,
    dashboard_uid: &str,
    panel_id: i64,
    window: RenderWindow,
    attrs: &ImageAttributes,
) -> String {
    let mut url = base_url.clone();
    let path = format!(
        "{}/render/d-solo/{}/{}",
        base_url.path().trim_end_matches('/'),
        dashboard_uid,
        attrs.slug
    );
    url.set_path(&path);

    url.query_pairs_mut()
        .clear()
        .append_pair("from", &window.from.timestamp_millis().to_string())
        .append_pair("to", &window.to.timestamp_millis().to_string())
        .append_pair("panelId", &panel_id.to_string())
        .append_pair("width", &attrs.width.to_string())
        .append_pair("height", &attrs.height.to_string())
        .append_pair("tz", &attrs.timezone);

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_base_url;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn params(url: &str) -> HashMap<String, String> {
        Url::parse(url).unwrap().query_pairs().into_owned().collect()
    }

    fn attrs() -> ImageAttributes {
        ImageAttributes {
            width: 1000,
            height: 500,
            timezone: "Europe/Moscow".to_string(),
            slug: "monitors".to_string(),
        }
    }

    #[test]
    fn test_window_is_twelve_hours() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let window = RenderWindow::ending_at(now);

        assert_eq!(window.to, now);
        assert_eq!(window.to - window.from, Duration::hours(12));
    }

    #[test]
    fn test_url_shape() {
        let base = parse_base_url("grafana.local:3000").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let url = build_image_url(&base, "abc", 4, RenderWindow::ending_at(now), &attrs());
        assert!(url.starts_with("http://grafana.local:3000/render/d-solo/abc/monitors?"));

        let params = params(&url);
        assert_eq!(params["panelId"], "4");
        assert_eq!(params["width"], "1000");
        assert_eq!(params["height"], "500");
        assert_eq!(params["tz"], "Europe/Moscow");
        assert_eq!(params["to"], now.timestamp_millis().to_string());

        let from: i64 = params["from"].parse().unwrap();
        let to: i64 = params["to"].parse().unwrap();
        assert_eq!(to - from, 12 * 60 * 60 * 1000);
    }

    #[test]
    fn test_same_inputs_differ_only_in_window() {
        let base = parse_base_url("https://example.com/grafana/").unwrap();

        let first = build_image_url(&base, "abc", 2, RenderWindow::now(), &attrs());
        let second = build_image_url(&base, "abc", 2, RenderWindow::now(), &attrs());

        let (mut a, mut b) = (params(&first), params(&second));
        for key in ["from", "to"] {
            a.remove(key);
            b.remove(key);
        }
        assert_eq!(a, b);
        assert!(first.starts_with("https://example.com/grafana/render/d-solo/abc/monitors?"));

        let to: i64 = params(&second)["to"].parse().unwrap();
        assert!((Utc::now().timestamp_millis() - to).abs() < 5_000);
    }
}
