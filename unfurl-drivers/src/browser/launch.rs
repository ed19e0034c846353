use serde_json::json;
use std::time::Duration;
use webdriver::capabilities::Capabilities;

/// Everything needed to start one browser session.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// WebDriver endpoint, e.g. `http://localhost:9515`.
    pub webdriver_url: String,
    pub user_agent: String,
    pub headless: bool,
    /// Deadline for the session to come up.
    pub launch_timeout: Duration,
    /// Page-load deadline advertised to the WebDriver session.
    pub navigation_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            user_agent: "Mozilla/5.0 (compatible; UnfurlBot/1.0)".to_string(),
            headless: true,
            launch_timeout: Duration::from_secs(15),
            navigation_timeout: Duration::from_secs(15),
        }
    }
}

/// Construct Chrome command-line arguments for a session.
pub fn build_chrome_arguments(options: &LaunchOptions) -> Vec<String> {
    let mut args = vec![
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
        "--disable-infobars".to_string(),
        "--mute-audio".to_string(),
        format!("--user-agent={}", options.user_agent),
        "--window-size=1280,800".to_string(),
    ];
    if options.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args
}

/// W3C capabilities: wait for the load event, bound page loads, pass Chrome args.
pub fn build_capabilities(options: &LaunchOptions) -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("pageLoadStrategy".to_string(), json!("normal"));
    caps.insert(
        "timeouts".to_string(),
        json!({ "pageLoad": options.navigation_timeout.as_millis() as u64 }),
    );
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": build_chrome_arguments(options) }),
    );
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_adds_flags() {
        let opts = LaunchOptions::default();
        let args = build_chrome_arguments(&opts);
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--user-agent=Mozilla/5.0 (compatible; UnfurlBot/1.0)".to_string()));
    }

    #[test]
    fn headed_sessions_skip_headless_flags() {
        let opts = LaunchOptions {
            headless: false,
            ..Default::default()
        };
        let args = build_chrome_arguments(&opts);
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
    }

    #[test]
    fn capabilities_carry_load_strategy_and_timeout() {
        let opts = LaunchOptions {
            navigation_timeout: Duration::from_secs(15),
            ..Default::default()
        };
        let caps = build_capabilities(&opts);
        assert_eq!(caps["pageLoadStrategy"], "normal");
        assert_eq!(caps["timeouts"]["pageLoad"], 15_000);
        assert!(caps["goog:chromeOptions"]["args"].is_array());
    }
}
