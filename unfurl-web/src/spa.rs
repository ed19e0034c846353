//! Heuristic for "this markup needs a browser".
//!
//! False positives and negatives are expected; the signature list and the
//! length threshold are tunables in the `heuristics` config section.

use unfurl_config::SpaSettings;

#[derive(Debug, Clone)]
pub struct SpaHeuristic {
    unsupported_marker: String,
    signatures: Vec<String>,
    min_content_length: usize,
}

impl Default for SpaHeuristic {
    fn default() -> Self {
        Self::from_config(&SpaSettings::default())
    }
}

impl SpaHeuristic {
    pub fn from_config(settings: &SpaSettings) -> Self {
        Self {
            unsupported_marker: settings.unsupported_browser_marker.clone(),
            signatures: settings
                .signatures
                .iter()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect(),
            min_content_length: settings.min_content_length,
        }
    }

    /// Classify `markup` as a client-rendered shell.
    ///
    /// In order: the unsupported-browser interstitial, any framework
    /// signature, then a trimmed length (in characters) below the threshold.
    pub fn looks_client_rendered(&self, markup: &str) -> bool {
        if !self.unsupported_marker.is_empty() && markup.contains(&self.unsupported_marker) {
            return true;
        }

        if self.signatures.iter().any(|s| markup.contains(s.as_str())) {
            return true;
        }

        markup.trim().chars().count() < self.min_content_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unfurl_config::defaults::SPA_SIGNATURES;

    fn long_static_page() -> String {
        let para = "<p>Plain server-rendered paragraph with real content.</p>\n";
        format!(
            "<html><head><title>Static</title></head><body>{}</body></html>",
            para.repeat(40)
        )
    }

    #[test]
    fn every_signature_triggers_regardless_of_length() {
        let h = SpaHeuristic::default();
        let filler = long_static_page();
        for sig in SPA_SIGNATURES {
            assert!(h.looks_client_rendered(sig), "short markup with {sig}");
            let long = format!("{filler}{sig}");
            assert!(h.looks_client_rendered(&long), "long markup with {sig}");
        }
    }

    #[test]
    fn unsupported_browser_interstitial_triggers() {
        let h = SpaHeuristic::default();
        let page = format!(
            "{}<div>This browser is no longer supported</div>",
            long_static_page()
        );
        assert!(h.looks_client_rendered(&page));
    }

    #[test]
    fn short_markup_is_a_shell() {
        let h = SpaHeuristic::default();
        assert!(h.looks_client_rendered(""));
        assert!(h.looks_client_rendered("<html><body>hi</body></html>"));
    }

    #[test]
    fn whitespace_padding_does_not_count_towards_length() {
        let h = SpaHeuristic::default();
        let padded = format!("{}<p>x</p>{}", " ".repeat(2000), "\n".repeat(2000));
        assert!(h.looks_client_rendered(&padded));
    }

    #[test]
    fn long_plain_markup_is_server_rendered() {
        let h = SpaHeuristic::default();
        let page = long_static_page();
        assert!(page.trim().len() >= 1000);
        assert!(!h.looks_client_rendered(&page));
    }

    #[test]
    fn threshold_boundary() {
        let h = SpaHeuristic::default();
        assert!(h.looks_client_rendered(&"a".repeat(999)));
        assert!(!h.looks_client_rendered(&"a".repeat(1000)));
    }

    #[test]
    fn custom_settings_are_honoured() {
        let h = SpaHeuristic::from_config(&SpaSettings {
            unsupported_browser_marker: String::new(),
            signatures: vec!["data-hydrate".into(), String::new()],
            min_content_length: 10,
        });
        assert!(h.looks_client_rendered("<div data-hydrate></div>"));
        assert!(!h.looks_client_rendered("<p>plenty of text here</p>"));
    }
}
