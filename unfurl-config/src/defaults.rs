//! Built-in tuning tables.
//!
//! These are the values used when a config file omits a section. Within
//! every selector chain the order is the priority: earlier entries win.

pub const CONFIG_VERSION: &str = "1";

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; UnfurlBot/1.0)";
pub const STATIC_TIMEOUT_SECS: u64 = 10;

pub const WEBDRIVER_URL: &str = "http://localhost:9515";
pub const LAUNCH_TIMEOUT_SECS: u64 = 15;
pub const NAVIGATION_TIMEOUT_SECS: u64 = 15;
pub const MAX_CONCURRENT_RENDERS: usize = 4;
pub const QUEUE_TIMEOUT_SECS: u64 = 30;

pub const UNSUPPORTED_BROWSER_MARKER: &str = "This browser is no longer supported";
pub const MIN_CONTENT_LENGTH: usize = 1000;

pub const SPA_SIGNATURES: &[&str] = &[
    // React
    "data-reactroot",
    "<div id=\"root\"",
    // Vue
    "data-v-",
    "<div id=\"app\"",
    // Angular
    "ng-version",
    "_ngcontent-",
    "<app-root>",
    // Svelte
    "svelte-",
    // Next.js / Nuxt
    "__NEXT_DATA__",
    "<div id=\"__next\">",
    "window.__NUXT__",
    "<div id=\"__nuxt\">",
    // bundlers
    "webpackChunk",
    "parcelRequire",
    "vite/dist",
];

pub const POPULAR_HOSTS: &[&str] = &[
    "x.com",
    "twitter.com",
    "instagram.com",
    "linkedin.com",
    "tiktok.com",
    "youtube.com",
    "facebook.com",
    "reddit.com",
    "github.com",
];

pub const TITLE_SELECTORS: &[&str] = &[
    "meta[property='og:title']",
    "meta[name='twitter:title']",
    "meta[property='twitter:title']",
    "title",
    "meta[itemprop='name']",
    "meta[itemprop='headline']",
    "meta[name='dc.title']",
    "meta[name='DC.title']",
    "meta[name='title']",
    "meta[property='title']",
    "meta[name='page-title']",
    "h1",
    "h2",
    "[data-title]",
];

pub const DESCRIPTION_SELECTORS: &[&str] = &[
    "meta[property='og:description']",
    "meta[name='twitter:description']",
    "meta[property='twitter:description']",
    "meta[name='description']",
    "meta[name='Description']",
    "meta[itemprop='description']",
    "meta[name='dc.description']",
    "meta[name='DC.description']",
    "meta[property='description']",
    "meta[name='page-description']",
    "meta[name='summary']",
    "meta[name='abstract']",
    "meta[name='twitter:summary']",
    "p.description",
    "p.summary",
    "p.lead",
    ".description",
];

pub const IMAGE_SELECTORS: &[&str] = &[
    "meta[property='og:image']",
    "meta[property='og:image:url']",
    "meta[property='og:image:secure_url']",
    "meta[name='twitter:image']",
    "meta[name='twitter:image:src']",
    "meta[property='twitter:image']",
    "meta[itemprop='image']",
    "meta[itemprop='thumbnailUrl']",
    "meta[name='image']",
    "meta[property='image']",
    "meta[name='thumbnail']",
    "meta[name='msapplication-TileImage']",
    "link[rel='apple-touch-icon']",
    "link[rel='apple-touch-icon-precomposed']",
    "link[rel='icon'][sizes='192x192']",
    "link[rel='icon'][sizes='180x180']",
    "link[rel='icon'][sizes='32x32']",
    "link[rel='shortcut icon']",
    "link[rel='icon']",
];

pub const SITE_SELECTORS: &[&str] = &[
    "meta[property='og:site_name']",
    "meta[name='twitter:site']",
    "meta[property='twitter:site']",
    "meta[name='application-name']",
    "meta[name='apple-mobile-web-app-title']",
    "meta[itemprop='publisher']",
    "meta[name='dc.publisher']",
    "meta[name='DC.publisher']",
    "meta[name='site_name']",
    "meta[name='site-name']",
    "meta[property='site_name']",
    "meta[name='publisher']",
    "meta[name='author']",
    "meta[name='copyright']",
    "meta[name='generator']",
];

pub(crate) fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
