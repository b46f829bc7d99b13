use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{LinkAnalysis, SearchPresence};

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"']+|\b(?:[a-z0-9-]+\.)+[a-z]{2,}/[^\s<>"']*"#)
        .expect("url pattern compiles")
});

const SHORTENERS: &[&str] = &[
    "bit.ly",
    "goo.gl",
    "tinyurl.com",
    "t.co",
    "is.gd",
    "cutt.ly",
    "rb.gy",
    "ow.ly",
    "shorturl.at",
    "tiny.cc",
    "buff.ly",
    "rebrand.ly",
];

const RISKY_TLDS: &[&str] = &[
    ".xyz", ".top", ".tk", ".ml", ".ga", ".cf", ".gq", ".club", ".online", ".work", ".info",
    ".site", ".cn", ".buzz", ".icu", ".live", ".rest",
];

const SCAM_HOST_WORDS: &[&str] = &[
    "secure", "login", "verify", "verification", "update", "kyc", "account", "support", "alert",
    "claim", "reward", "prize", "winner", "bonus", "wallet", "unlock", "refund",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brand {
    /// Name as matched in message text.
    pub pattern: &'static str,
    pub name: &'static str,
    /// Fragments that identify the brand inside a host name.
    pub host_tokens: &'static [&'static str],
    pub official_domains: &'static [&'static str],
    pub is_bank: bool,
}

pub const BRANDS: &[Brand] = &[
    Brand {
        pattern: "sbi",
        name: "SBI",
        host_tokens: &["sbi"],
        official_domains: &["onlinesbi.sbi", "sbi.co.in"],
        is_bank: true,
    },
    Brand {
        pattern: "hdfc",
        name: "HDFC Bank",
        host_tokens: &["hdfc"],
        official_domains: &["hdfcbank.com"],
        is_bank: true,
    },
    Brand {
        pattern: "icici",
        name: "ICICI Bank",
        host_tokens: &["icici"],
        official_domains: &["icicibank.com"],
        is_bank: true,
    },
    Brand {
        pattern: "axis bank",
        name: "Axis Bank",
        host_tokens: &["axisbank", "axis"],
        official_domains: &["axisbank.com"],
        is_bank: true,
    },
    Brand {
        pattern: "kotak",
        name: "Kotak Mahindra Bank",
        host_tokens: &["kotak"],
        official_domains: &["kotak.com"],
        is_bank: true,
    },
    Brand {
        pattern: "wells fargo",
        name: "Wells Fargo",
        host_tokens: &["wellsfargo", "wells"],
        official_domains: &["wellsfargo.com"],
        is_bank: true,
    },
    Brand {
        pattern: "bank of america",
        name: "Bank of America",
        host_tokens: &["bankofamerica", "bofa"],
        official_domains: &["bankofamerica.com"],
        is_bank: true,
    },
    Brand {
        pattern: "chase",
        name: "Chase",
        host_tokens: &["chase"],
        official_domains: &["chase.com"],
        is_bank: true,
    },
    Brand {
        pattern: "paytm",
        name: "Paytm",
        host_tokens: &["paytm"],
        official_domains: &["paytm.com"],
        is_bank: false,
    },
    Brand {
        pattern: "phonepe",
        name: "PhonePe",
        host_tokens: &["phonepe"],
        official_domains: &["phonepe.com"],
        is_bank: false,
    },
    Brand {
        pattern: "paypal",
        name: "PayPal",
        host_tokens: &["paypal"],
        official_domains: &["paypal.com"],
        is_bank: false,
    },
    Brand {
        pattern: "amazon",
        name: "Amazon",
        host_tokens: &["amazon"],
        official_domains: &["amazon.com", "amazon.in"],
        is_bank: false,
    },
    Brand {
        pattern: "netflix",
        name: "Netflix",
        host_tokens: &["netflix"],
        official_domains: &["netflix.com"],
        is_bank: false,
    },
    Brand {
        pattern: "apple",
        name: "Apple",
        host_tokens: &["apple"],
        official_domains: &["apple.com"],
        is_bank: false,
    },
    Brand {
        pattern: "microsoft",
        name: "Microsoft",
        host_tokens: &["microsoft"],
        official_domains: &["microsoft.com"],
        is_bank: false,
    },
    Brand {
        pattern: "google",
        name: "Google",
        host_tokens: &["google"],
        official_domains: &["google.com"],
        is_bank: false,
    },
    Brand {
        pattern: "irs",
        name: "IRS",
        host_tokens: &["irs"],
        official_domains: &["irs.gov"],
        is_bank: false,
    },
    Brand {
        pattern: "fedex",
        name: "FedEx",
        host_tokens: &["fedex"],
        official_domains: &["fedex.com"],
        is_bank: false,
    },
    Brand {
        pattern: "dhl",
        name: "DHL",
        host_tokens: &["dhl"],
        official_domains: &["dhl.com"],
        is_bank: false,
    },
    Brand {
        pattern: "usps",
        name: "USPS",
        host_tokens: &["usps"],
        official_domains: &["usps.com"],
        is_bank: false,
    },
];

impl Brand {
    pub fn owns(&self, host: &str) -> bool {
        self.official_domains
            .iter()
            .any(|domain| host_is_within(host, domain))
    }

    /// True when the host carries this brand's name without being one of its
    /// official domains.
    pub fn spoofed_by(&self, host: &str) -> bool {
        !self.owns(host) && self.host_tokens.iter().any(|token| host_mentions(host, token))
    }
}

/// What the link checker learned about one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReport {
    pub url: String,
    pub domain: String,
    pub shortened: bool,
    pub risky_tld: Option<&'static str>,
    pub scam_host: bool,
    pub spoofed_brand: Option<&'static Brand>,
    pub official_brand: Option<&'static Brand>,
}

impl LinkReport {
    pub fn inspect(url: &str) -> Option<Self> {
        let domain = host_of(url)?;
        let official_brand = BRANDS.iter().find(|brand| brand.owns(&domain));
        let shortened = SHORTENERS
            .iter()
            .any(|shortener| host_is_within(&domain, shortener));

        let (risky_tld, scam_host, spoofed_brand) = if official_brand.is_some() {
            (None, false, None)
        } else {
            (
                RISKY_TLDS.iter().copied().find(|tld| domain.ends_with(tld)),
                host_parts(&domain)
                    .any(|part| SCAM_HOST_WORDS.iter().any(|word| part.contains(word))),
                BRANDS.iter().find(|brand| brand.spoofed_by(&domain)),
            )
        };

        Some(Self {
            url: url.to_string(),
            domain,
            shortened,
            risky_tld,
            scam_host,
            spoofed_brand,
            official_brand,
        })
    }

    /// Hostile-looking host: risky TLD, scam vocabulary or a spoofed brand.
    pub fn is_suspicious(&self) -> bool {
        self.risky_tld.is_some() || self.scam_host || self.spoofed_brand.is_some()
    }

    pub fn presence(&self) -> SearchPresence {
        if self.official_brand.is_some() {
            SearchPresence::High
        } else if self.is_suspicious() || self.shortened {
            SearchPresence::Low
        } else {
            SearchPresence::Medium
        }
    }

    pub fn summary(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if let Some(brand) = self.official_brand {
            notes.push(format!("Official {} domain", brand.name));
        }
        if self.shortened {
            notes.push("Uses URL shortener to hide destination".to_string());
        }
        if let Some(tld) = self.risky_tld {
            notes.push(format!("Suspicious top-level domain ({tld})"));
        }
        if let Some(brand) = self.spoofed_brand {
            notes.push(format!("Spoofs known brand '{}'", brand.name));
        } else if self.scam_host {
            notes.push("Host name uses scam-style wording".to_string());
        }
        if notes.is_empty() {
            notes.push("No specific link threats detected".to_string());
        }
        notes
    }
}

impl From<&LinkReport> for LinkAnalysis {
    fn from(report: &LinkReport) -> Self {
        Self {
            domain: report.domain.clone(),
            shortened: report.shortened,
            brand_spoofing: report.spoofed_brand.is_some(),
            google_presence: report.presence(),
        }
    }
}

/// Pulls links out of free text, including bare `host.tld/path` forms.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for found in URL_PATTERN.find_iter(text) {
        let url = found
            .as_str()
            .trim_end_matches(['.', ',', ')', ';', '!', '?', ':']);
        if !url.is_empty() && !urls.iter().any(|seen| seen == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Lower-cased host of a URL with scheme, credentials, port and `www.` removed.
pub fn host_of(url: &str) -> Option<String> {
    let lower = url.trim().to_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?.split(':').next()?;
    let host = host.strip_prefix("www.").unwrap_or(host);

    let valid = host.contains('.')
        && !host.starts_with('.')
        && !host.ends_with('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    valid.then(|| host.to_string())
}

/// Validates a URL typed into the link checker and inspects it.
pub fn check_link(input: &str) -> Option<LinkReport> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return None;
    }
    LinkReport::inspect(trimmed)
}

fn host_is_within(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

fn host_parts(host: &str) -> impl Iterator<Item = &str> {
    host.split(['.', '-']).filter(|part| !part.is_empty())
}

fn host_mentions(host: &str, token: &str) -> bool {
    if host_parts(host).any(|part| part == token || (token.len() >= 4 && part.starts_with(token))) {
        return true;
    }
    token.len() >= 6 && host.replace('-', "").contains(token)
}
