// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for attack simulation.

use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of caller keys (client addresses) for testing.
pub fn generate_callers(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c)).to_string()
        })
        .collect()
}

/// Script-injection attempts seen against free-text fields.
pub fn generate_injection_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert(1)</script>",
        "<img src=x onerror=alert(1)>",
        "<IMG SRC=\"JaVaScRiPt:alert('XSS')\">",
        "<a href=\"javascript:void(0)\" onclick=\"steal()\">win</a>",
        "<svg/onload=alert(1)>",
        "<body ONLOAD=alert('x')>",
        "<iframe src=\"data:text/html;base64,PHNjcmlwdD4=\">",
        "javajavascript:script:alert(1)",
        "jav<script>ascript:alert(1)",
        "dadata:ta:text/html,hi",
        "oonclick=nmouseover=alert(1)",
        "<<script>>nested<</script>>",
        "Great launch! <b onmouseover=track()>Sign up</b> today",
        "data:image/svg+xml,<svg onload=alert(1)>",
        "  <p>padded</p>  ",
    ]
}

/// Payloads the denylist does not neutralize. These document the known
/// limitation: they pass through unchanged apart from trimming.
pub fn generate_obfuscated_payloads() -> Vec<&'static str> {
    vec![
        "&lt;script&gt;alert(1)&lt;/script&gt;",
        "java\tscript:alert(1)",
        "%3Cscript%3Ealert(1)%3C/script%3E",
        "onclick = alert(1)",
    ]
}

/// Image URLs a post must never be admitted with. Relative paths and
/// scheme-less strings fail to parse; the rest parse but are not http(s) or
/// lack a host.
pub fn generate_malformed_urls() -> Vec<&'static str> {
    vec![
        "",
        "\t",
        "cat.png",
        "/uploads/2026/cat.png",
        "//cdn.example.com/cat.png",
        "https://",
        "ftp://media.example.com/cat.png",
        "file:///home/user/cat.png",
        "javascript:alert(1)",
        "data:image/png;base64,iVBORw0KGgo=",
        "blob:https://dashboard.example.com/1b2c",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_callers() {
        let callers = generate_callers(256);
        assert_eq!(callers.len(), 256);
        let unique: std::collections::HashSet<_> = callers.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_payload_corpora_are_non_empty() {
        assert!(!generate_injection_payloads().is_empty());
        assert!(!generate_obfuscated_payloads().is_empty());
        assert!(generate_malformed_urls().contains(&"javascript:alert(1)"));
    }
}
