pub mod api {
    pub const BASE_URL: &str = "https://api.nextdns.io";
    pub const API_KEY_HEADER: &str = "x-api-key";
    pub const MAX_REDIRECTS: usize = 10;
}

pub mod doh {
    pub const BASE_URL: &str = "https://dns.nextdns.io";
    pub const ACCEPT: &str = "application/dns-json";
    pub const DEFAULT_RECORD_TYPE: &str = "A";

    pub const VALID_RECORD_TYPES: &[&str] = &[
        "A", "AAAA", "CNAME", "MX", "NS", "PTR", "SOA", "TXT", "SRV", "CAA", "DNSKEY", "DS",
    ];

    // RFC 1035 response codes.
    pub const STATUS_CODES: &[(i64, &str)] = &[
        (0, "NOERROR - Success"),
        (1, "FORMERR - Format error"),
        (2, "SERVFAIL - Server failure"),
        (3, "NXDOMAIN - Non-existent domain"),
        (4, "NOTIMP - Not implemented"),
        (5, "REFUSED - Query refused"),
    ];
}

pub mod network {
    pub const DEFAULT_HTTP_TIMEOUT_SECS: f64 = 30.0;
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8000;
    pub const MCP_HTTP_PATH: &str = "/mcp";
}

pub mod env {
    pub const API_KEY: &str = "NEXTDNS_API_KEY";
    pub const API_KEY_FILE: &str = "NEXTDNS_API_KEY_FILE";
    pub const HTTP_TIMEOUT: &str = "NEXTDNS_HTTP_TIMEOUT";
    pub const DEFAULT_PROFILE: &str = "NEXTDNS_DEFAULT_PROFILE";
    pub const READABLE_PROFILES: &str = "NEXTDNS_READABLE_PROFILES";
    pub const WRITABLE_PROFILES: &str = "NEXTDNS_WRITABLE_PROFILES";
    pub const READ_ONLY: &str = "NEXTDNS_READ_ONLY";
    pub const OPENAPI_PATH: &str = "NEXTDNS_OPENAPI_PATH";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
}

pub mod server {
    pub const PROTOCOL_VERSION: &str = "2025-06-18";
    pub const NAME: &str = "NextDNS MCP Server";
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
