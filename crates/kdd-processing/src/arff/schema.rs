//! Static NSL-KDD domain knowledge.
//!
//! The repair rules and the positional fallback schema both live here so a new
//! dataset variant only needs new table entries, not parser changes.

/// The 42 NSL-KDD columns in file order (41 features plus the class).
pub const NSL_KDD_COLUMNS: [&str; 42] = [
    "duration",
    "protocol_type",
    "service",
    "flag",
    "src_bytes",
    "dst_bytes",
    "land",
    "wrong_fragment",
    "urgent",
    "hot",
    "num_failed_logins",
    "logged_in",
    "num_compromised",
    "root_shell",
    "su_attempted",
    "num_root",
    "num_file_creations",
    "num_shells",
    "num_access_files",
    "num_outbound_cmds",
    "is_host_login",
    "is_guest_login",
    "count",
    "srv_count",
    "serror_rate",
    "srv_serror_rate",
    "rerror_rate",
    "srv_rerror_rate",
    "same_srv_rate",
    "diff_srv_rate",
    "srv_diff_host_rate",
    "dst_host_count",
    "dst_host_srv_count",
    "dst_host_same_srv_rate",
    "dst_host_diff_srv_rate",
    "dst_host_same_src_port_rate",
    "dst_host_srv_diff_host_rate",
    "dst_host_serror_rate",
    "dst_host_srv_serror_rate",
    "dst_host_rerror_rate",
    "dst_host_srv_rerror_rate",
    "class",
];

const PROTOCOL_TYPES: &[&str] = &["tcp", "udp", "icmp"];

const SERVICES: &[&str] = &[
    "aol", "auth", "bgp", "courier", "csnet_ns", "ctf", "daytime", "discard", "domain",
    "domain_u", "echo", "eco_i", "ecr_i", "efs", "exec", "finger", "ftp", "ftp_data", "gopher",
    "harvest", "hostnames", "http", "http_2784", "http_443", "http_8001", "imap4", "IRC",
    "iso_tsap", "klogin", "kshell", "ldap", "link", "login", "mtp", "name", "netbios_dgm",
    "netbios_ns", "netbios_ssn", "netstat", "nnsp", "nntp", "ntp_u", "other", "pm_dump", "pop_2",
    "pop_3", "printer", "private", "red_i", "remote_job", "rje", "shell", "smtp", "sql_net", "ssh",
    "sunrpc", "supdup", "systat", "telnet", "tftp_u", "tim_i", "time", "urh_i", "urp_i", "uucp",
    "uucp_path", "vmnet", "whois", "X11", "Z39_50",
];

const FLAGS: &[&str] = &[
    "OTH", "REJ", "RSTO", "RSTOS0", "RSTR", "S0", "S1", "S2", "S3", "SF", "SH",
];

const BINARY: &[&str] = &["0", "1"];

/// Canonical nominal domains, keyed by a lower-case column-name substring.
///
/// Rules are tried in order and the first match wins.
pub const NOMINAL_DOMAINS: &[(&str, &[&str])] = &[
    ("protocol_type", PROTOCOL_TYPES),
    ("service", SERVICES),
    ("flag", FLAGS),
    ("is_host_login", BINARY),
    ("is_guest_login", BINARY),
    ("logged_in", BINARY),
    ("land", BINARY),
];

/// Type tokens (matched in any case) and their canonical ARFF keyword.
pub const TYPE_ALIASES: &[(&str, &str)] = &[
    ("numeric", "NUMERIC"),
    ("string", "STRING"),
    ("real", "NUMERIC"),
    ("integer", "NUMERIC"),
];

/// Find the canonical nominal domain for a column name, if any rule matches.
pub fn nominal_domain_for(column: &str) -> Option<&'static [&'static str]> {
    let lower = column.to_ascii_lowercase();
    NOMINAL_DOMAINS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, values)| *values)
}

/// Render a nominal domain as an ARFF enumeration, e.g. `{tcp,udp,icmp}`.
pub fn enumeration(values: &[&str]) -> String {
    format!("{{{}}}", values.join(","))
}
