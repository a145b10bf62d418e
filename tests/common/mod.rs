#![allow(dead_code)]

use std::fs;
use std::path::Path;

use issue_classifier::RuntimeConfig;

pub const TRAIN_ROWS: &[(&str, &str, &str)] = &[
    ("Entity Framework crashes", "EF throws on connect", "area-data"),
    ("Database connection timeout", "SqlClient cannot open a connection to the database server", "area-data"),
    ("EF migration fails", "Entity Framework migration drops the table in the database", "area-data"),
    ("Query returns wrong rows", "LINQ query against the database returns stale rows", "area-data"),
    ("Button misaligned in dialog", "The OK button renders outside the dialog window", "area-ui"),
    ("Dark theme colors wrong", "Text in the sidebar is unreadable with the dark theme", "area-ui"),
    ("Window flickers on resize", "Resizing the main window makes the layout flicker", "area-ui"),
    ("Font rendering blurry", "Labels render blurry on high DPI monitors", "area-ui"),
    ("HTTP client ignores proxy", "HttpClient does not use the configured proxy settings", "area-networking"),
    ("Socket leak under load", "Sockets stay open after the request completes", "area-networking"),
    ("TLS handshake fails", "HTTPS requests fail during the TLS handshake with the server", "area-networking"),
    ("DNS lookup is slow", "Resolving host names takes several seconds per request", "area-networking"),
];

pub const TEST_ROWS: &[(&str, &str, &str)] = &[
    ("Saving entity throws", "Entity Framework throws when saving changes to the database", "area-data"),
    ("Transaction not rolled back", "Database transaction stays open after an exception", "area-data"),
    ("Tooltip cut off", "Tooltips are clipped at the edge of the window", "area-ui"),
    ("Icons missing in toolbar", "Toolbar icons do not render after theme switch", "area-ui"),
    ("Request hangs forever", "HttpClient request never times out when the server is down", "area-networking"),
    ("Keep-alive not honored", "Connections to the proxy are closed after every request", "area-networking"),
];

pub fn write_tsv(path: &Path, rows: &[(&str, &str, &str)]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = String::from("Title\tDescription\tArea\n");
    for (title, description, area) in rows {
        content.push_str(&format!("{}\t{}\t{}\n", title, description, area));
    }
    fs::write(path, content)
}

/// A config rooted at `base` with both data files written.
pub fn prepared_config(base: &Path) -> std::io::Result<RuntimeConfig> {
    let config = RuntimeConfig::with_base_dir(base);
    write_tsv(&config.paths.train_data, TRAIN_ROWS)?;
    write_tsv(&config.paths.test_data, TEST_ROWS)?;
    Ok(config)
}
