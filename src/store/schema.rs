pub const SCHEMA: &str = r#"
-- Issued API keys. The master credential is never stored here.
CREATE TABLE IF NOT EXISTS api_keys (
    secret TEXT PRIMARY KEY,           -- compared verbatim, see DESIGN.md
    owner_id TEXT NOT NULL,
    owner_email TEXT,
    owner_name TEXT,
    name TEXT NOT NULL,
    permissions INTEGER NOT NULL,      -- bitmask, all bits set = wildcard
    created_at TEXT DEFAULT (datetime('now')),
    last_used_at TEXT
);

-- Bucket catalog; names are unique per owner only
CREATE TABLE IF NOT EXISTS buckets (
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL,
    region TEXT NOT NULL,
    storage_root TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (owner_id, name)
);

CREATE INDEX IF NOT EXISTS idx_api_keys_owner ON api_keys(owner_id);
"#;
