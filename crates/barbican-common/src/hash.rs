//! Content hash of rendered configuration
//!
//! The hash ends up in the `CONFIG_HASH` env var of every container, so any
//! change to the rendered files changes the pod template and rolls the pods.

use std::collections::BTreeMap;

use aws_lc_rs::digest::{Context, SHA256};

/// Compute the SHA-256 hex digest of rendered config files.
///
/// Files are fed in key order, each name and content prefixed with its byte
/// length, so no two distinct file sets produce the same input stream.
pub fn config_hash(files: &BTreeMap<String, String>) -> String {
    let mut ctx = Context::new(&SHA256);
    for (name, content) in files {
        update_field(&mut ctx, name);
        update_field(&mut ctx, content);
    }

    ctx.finish()
        .as_ref()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn update_field(ctx: &mut Context, field: &str) {
    ctx.update(&(field.len() as u64).to_le_bytes());
    ctx.update(field.as_bytes());
}
