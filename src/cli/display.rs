//! Listing output (cosmetic, non-core).

use chrono::{TimeZone, Utc};
use comfy_table::{presets::UTF8_FULL, Table};

use crate::index::MetadataRecord;

fn format_date(epoch_seconds: i64) -> String {
    Utc.timestamp_opt(epoch_seconds, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_owned())
}

fn truncated_checksum(checksum: &str) -> &str {
    let len = checksum.len();
    if len > 10 {
        &checksum[len - 10..]
    } else {
        checksum
    }
}

/// Default (non-verbose) table: `Mode Uid Gid Size Date Checksum Path`.
pub fn print_table(records: &[MetadataRecord]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Mode", "Uid", "Gid", "Size", "Date", "Checksum", "Path"]);

    for record in records {
        table.add_row(vec![
            format!("{:o}", record.mode),
            record.uid.to_string(),
            record.gid.to_string(),
            // `show_files` populates this column from the stored (encrypted)
            // size, not the plaintext size.
            record.encrypted_size.to_string(),
            format_date(record.mtime),
            truncated_checksum(&record.checksum).to_owned(),
            record.path.clone(),
        ]);
    }

    println!("{table}");
}

/// `--verbose` dump: every field of the record, one per line.
pub fn print_verbose(records: &[MetadataRecord]) {
    for record in records {
        println!("Path: {}", record.path);
        println!("Name: {}", record.name);
        println!("MetadataVersion: {}", record.metadata_version);
        println!("BackEndId: {}", record.back_end_id);
        println!("EntryKey: {}", record.entry_key);
        println!("Size: {}", record.size);
        println!("Mode: {:o}", record.mode);
        println!("Uid: {}", record.uid);
        println!("Gid: {}", record.gid);
        println!("Atime: {}", format_date(record.atime));
        println!("Mtime: {}", format_date(record.mtime));
        println!("Ctime: {}", format_date(record.ctime));
        println!("Checksum: {}", record.checksum);
        println!(
            "EncryptionKey: {}",
            record.encryption_key.as_deref().unwrap_or("-")
        );
        println!("EncryptedSize: {}", record.encrypted_size);
        println!("EncryptedChecksum: {}", record.encrypted_checksum);
        println!();
    }
}

/// `Cloud <kind> keys: <back_end_id>` header followed by a matching-length
/// `=` underline.
pub fn print_banner(kind: &str, back_end_id: &str) {
    let msg = format!("Cloud {kind} keys: {back_end_id}");
    println!("{msg}");
    println!("{}", "=".repeat(msg.len()));
}
