use crate::constants::TRANS_ID_LEN;
use crate::error::EncodeError;
use crate::header::TransId;
use rand::prelude::*;
use std::fmt::Write as _;

pub fn print_bytes(buf: &[u8], separator: &str, row_width: usize) -> String {
    let mut hex = String::new();
    buf.iter().enumerate().for_each(|(x, y)| {
        let _ = write!(hex, "{:02X}", y);
        if (x + 1) % row_width == 0 {
            hex.push('\n');
        } else {
            hex.push_str(separator);
        }
    });

    hex
}

// rfc 3489 没有 magic cookie, 128 bit 全部随机
pub fn new_trans_id() -> TransId {
    let mut trans_id = [0u8; TRANS_ID_LEN];
    rand::thread_rng().fill_bytes(&mut trans_id);
    trans_id
}

/// Parses the text form of a transaction id.
///
/// Needs at least 32 hex characters; anything after the first 32 is ignored.
pub fn parse_trans_id(s: &str) -> Result<TransId, EncodeError> {
    let hex_len = TRANS_ID_LEN * 2;
    let head = s.get(..hex_len).ok_or_else(|| {
        EncodeError(format!(
            "transaction id needs {} hex chars, got {}",
            hex_len,
            s.len()
        ))
    })?;

    let mut trans_id = [0u8; TRANS_ID_LEN];
    hex::decode_to_slice(head, &mut trans_id)
        .map_err(|e| EncodeError(format!("transaction id {:?}: {}", head, e)))?;
    Ok(trans_id)
}

pub fn format_trans_id(trans_id: &TransId) -> String {
    hex::encode(trans_id)
}
