//! Binding request encoding and lenient binding response decoding.

use crate::attrs::address_attr::AddressAttr;
use crate::attrs::change_request::ChangeRequest;
use crate::constants::*;
use crate::error::{EncodeError, ParsePacketErr};
use crate::header::{Header, TransId};
use crate::packet::Packet;
use crate::util;
use bytes::Bytes;
use log::{debug, trace};
use std::net::SocketAddrV4;

/// What a discovery step learns from one exchange.
///
/// `is_response` is false both for a timeout and for a datagram that is not a
/// binding response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingResponse {
    pub is_response: bool,
    pub trans_id: Option<TransId>,
    pub mapped_address: Option<SocketAddrV4>,
    pub changed_address: Option<SocketAddrV4>,
}

impl BindingResponse {
    pub fn no_response() -> Self {
        Self::default()
    }
}

/// Builds a binding request.
///
/// `change_ip == None` sends a plain probe without CHANGE-REQUEST. Otherwise the
/// change-port flag is always set and the change-ip flag follows `change_ip`.
pub fn binding_request(trans_id: TransId, change_ip: Option<bool>) -> Packet {
    let header = Header::new(MESSAGE_TYPE_BIND_REQ, 0, trans_id);
    let mut request = Packet::new(header, vec![]);

    if let Some(change_ip) = change_ip {
        request.add_attr(ChangeRequest::new(change_ip, true).into());
    }

    request
}

pub fn marshal_request(trans_id: TransId, change_ip: Option<bool>) -> Bytes {
    binding_request(trans_id, change_ip).pack()
}

/// Same as [`marshal_request`] with the transaction id in hex text form.
pub fn marshal(trans_id: &str, change_ip: Option<bool>) -> Result<Bytes, EncodeError> {
    let trans_id = util::parse_trans_id(trans_id)?;
    Ok(marshal_request(trans_id, change_ip))
}

/// Decodes the reply of one exchange, `None` meaning the exchange timed out.
///
/// Attributes are walked until the declared message length is used up. Only
/// MAPPED-ADDRESS and CHANGED-ADDRESS are read, other types are skipped by their
/// declared length. An attribute that does not fit in the remaining declared
/// length, or in the buffer, stops decoding with an error.
pub fn unmarshal(data: Option<&[u8]>) -> Result<BindingResponse, ParsePacketErr> {
    let buf = match data {
        None => return Ok(BindingResponse::no_response()),
        Some(v) => v,
    };

    if buf.len() < 2 {
        return Err(ParsePacketErr::BufSize(format!(
            "message buf len:{} < 2",
            buf.len()
        )));
    }

    let msg_type = u16::from_be_bytes([buf[0], buf[1]]);
    if msg_type != MESSAGE_TYPE_BIND_RES {
        debug!("not a binding response, msg_type: 0x{:04x}", msg_type);
        return Ok(BindingResponse::no_response());
    }

    let header = Header::unpack(buf)?;
    let body = &buf[HEADER_LEN..];

    let mut result = BindingResponse {
        is_response: true,
        trans_id: Some(header.trans_id),
        ..Default::default()
    };

    let mut remaining = header.msg_len as usize;
    let mut offset = 0_usize;

    while remaining > 0 {
        if remaining < ATTR_HEADER_LEN {
            return Err(ParsePacketErr::LengthOverrun {
                attr_len: ATTR_HEADER_LEN,
                remaining,
            });
        }

        if body.len() < offset + ATTR_HEADER_LEN {
            return Err(ParsePacketErr::BufSize(format!(
                "attr header at {} past buf len:{}",
                offset,
                body.len()
            )));
        }

        let attr_type = u16::from_be_bytes([body[offset], body[offset + 1]]);
        let attr_len = u16::from_be_bytes([body[offset + 2], body[offset + 3]]) as usize;
        let size = ATTR_HEADER_LEN + attr_len;

        if size > remaining {
            return Err(ParsePacketErr::LengthOverrun {
                attr_len: size,
                remaining,
            });
        }

        if body.len() < offset + size {
            return Err(ParsePacketErr::BufSize(format!(
                "attr 0x{:04x} value len:{} past buf len:{}",
                attr_type,
                attr_len,
                body.len()
            )));
        }

        let value = &body[offset + ATTR_HEADER_LEN..offset + size];
        match attr_type {
            ATTR_MAPPED_ADDRESS => {
                result.mapped_address = Some(AddressAttr::parse_value(attr_type, value)?.address);
            }
            ATTR_CHANGED_ADDRESS => {
                result.changed_address = Some(AddressAttr::parse_value(attr_type, value)?.address);
            }
            _ => {
                trace!("skip attr 0x{:04x}, len:{}", attr_type, attr_len);
            }
        }

        offset += size;
        remaining -= size;
    }

    Ok(result)
}
