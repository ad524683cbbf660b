#![allow(clippy::len_without_is_empty)]

use crate::constants::ATTR_HEADER_LEN;
use crate::error::ParsePacketErr;
use bytes::{BufMut, Bytes, BytesMut};

pub mod address_attr;
pub mod change_request;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttr {
    pub attr_type: u16,
    pub attr_len: u16,
    pub value: Bytes,
}

impl RawAttr {
    pub fn new(attr_type: u16, value: Bytes) -> Self {
        Self {
            attr_type,
            attr_len: value.len() as u16,
            value,
        }
    }

    pub fn len(&self) -> usize {
        self.attr_len as usize + ATTR_HEADER_LEN
    }

    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.len());

        buf.put_u16(self.attr_type);
        buf.put_u16(self.attr_len);
        buf.put_slice(&self.value);

        buf.freeze()
    }

    pub fn unpack(buf: &[u8]) -> Result<Self, ParsePacketErr> {
        if buf.len() < ATTR_HEADER_LEN {
            return Err(ParsePacketErr::BufSize(format!(
                "attr buf len:{}",
                buf.len()
            )));
        }

        let mut index = 0_usize;
        let attr_type = u16::from_be_bytes([buf[index], buf[index + 1]]);

        index += 2;
        let attr_len = u16::from_be_bytes([buf[index], buf[index + 1]]);

        let total = attr_len as usize + ATTR_HEADER_LEN;
        if buf.len() < total {
            return Err(ParsePacketErr::BufSize(format!(
                "attr buf len:{} < {}",
                buf.len(),
                total
            )));
        }

        index += 2;
        let value = Bytes::copy_from_slice(&buf[index..total]);

        Ok(Self {
            attr_type,
            attr_len,
            value,
        })
    }
}
