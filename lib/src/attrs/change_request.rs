use crate::attrs::RawAttr;
use crate::constants::*;
use crate::error::ParsePacketErr;
use bytes::{BufMut, BytesMut};

// rfc 3489, 11.2.4
// 32 bit flags: 0x04 change ip, 0x02 change port

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    pub change_ip: bool,
    pub change_port: bool,
}

impl ChangeRequest {
    pub fn new(change_ip: bool, change_port: bool) -> Self {
        Self {
            change_ip,
            change_port,
        }
    }

    pub fn flags(&self) -> u32 {
        let mut flag: u32 = 0;
        if self.change_ip {
            flag |= CHANGE_REQUEST_IP;
        }
        if self.change_port {
            flag |= CHANGE_REQUEST_PORT;
        }
        flag
    }
}

impl From<ChangeRequest> for RawAttr {
    fn from(attr: ChangeRequest) -> Self {
        let mut bytes_buf = BytesMut::with_capacity(ATTR_CHANGE_REQUEST_LEN);
        bytes_buf.put_u32(attr.flags());
        let value = bytes_buf.freeze();
        RawAttr::new(ATTR_CHANGE_REQUEST, value)
    }
}

impl TryFrom<RawAttr> for ChangeRequest {
    type Error = ParsePacketErr;

    fn try_from(base_attr: RawAttr) -> Result<Self, Self::Error> {
        if base_attr.attr_type != ATTR_CHANGE_REQUEST {
            return Err(ParsePacketErr::BadValue(format!(
                "not a change_request attr: 0x{:04x}",
                base_attr.attr_type
            )));
        }

        if base_attr.value.len() != ATTR_CHANGE_REQUEST_LEN {
            return Err(ParsePacketErr::BufSize(format!(
                "change_request attr len:{} != {}",
                base_attr.value.len(),
                ATTR_CHANGE_REQUEST_LEN
            )));
        }

        let v = &base_attr.value;
        let flag = u32::from_be_bytes([v[0], v[1], v[2], v[3]]);

        Ok(Self {
            change_ip: flag & CHANGE_REQUEST_IP == CHANGE_REQUEST_IP,
            change_port: flag & CHANGE_REQUEST_PORT == CHANGE_REQUEST_PORT,
        })
    }
}
