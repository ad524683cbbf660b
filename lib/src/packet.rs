use crate::attrs::address_attr::AddressAttr;
use crate::attrs::change_request::ChangeRequest;
use crate::attrs::RawAttr;
use crate::constants::*;
use crate::error::ParsePacketErr;
use crate::header::Header;
use bytes::{BufMut, Bytes, BytesMut};

// 是否是一个正确的stun 包
// message_type 在范围内
// 验证message length
// 属性解析是否正常

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub attrs: Vec<RawAttr>,
}

impl Packet {
    pub fn new(header: Header, attrs: Vec<RawAttr>) -> Self {
        let mut packet = Self { header, attrs };
        packet.update_header_len();
        packet
    }

    fn update_header_len(&mut self) {
        let total = self.attrs.iter().fold(0_usize, |acc, x| acc + x.len());
        self.header.msg_len = total as u16;
    }

    pub fn add_attr(&mut self, attr: RawAttr) {
        self.attrs.push(attr);
        self.update_header_len();
    }

    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.header.msg_len as usize);
        buf.put_slice(&self.header.pack());
        for v in self.attrs.iter() {
            buf.put_slice(&v.pack());
        }

        buf.freeze()
    }

    /// Strict parse: the declared length must match the attribute bytes exactly.
    pub fn unpack(buf: &[u8]) -> Result<Self, ParsePacketErr> {
        let header = Header::unpack(buf)?;
        let mut rest = &buf[HEADER_LEN..];

        if header.msg_len as usize != rest.len() {
            return Err(ParsePacketErr::NotMatch(format!(
                "header len:{} != {}",
                header.msg_len,
                rest.len()
            )));
        }

        let mut attr_list = vec![];

        let mut max_attr = 32_usize;

        while !rest.is_empty() {
            if max_attr == 0 {
                return Err(ParsePacketErr::BadValue("too many attrs".to_string()));
            }

            let attr = RawAttr::unpack(rest)?;
            rest = &rest[attr.len()..];
            attr_list.push(attr);

            max_attr -= 1;
        }

        Ok(Packet {
            header,
            attrs: attr_list,
        })
    }

    pub fn validate(&self) -> Result<(), ParsePacketErr> {
        match self.header.msg_type {
            MESSAGE_TYPE_BIND_REQ | MESSAGE_TYPE_BIND_RES | MESSAGE_TYPE_BIND_ERR_RES => {}
            v => {
                return Err(ParsePacketErr::BadValue(format!(
                    "not support message type: 0x{:04x}",
                    v
                )));
            }
        }

        for v in self.attrs.iter() {
            if AddressAttr::is_address_type(v.attr_type) {
                AddressAttr::try_from(v.clone())?;
            }
            if v.attr_type == ATTR_CHANGE_REQUEST {
                ChangeRequest::try_from(v.clone())?;
            }
        }

        Ok(())
    }

    pub fn find_change_request(&self) -> Option<ChangeRequest> {
        self.attrs
            .iter()
            .find(|v| v.attr_type == ATTR_CHANGE_REQUEST)
            .and_then(|v| ChangeRequest::try_from(v.clone()).ok())
    }
}
