use crate::attrs::RawAttr;
use crate::constants::*;
use crate::error::ParsePacketErr;
use bytes::{BufMut, BytesMut};
use std::net::{Ipv4Addr, SocketAddrV4};

// 地址类的attribute
//
// mapped-address  changed-address  source-address
//
// 0                   1                   2                   3
// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |x x x x x x x x|    Family     |           Port                |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                             Address                           |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
// rfc 3489 只有 ipv4: family 0x01

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressAttr {
    pub attr_type: u16,
    pub address: SocketAddrV4,
}

impl AddressAttr {
    pub fn new(attr_type: u16, address: SocketAddrV4) -> Self {
        Self { attr_type, address }
    }

    pub fn is_address_type(attr_type: u16) -> bool {
        matches!(
            attr_type,
            ATTR_MAPPED_ADDRESS | ATTR_SOURCE_ADDRESS | ATTR_CHANGED_ADDRESS
        )
    }

    /// Parses an address value without going through a `RawAttr`.
    pub fn parse_value(attr_type: u16, value: &[u8]) -> Result<Self, ParsePacketErr> {
        if value.len() < ATTR_ADDRESS_V4_LEN {
            return Err(ParsePacketErr::BufSize(format!(
                "address attr 0x{:04x} len:{} < {}",
                attr_type,
                value.len(),
                ATTR_ADDRESS_V4_LEN
            )));
        }

        // 第一个字节忽略
        let mut index = 1_usize;
        let family = value[index];
        if family != ATTR_FAMILY_IPV4 {
            return Err(ParsePacketErr::BadValue(format!(
                "address attr 0x{:04x} ip family: {}",
                attr_type, family
            )));
        }

        index += 1;
        let port = u16::from_be_bytes([value[index], value[index + 1]]);

        index += 2;
        let ip = Ipv4Addr::new(
            value[index],
            value[index + 1],
            value[index + 2],
            value[index + 3],
        );

        Ok(Self {
            attr_type,
            address: SocketAddrV4::new(ip, port),
        })
    }
}

impl From<AddressAttr> for RawAttr {
    fn from(attr: AddressAttr) -> Self {
        let mut bytes_buf = BytesMut::with_capacity(ATTR_ADDRESS_V4_LEN);

        bytes_buf.put_u8(0);
        bytes_buf.put_u8(ATTR_FAMILY_IPV4);
        bytes_buf.put_u16(attr.address.port());
        bytes_buf.put_slice(&attr.address.ip().octets());
        let value = bytes_buf.freeze();

        RawAttr::new(attr.attr_type, value)
    }
}

impl TryFrom<RawAttr> for AddressAttr {
    type Error = ParsePacketErr;

    fn try_from(base_attr: RawAttr) -> Result<Self, Self::Error> {
        AddressAttr::parse_value(base_attr.attr_type, &base_attr.value)
    }
}
