pub const TRANS_ID_LEN: usize = 16;
pub const HEADER_LEN: usize = 20;

// type(2) + length(2)
pub const ATTR_HEADER_LEN: usize = 4;

pub const MESSAGE_TYPE_BIND_REQ: u16 = 0x0001;
pub const MESSAGE_TYPE_BIND_RES: u16 = 0x0101;
pub const MESSAGE_TYPE_BIND_ERR_RES: u16 = 0x0111;

pub const ATTR_FAMILY_IPV4: u8 = 0x01;

// ignored(1) + family(1) + port(2) + ipv4(4)
pub const ATTR_ADDRESS_V4_LEN: usize = 8;
pub const ATTR_CHANGE_REQUEST_LEN: usize = 4;

pub const ATTR_MAPPED_ADDRESS: u16 = 0x0001;
pub const ATTR_CHANGE_REQUEST: u16 = 0x0003;
pub const ATTR_SOURCE_ADDRESS: u16 = 0x0004;
pub const ATTR_CHANGED_ADDRESS: u16 = 0x0005;

pub const CHANGE_REQUEST_IP: u32 = 0x04;
pub const CHANGE_REQUEST_PORT: u32 = 0x02;
