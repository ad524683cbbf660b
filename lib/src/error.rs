use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsePacketErr {
    // 长度或值不匹配
    #[error("length mismatch: {0}")]
    NotMatch(String),

    // buf不够
    #[error("buffer too short: {0}")]
    BufSize(String),

    //字段的值不合规
    #[error("bad value: {0}")]
    BadValue(String),

    // attribute 超出了 header 声明的长度
    #[error("attribute of {attr_len} bytes overruns remaining message length {remaining}")]
    LengthOverrun { attr_len: usize, remaining: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("encode error: {0}")]
pub struct EncodeError(pub String);
