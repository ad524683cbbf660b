#![allow(dead_code)]

use bytes::Bytes;
use nat_stun::attrs::address_attr::AddressAttr;
use nat_stun::constants::*;
use nat_stun::header::Header;
use nat_stun::packet::Packet;
use std::net::{SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Which probes a loopback responder answers.
///
/// A single socket cannot really answer from another address, so the change
/// flags only decide whether a reply is sent at all.
#[derive(Debug, Clone, Copy)]
pub struct Behavior {
    pub plain: bool,
    pub change_ip: bool,
    pub change_port: bool,
}

impl Behavior {
    pub fn answer_all() -> Self {
        Self {
            plain: true,
            change_ip: true,
            change_port: true,
        }
    }

    pub fn plain_only() -> Self {
        Self {
            plain: true,
            change_ip: false,
            change_port: false,
        }
    }
}

pub struct Responder {
    pub addr: SocketAddrV4,
    pub received: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl Responder {
    pub async fn spawn(behavior: Behavior, changed: SocketAddrV4) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.expect("can't bind");
        let addr = match socket.local_addr().expect("no local addr") {
            SocketAddr::V4(v) => v,
            SocketAddr::V6(_) => unreachable!(),
        };
        let received = Arc::new(AtomicUsize::new(0));
        let counter = received.clone();

        let handle = tokio::spawn(async move {
            let mut buf = vec![0u8; 2048];
            loop {
                let (len, remote_addr) = match socket.recv_from(&mut buf).await {
                    Ok(v) => v,
                    Err(_) => continue,
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let remote_addr = match remote_addr {
                    SocketAddr::V4(v) => v,
                    SocketAddr::V6(_) => continue,
                };
                if let Some(res) = get_response(&buf[..len], addr, remote_addr, changed, behavior) {
                    let _ = socket.send_to(&res, remote_addr).await;
                }
            }
        });

        Self {
            addr,
            received,
            handle,
        }
    }

    pub fn received(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn get_response(
    buf: &[u8],
    local_addr: SocketAddrV4,
    remote_addr: SocketAddrV4,
    changed: SocketAddrV4,
    behavior: Behavior,
) -> Option<Bytes> {
    let req = Packet::unpack(buf).ok()?;
    if req.header.msg_type != MESSAGE_TYPE_BIND_REQ || req.validate().is_err() {
        return None;
    }

    let answer = match req.find_change_request() {
        None => behavior.plain,
        Some(v) if v.change_ip => behavior.change_ip,
        Some(v) if v.change_port => behavior.change_port,
        Some(_) => behavior.plain,
    };
    if !answer {
        return None;
    }

    let header = Header::new(MESSAGE_TYPE_BIND_RES, 0, req.header.trans_id);
    let attrs = vec![
        AddressAttr::new(ATTR_MAPPED_ADDRESS, remote_addr).into(),
        AddressAttr::new(ATTR_SOURCE_ADDRESS, local_addr).into(),
        AddressAttr::new(ATTR_CHANGED_ADDRESS, changed).into(),
    ];

    Some(Packet::new(header, attrs).pack())
}

/// A bound socket that never reads, so probes to it go unanswered.
pub struct SilentPeer {
    pub addr: SocketAddrV4,
    _socket: UdpSocket,
}

impl SilentPeer {
    pub async fn bind() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.expect("can't bind");
        let addr = match socket.local_addr().expect("no local addr") {
            SocketAddr::V4(v) => v,
            SocketAddr::V6(_) => unreachable!(),
        };
        Self {
            addr,
            _socket: socket,
        }
    }
}
