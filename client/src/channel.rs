use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use nat_stun::util::print_bytes;
use socket2::SockRef;
use std::io;
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::watch;

use crate::error::ProbeError;

/// How long one probe waits for its reply, counted from send completion.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_millis(800);

pub const RECV_BUF_SIZE: usize = 32 * 1024;

/// One request, at most one reply.
///
/// Implementations may treat the first datagram after the send as the reply,
/// so callers never overlap two calls on the same transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `payload` to `dest` and waits [`RESPONSE_TIMEOUT`] for a reply.
    ///
    /// `Ok(None)` means nothing came back in time.
    async fn send_and_await(
        &self,
        dest: SocketAddrV4,
        payload: &[u8],
    ) -> Result<Option<Bytes>, ProbeError>;
}

/// Closes a [`Channel`] from outside the task using it.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CloseHandle {
    /// Returns true only for the call that actually closed the channel.
    pub fn close(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }
}

/// A UDP socket on an ephemeral port, used for one exchange at a time.
///
/// The socket is released when the channel is dropped; closing first wakes any
/// pending [`Transport::send_and_await`] with [`ProbeError::Cancelled`].
pub struct Channel {
    socket: UdpSocket,
    local_addr: SocketAddrV4,
    closer: CloseHandle,
    close_rx: watch::Receiver<bool>,
}

impl Channel {
    pub async fn bind(local_ip: Ipv4Addr) -> Result<Self, ProbeError> {
        let socket = UdpSocket::bind(SocketAddrV4::new(local_ip, 0)).await?;
        let local_addr = match socket.local_addr()? {
            SocketAddr::V4(v) => v,
            SocketAddr::V6(v) => {
                return Err(ProbeError::InvalidArgument(format!(
                    "ipv6 not support: {}",
                    v
                )));
            }
        };
        debug!("channel bound: {}", local_addr);

        let (tx, close_rx) = watch::channel(false);

        Ok(Self {
            socket,
            local_addr,
            closer: CloseHandle { tx: Arc::new(tx) },
            close_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddrV4 {
        self.local_addr
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closer.is_closed()
    }

    pub fn close(&self) {
        if self.closer.close() {
            debug!("channel closed: {}", self.local_addr);
        }
    }

    // 上一次超时请求的迟到响应, 不能当作这一次的响应
    // 直接读 fd: reactor 还没看到 readable 时 try_recv_from 不会读 socket
    fn drain_stale(&self) {
        let sock = SockRef::from(&self.socket);
        let mut buf = vec![MaybeUninit::<u8>::uninit(); RECV_BUF_SIZE];
        loop {
            match sock.recv_from(&mut buf) {
                Ok((len, remote_addr)) => {
                    warn!(
                        "drop stale datagram, {} <-- {:?}, len: {}",
                        self.local_addr,
                        remote_addr.as_socket(),
                        len
                    );
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    debug!("error, drain_stale, {:?}", e);
                    break;
                }
            }
        }
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.close();
    }
}

async fn wait_closed(mut close_rx: watch::Receiver<bool>) {
    loop {
        if *close_rx.borrow_and_update() {
            return;
        }
        if close_rx.changed().await.is_err() {
            return;
        }
    }
}

#[async_trait]
impl Transport for Channel {
    async fn send_and_await(
        &self,
        dest: SocketAddrV4,
        payload: &[u8],
    ) -> Result<Option<Bytes>, ProbeError> {
        if payload.is_empty() {
            return Err(ProbeError::InvalidArgument("empty payload".to_string()));
        }
        if self.is_closed() {
            return Err(ProbeError::InvalidArgument(format!(
                "channel {} is closed",
                self.local_addr
            )));
        }

        self.drain_stale();

        let mut recv_buf = vec![0u8; RECV_BUF_SIZE];
        let sent = self.socket.send_to(payload, dest).await?;
        debug!(
            "{} --> {}, sent: {}\n{}",
            self.local_addr,
            dest,
            sent,
            print_bytes(payload, " ", 8)
        );

        tokio::select! {
            res = tokio::time::timeout(RESPONSE_TIMEOUT, self.socket.recv_from(&mut recv_buf)) => {
                match res {
                    Ok(Ok((len, remote_addr))) => {
                        let buf = Bytes::copy_from_slice(&recv_buf[..len]);
                        debug!(
                            "{} <-- {}, recv: {}\n{}",
                            self.local_addr,
                            remote_addr,
                            len,
                            print_bytes(&buf, " ", 8)
                        );
                        Ok(Some(buf))
                    }
                    Ok(Err(e)) => Err(e.into()),
                    Err(_) => {
                        debug!("no reply from {} in {:?}", dest, RESPONSE_TIMEOUT);
                        Ok(None)
                    }
                }
            },
            _ = wait_closed(self.close_rx.clone()) => {
                debug!("channel {} closed while waiting for {}", self.local_addr, dest);
                Err(ProbeError::Cancelled)
            }
        }
    }
}
