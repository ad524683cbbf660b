use async_trait::async_trait;
use bytes::Bytes;
use nat_discovery::channel::Transport;
use nat_discovery::discovery::{Discovery, State};
use nat_discovery::error::ProbeError;
use nat_discovery::nat_type::{NatType, Traversal};
use nat_stun::attrs::address_attr::AddressAttr;
use nat_stun::attrs::change_request::ChangeRequest;
use nat_stun::attrs::RawAttr;
use nat_stun::constants::*;
use nat_stun::header::Header;
use nat_stun::packet::Packet;
use std::collections::VecDeque;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Mutex;

const LOCAL_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);

fn addr(s: &str) -> SocketAddrV4 {
    s.parse().expect("unable to parse")
}

fn server() -> SocketAddrV4 {
    addr("198.51.100.1:3478")
}

fn changed() -> SocketAddrV4 {
    addr("198.51.100.2:3479")
}

fn public() -> SocketAddrV4 {
    addr("203.0.113.7:40000")
}

enum Reply {
    Timeout,
    Binding {
        mapped: Option<SocketAddrV4>,
        changed: Option<SocketAddrV4>,
    },
    Raw(Vec<u8>),
    Fail,
}

fn binding(mapped: SocketAddrV4) -> Reply {
    Reply::Binding {
        mapped: Some(mapped),
        changed: Some(changed()),
    }
}

#[derive(Debug, PartialEq)]
struct Sent {
    dest: SocketAddrV4,
    change: Option<ChangeRequest>,
}

/// Answers each probe with the next scripted reply.
struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    sent: Mutex<Vec<Sent>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            sent: Mutex::new(vec![]),
        }
    }

    fn sent(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send_and_await(
        &self,
        dest: SocketAddrV4,
        payload: &[u8],
    ) -> Result<Option<Bytes>, ProbeError> {
        let req = Packet::unpack(payload).expect("bad request");
        assert_eq!(req.header.msg_type, MESSAGE_TYPE_BIND_REQ);
        self.sent.lock().unwrap().push(Sent {
            dest,
            change: req.find_change_request(),
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected probe");

        match reply {
            Reply::Timeout => Ok(None),
            Reply::Binding { mapped, changed } => {
                let header = Header::new(MESSAGE_TYPE_BIND_RES, 0, req.header.trans_id);
                let mut res = Packet::new(header, vec![]);
                if let Some(v) = mapped {
                    res.add_attr(AddressAttr::new(ATTR_MAPPED_ADDRESS, v).into());
                }
                res.add_attr(RawAttr::new(0x8022, Bytes::from_static(b"test")));
                if let Some(v) = changed {
                    res.add_attr(AddressAttr::new(ATTR_CHANGED_ADDRESS, v).into());
                }
                Ok(Some(res.pack()))
            }
            Reply::Raw(v) => Ok(Some(Bytes::from(v))),
            Reply::Fail => Err(io::Error::new(io::ErrorKind::Other, "send failed").into()),
        }
    }
}

fn plain(dest: SocketAddrV4) -> Sent {
    Sent { dest, change: None }
}

fn change(change_ip: bool) -> Sent {
    Sent {
        dest: server(),
        change: Some(ChangeRequest::new(change_ip, true)),
    }
}

async fn run(transport: &ScriptedTransport) -> Result<NatType, ProbeError> {
    Discovery::new(transport, server(), LOCAL_IP).run().await
}

#[tokio::test]
async fn no_reply_to_test_i_is_udp_blocked() {
    let transport = ScriptedTransport::new(vec![Reply::Timeout]);
    assert_eq!(run(&transport).await.unwrap(), NatType::UdpBlocked);
    assert_eq!(transport.sent(), vec![plain(server())]);
}

#[tokio::test]
async fn unexpected_message_type_is_no_reply() {
    let header = Header::new(MESSAGE_TYPE_BIND_ERR_RES, 0, [0u8; TRANS_ID_LEN]);
    let transport = ScriptedTransport::new(vec![Reply::Raw(header.pack().to_vec())]);
    assert_eq!(run(&transport).await.unwrap(), NatType::UdpBlocked);
}

#[tokio::test]
async fn no_translation_and_reply_is_open_internet() {
    let local = SocketAddrV4::new(LOCAL_IP, 50000);
    let transport = ScriptedTransport::new(vec![binding(local), binding(local)]);
    assert_eq!(run(&transport).await.unwrap(), NatType::OpenInternet);
    assert_eq!(transport.sent(), vec![plain(server()), change(true)]);
}

#[tokio::test]
async fn no_translation_and_no_reply_is_symmetric_firewall() {
    let local = SocketAddrV4::new(LOCAL_IP, 50000);
    let transport = ScriptedTransport::new(vec![binding(local), Reply::Timeout]);
    assert_eq!(run(&transport).await.unwrap(), NatType::SymmetricUdpFirewall);
    assert_eq!(transport.sent(), vec![plain(server()), change(true)]);
}

#[tokio::test]
async fn change_ip_reply_behind_nat_is_full_cone() {
    let transport = ScriptedTransport::new(vec![binding(public()), binding(public())]);
    assert_eq!(run(&transport).await.unwrap(), NatType::FullCone);
    assert_eq!(transport.sent(), vec![plain(server()), change(true)]);
}

#[tokio::test]
async fn other_mapping_via_changed_address_is_symmetric() {
    let transport = ScriptedTransport::new(vec![
        binding(public()),
        Reply::Timeout,
        binding(addr("203.0.113.7:40001")),
    ]);
    assert_eq!(run(&transport).await.unwrap(), NatType::SymmetricNat);
    assert_eq!(
        transport.sent(),
        vec![plain(server()), change(true), plain(changed())]
    );
}

#[tokio::test]
async fn same_mapping_and_change_port_reply_is_restricted() {
    let transport = ScriptedTransport::new(vec![
        binding(public()),
        Reply::Timeout,
        binding(public()),
        binding(public()),
    ]);
    assert_eq!(run(&transport).await.unwrap(), NatType::RestrictedNat);
    assert_eq!(
        transport.sent(),
        vec![plain(server()), change(true), plain(changed()), change(false)]
    );
}

#[tokio::test]
async fn same_mapping_and_no_change_port_reply_is_port_restricted() {
    let transport = ScriptedTransport::new(vec![
        binding(public()),
        Reply::Timeout,
        binding(public()),
        Reply::Timeout,
    ]);
    assert_eq!(run(&transport).await.unwrap(), NatType::RestrictedPortNat);
    assert_eq!(transport.sent().len(), 4);
}

#[tokio::test]
async fn no_reply_from_changed_address_is_udp_blocked() {
    let transport =
        ScriptedTransport::new(vec![binding(public()), Reply::Timeout, Reply::Timeout]);
    assert_eq!(run(&transport).await.unwrap(), NatType::UdpBlocked);
    assert_eq!(
        transport.sent(),
        vec![plain(server()), change(true), plain(changed())]
    );
}

#[tokio::test]
async fn missing_changed_address_is_protocol_fault() {
    let transport = ScriptedTransport::new(vec![Reply::Binding {
        mapped: Some(public()),
        changed: None,
    }]);
    let err = run(&transport).await.unwrap_err();
    assert!(matches!(err, ProbeError::ProtocolFault(_)));
}

#[tokio::test]
async fn missing_mapped_address_is_protocol_fault() {
    let transport = ScriptedTransport::new(vec![Reply::Binding {
        mapped: None,
        changed: Some(changed()),
    }]);
    let err = run(&transport).await.unwrap_err();
    assert!(matches!(err, ProbeError::ProtocolFault(_)));
}

#[tokio::test]
async fn missing_mapped_address_from_changed_is_protocol_fault() {
    let transport = ScriptedTransport::new(vec![
        binding(public()),
        Reply::Timeout,
        Reply::Binding {
            mapped: None,
            changed: Some(changed()),
        },
    ]);
    let err = run(&transport).await.unwrap_err();
    assert!(matches!(err, ProbeError::ProtocolFault(_)));
}

#[tokio::test]
async fn malformed_response_is_protocol_fault() {
    let mut buf = Header::new(MESSAGE_TYPE_BIND_RES, 0, [0u8; TRANS_ID_LEN])
        .pack()
        .to_vec();
    buf[3] = 8;
    buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x10]);

    let transport = ScriptedTransport::new(vec![Reply::Raw(buf)]);
    let err = run(&transport).await.unwrap_err();
    assert!(matches!(err, ProbeError::ProtocolFault(_)));
}

#[tokio::test]
async fn transport_error_aborts_run() {
    let transport = ScriptedTransport::new(vec![binding(public()), Reply::Fail]);
    let err = run(&transport).await.unwrap_err();
    assert!(matches!(err, ProbeError::Transport(_)));
    assert_eq!(transport.sent().len(), 2);
}

#[tokio::test]
async fn check_mapped_step_sends_nothing() {
    let transport = ScriptedTransport::new(vec![]);
    let discovery = Discovery::new(&transport, server(), LOCAL_IP).with_alt_port(Some(3479));

    assert_eq!(discovery.step(State::Init).await.unwrap(), State::AwaitI);

    let next = discovery
        .step(State::CheckMapped {
            mapped: public(),
            changed: changed(),
        })
        .await
        .unwrap();
    assert_eq!(
        next,
        State::AwaitII {
            mapped: public(),
            changed: changed(),
            translated: true,
        }
    );

    let done = State::Done(NatType::FullCone);
    assert_eq!(discovery.step(done).await.unwrap(), done);
    assert!(transport.sent().is_empty());
}

#[test]
fn nat_type_names_and_traversal() {
    assert_eq!(NatType::SymmetricUdpFirewall.to_string(), "SYMMETRIC_UDP_FIREWALL");
    assert_eq!(NatType::RestrictedPortNat.to_string(), "RESTRICTED_PORT_NAT");
    assert_eq!(NatType::OpenInternet.traversal(), Traversal::Direct);
    assert_eq!(NatType::RestrictedNat.traversal(), Traversal::HolePunch);
    assert_eq!(NatType::SymmetricNat.traversal(), Traversal::Relay);
    assert_eq!(NatType::UdpBlocked.traversal(), Traversal::Unreachable);
}
