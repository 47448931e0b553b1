//! Shared state of the in-process backend: sockets, endpoints, links,
//! message routing and wait-handle readiness.
//!
//! Everything here runs under the backend's single mutex. Routing errors
//! are plain errno values; the caller decides whether to block or fail.

use std::collections::{BTreeMap, HashMap, VecDeque};

use nnb_core::consts::EFSM;
use nnb_core::socket::{Domain, Protocol};
use tracing::{trace, warn};

use crate::eventfd::EventFd;

/// One queued message and the socket it came from.
///
/// `trail` is the stack of requesters a request crossed devices through;
/// the reply pops it hop by hop on its way back.
pub(crate) struct Frame {
    pub body: Vec<u8>,
    pub origin: i32,
    pub trail: Vec<i32>,
}

pub(crate) struct Endpoint {
    pub key: String,
    pub bound: bool,
}

/// A wait-handle plus the readiness it currently advertises.
pub(crate) struct Readiness {
    fd: Option<EventFd>,
    raised: bool,
}

impl Readiness {
    pub fn new(fd: Option<EventFd>) -> Self {
        Self { fd, raised: false }
    }

    pub fn raw_fd(&self) -> Option<i32> {
        self.fd.as_ref().map(EventFd::fd)
    }

    fn set(&mut self, ready: bool) {
        let Some(fd) = &self.fd else { return };
        if ready == self.raised {
            return;
        }
        let res = if ready { fd.notify() } else { fd.drain().map(|_| ()) };
        if let Err(e) = res {
            warn!(fd = fd.fd(), error = %e, "wait-handle update failed");
            return;
        }
        self.raised = ready;
    }
}

pub(crate) struct Sock {
    pub domain: Domain,
    pub protocol: Protocol,
    pub name: String,
    /// Integer options that were explicitly set, keyed by (level, option).
    pub ints: HashMap<(i32, i32), i32>,
    pub subscriptions: Vec<Vec<u8>>,
    pub endpoints: BTreeMap<i32, Endpoint>,
    pub next_endpoint: i32,
    pub inbox: VecDeque<Frame>,
    /// Peer (and its trail) the next reply goes to, cooked REP/RESPONDENT.
    pub reply_to: Option<(i32, Vec<i32>)>,
    cursor: usize,
    pub snd: Readiness,
    pub rcv: Readiness,
}

impl Sock {
    pub fn new(id: i32, domain: Domain, protocol: Protocol, snd: Option<EventFd>, rcv: Option<EventFd>) -> Self {
        Self {
            domain,
            protocol,
            name: id.to_string(),
            ints: HashMap::new(),
            subscriptions: Vec::new(),
            endpoints: BTreeMap::new(),
            next_endpoint: 1,
            inbox: VecDeque::new(),
            reply_to: None,
            cursor: 0,
            snd: Readiness::new(snd),
            rcv: Readiness::new(rcv),
        }
    }

    #[inline]
    pub fn is_raw(&self) -> bool {
        self.domain == Domain::SpRaw
    }

    fn subscribed(&self, body: &[u8]) -> bool {
        self.subscriptions.iter().any(|topic| body.starts_with(topic))
    }
}

/// A connection between a bound endpoint and a connecting one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Link {
    pub binder: (i32, i32),
    pub connector: (i32, i32),
}

impl Link {
    fn other(&self, s: i32) -> Option<i32> {
        if self.binder.0 == s {
            Some(self.connector.0)
        } else if self.connector.0 == s {
            Some(self.binder.0)
        } else {
            None
        }
    }
}

#[derive(Default)]
pub(crate) struct State {
    pub sockets: HashMap<i32, Sock>,
    pub next_socket: i32,
    /// Rendezvous key → bound (socket, endpoint).
    pub bound: HashMap<String, (i32, i32)>,
    pub links: Vec<Link>,
    pub terminated: bool,
}

impl State {
    /// Distinct peers of `s`, in link order.
    pub fn peers(&self, s: i32) -> Vec<i32> {
        let mut out = Vec::new();
        for p in self.links.iter().filter_map(|l| l.other(s)) {
            if !out.contains(&p) {
                out.push(p);
            }
        }
        out
    }

    /// Link every pending connector of `key` to the binder `(s, eid)`.
    pub fn link_connectors(&mut self, key: &str, s: i32, eid: i32) {
        let Some(protocol) = self.sockets.get(&s).map(|k| k.protocol) else { return };
        let pending: Vec<(i32, i32)> = self
            .sockets
            .iter()
            .filter(|(&c, sock)| c != s && sock.protocol.is_peer_of(protocol))
            .flat_map(|(&c, sock)| {
                sock.endpoints
                    .iter()
                    .filter(|(_, ep)| !ep.bound && ep.key == key)
                    .map(move |(&ce, _)| (c, ce))
            })
            .collect();
        for connector in pending {
            self.add_link(Link { binder: (s, eid), connector });
        }
    }

    /// Link the connector `(c, ce)` to whoever is bound at `key`.
    pub fn link_binder(&mut self, key: &str, c: i32, ce: i32) {
        let Some(&binder) = self.bound.get(key) else { return };
        let compatible = match (self.sockets.get(&binder.0), self.sockets.get(&c)) {
            (Some(b), Some(k)) => b.protocol.is_peer_of(k.protocol),
            _ => false,
        };
        if compatible && binder.0 != c {
            self.add_link(Link { binder, connector: (c, ce) });
        }
    }

    fn add_link(&mut self, link: Link) {
        if self.links.contains(&link) {
            return;
        }
        trace!(binder = link.binder.0, connector = link.connector.0, "link up");
        self.links.push(link);
        self.refresh(link.binder.0);
        self.refresh(link.connector.0);
    }

    /// Drop the links matching `pred` and refresh everyone they touched.
    pub fn unlink(&mut self, pred: impl Fn(&Link) -> bool) {
        let mut touched = Vec::new();
        self.links.retain(|l| {
            if pred(l) {
                touched.push(l.binder.0);
                touched.push(l.connector.0);
                false
            } else {
                true
            }
        });
        for s in touched {
            self.refresh(s);
        }
    }

    /// Whether a send on `s` would be accepted right now.
    pub fn can_send_now(&self, s: i32) -> bool {
        let Some(sock) = self.sockets.get(&s) else { return false };
        if self.terminated {
            return true;
        }
        match sock.protocol {
            Protocol::Pub | Protocol::Bus => true,
            Protocol::Sub | Protocol::Pull => false,
            Protocol::Rep | Protocol::Respondent if !sock.is_raw() => sock.reply_to.is_some(),
            _ => !self.peers(s).is_empty(),
        }
    }

    /// Bring both wait-handles of `s` in line with its state.
    pub fn refresh(&mut self, s: i32) {
        let snd_ready = self.can_send_now(s);
        let terminated = self.terminated;
        if let Some(sock) = self.sockets.get_mut(&s) {
            let rcv_ready = terminated || !sock.inbox.is_empty();
            sock.snd.set(snd_ready);
            sock.rcv.set(rcv_ready);
        }
    }

    /// Route one outgoing message from `s`.
    ///
    /// `exclude` keeps a message forwarded by a device from echoing back
    /// to the socket it arrived from.
    pub fn route(&mut self, s: i32, body: &[u8], mut trail: Vec<i32>, exclude: Option<i32>) -> Result<(), i32> {
        let sock = self.sockets.get(&s).ok_or(libc::EBADF)?;
        let protocol = sock.protocol;
        let raw = sock.is_raw();
        let peers = self.peers(s);
        match protocol {
            Protocol::Sub | Protocol::Pull => Err(libc::ENOTSUP),
            Protocol::Pub => {
                for p in peers {
                    let wants = self.sockets.get(&p).is_some_and(|k| k.subscribed(body));
                    if wants {
                        self.deliver(p, body, s, &trail);
                    }
                }
                Ok(())
            }
            Protocol::Bus | Protocol::Surveyor => {
                for p in peers.into_iter().filter(|&p| Some(p) != exclude) {
                    self.deliver(p, body, s, &trail);
                }
                Ok(())
            }
            Protocol::Rep | Protocol::Respondent if !raw => {
                let target = self.sockets.get_mut(&s).and_then(|k| k.reply_to.take());
                let Some((p, trail)) = target else { return Err(EFSM) };
                // Requester went away: the reply is dropped.
                if peers.contains(&p) {
                    self.deliver(p, body, s, &trail);
                }
                self.refresh(s);
                Ok(())
            }
            Protocol::Rep | Protocol::Respondent => match trail.pop() {
                Some(p) => {
                    if peers.contains(&p) {
                        self.deliver(p, body, s, &trail);
                    }
                    Ok(())
                }
                None => self.round_robin(s, &peers, body, &trail),
            },
            Protocol::Pair | Protocol::Push | Protocol::Req => self.round_robin(s, &peers, body, &trail),
        }
    }

    fn round_robin(&mut self, s: i32, peers: &[i32], body: &[u8], trail: &[i32]) -> Result<(), i32> {
        if peers.is_empty() {
            return Err(libc::EAGAIN);
        }
        let Some(sock) = self.sockets.get_mut(&s) else { return Err(libc::EBADF) };
        let p = peers[sock.cursor % peers.len()];
        sock.cursor = sock.cursor.wrapping_add(1);
        self.deliver(p, body, s, trail);
        Ok(())
    }

    fn deliver(&mut self, target: i32, body: &[u8], origin: i32, trail: &[i32]) {
        if let Some(sock) = self.sockets.get_mut(&target) {
            sock.inbox.push_back(Frame { body: body.to_vec(), origin, trail: trail.to_vec() });
        }
        self.refresh(target);
    }

    /// Take the next message queued on `s`, remembering where a cooked
    /// REP/RESPONDENT has to answer.
    pub fn take_frame(&mut self, s: i32) -> Option<Frame> {
        let sock = self.sockets.get_mut(&s)?;
        let frame = sock.inbox.pop_front()?;
        if matches!(sock.protocol, Protocol::Rep | Protocol::Respondent) && !sock.is_raw() {
            sock.reply_to = Some((frame.origin, frame.trail.clone()));
        }
        self.refresh(s);
        Some(frame)
    }
}
