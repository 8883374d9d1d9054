//! `UdpEndpoint`, the default `DatagramEndpoint`: a connected IPv4 UDP socket.
//!
//! Receives use `MSG_TRUNC`, so the kernel reports a datagram's real
//! length even when it does not fit the caller's buffer. The caller can
//! then discard oversized datagrams instead of accepting a partial one.

use udpoll_core::error::{PollError, Result};
use udpoll_core::source::{DatagramEndpoint, RawHandle};

use std::net::{Ipv4Addr, SocketAddrV4};
use std::os::unix::io::RawFd;

use crate::last_errno;

pub struct UdpEndpoint {
    fd: RawFd,
    peer: SocketAddrV4,
}

impl UdpEndpoint {
    /// Create a UDP socket and set its peer address.
    ///
    /// `ipaddr` must be a dotted-quad IPv4 address.
    pub fn connect(ipaddr: &str, port: u16) -> Result<Self> {
        let ip: Ipv4Addr = ipaddr
            .trim()
            .parse()
            .map_err(|_| PollError::Address(ipaddr.to_string()))?;
        let peer = SocketAddrV4::new(ip, port);

        let fd = unsafe {
            libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, libc::IPPROTO_UDP)
        };
        if fd < 0 {
            return Err(PollError::SocketCreate(last_errno()));
        }

        let addr = to_sockaddr(&peer);
        let ret = unsafe {
            libc::connect(
                fd,
                &addr as *const libc::sockaddr_in as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            )
        };
        if ret != 0 {
            let errno = last_errno();
            let _ = nix::unistd::close(fd);
            return Err(PollError::Connect(errno));
        }

        Ok(Self { fd, peer })
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    pub fn peer_addr(&self) -> SocketAddrV4 {
        self.peer
    }

    /// Local address the kernel bound during connect.
    pub fn local_addr(&self) -> Result<SocketAddrV4> {
        let mut addr: libc::sockaddr_in = unsafe { std::mem::zeroed() };
        let mut len = std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
        let ret = unsafe {
            libc::getsockname(
                self.fd,
                &mut addr as *mut libc::sockaddr_in as *mut libc::sockaddr,
                &mut len,
            )
        };
        if ret != 0 {
            return Err(PollError::Os(last_errno()));
        }
        Ok(from_sockaddr(&addr))
    }
}

impl DatagramEndpoint for UdpEndpoint {
    fn raw_handle(&self) -> RawHandle {
        self.fd
    }

    fn send(&self, payload: &[u8]) -> Result<usize> {
        let ret = unsafe {
            libc::send(
                self.fd,
                payload.as_ptr() as *const libc::c_void,
                payload.len(),
                0,
            )
        };
        if ret < 0 {
            return Err(PollError::Os(last_errno()));
        }
        Ok(ret as usize)
    }

    fn recv_truncating(&self, buf: &mut [u8]) -> Result<usize> {
        let ret = unsafe {
            libc::recv(
                self.fd,
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
                libc::MSG_TRUNC | libc::MSG_DONTWAIT,
            )
        };
        if ret < 0 {
            return Err(PollError::Os(last_errno()));
        }
        Ok(ret as usize)
    }

    fn release_handle(&mut self) {
        self.fd = -1;
    }
}

impl Drop for UdpEndpoint {
    fn drop(&mut self) {
        if self.fd >= 0 {
            let _ = nix::unistd::close(self.fd);
            self.fd = -1;
        }
    }
}

fn to_sockaddr(addr: &SocketAddrV4) -> libc::sockaddr_in {
    let mut sin: libc::sockaddr_in = unsafe { std::mem::zeroed() };
    sin.sin_family = libc::AF_INET as libc::sa_family_t;
    sin.sin_port = addr.port().to_be();
    sin.sin_addr.s_addr = u32::from_ne_bytes(addr.ip().octets());
    sin
}

fn from_sockaddr(sin: &libc::sockaddr_in) -> SocketAddrV4 {
    SocketAddrV4::new(
        Ipv4Addr::from(sin.sin_addr.s_addr.to_ne_bytes()),
        u16::from_be(sin.sin_port),
    )
}
