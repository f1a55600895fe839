// SPDX-License-Identifier: GPL-3.0-only

use std::io;
use std::os::fd::RawFd;

use tracing::{debug, error};

use super::{Guard, Release};

/// Value a descriptor slot holds once its descriptor is closed.
pub const CLOSED_FD: RawFd = -1;

/// Closes the descriptor held in a caller's slot.
#[derive(Debug)]
pub struct CloseFd<'a> {
    slot: &'a mut RawFd,
}

/// Like [`CloseFd`], retrying `close` when a signal interrupts it.
#[derive(Debug)]
pub struct CloseFdEintrSafe<'a> {
    slot: &'a mut RawFd,
}

pub type FdCloser<'a> = Guard<CloseFd<'a>>;
pub type EintrSafeFdCloser<'a> = Guard<CloseFdEintrSafe<'a>>;

impl CloseFd<'_> {
    pub fn fd(&self) -> RawFd {
        *self.slot
    }
}

impl CloseFdEintrSafe<'_> {
    pub fn fd(&self) -> RawFd {
        *self.slot
    }
}

impl Release for CloseFd<'_> {
    fn release(&mut self) {
        close_slot(self.slot, false, sys_close);
    }
}

impl Release for CloseFdEintrSafe<'_> {
    fn release(&mut self) {
        close_slot(self.slot, true, sys_close);
    }
}

fn sys_close(fd: RawFd) -> io::Result<()> {
    if unsafe { libc::close(fd) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Close `*slot` with `close` and mark it closed on success. Negative slots
/// are left alone.
fn close_slot(
    slot: &mut RawFd,
    retry_eintr: bool,
    mut close: impl FnMut(RawFd) -> io::Result<()>,
) {
    if *slot < 0 {
        return;
    }

    loop {
        match close(*slot) {
            Ok(()) => {
                debug!("Closed fd {}", *slot);
                *slot = CLOSED_FD;
                return;
            }
            Err(e) if retry_eintr && e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("Unable to close fd {}: {}", *slot, e);
                return;
            }
        }
    }
}

impl<'a> Guard<CloseFd<'a>> {
    pub fn new(slot: &'a mut RawFd) -> Self {
        Self::armed(CloseFd { slot })
    }
}

impl<'a> Guard<CloseFdEintrSafe<'a>> {
    pub fn new(slot: &'a mut RawFd) -> Self {
        Self::armed(CloseFdEintrSafe { slot })
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::os::fd::IntoRawFd;

    use super::*;
    use crate::testutil::TempDir;

    fn open_fd(temp: &TempDir) -> RawFd {
        let path = temp.path().join("fd-target");
        File::create(&path).expect("create file").into_raw_fd()
    }

    fn is_open(fd: RawFd) -> bool {
        let rc = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        rc != -1
    }

    /// A `close` that is interrupted `interruptions` times before succeeding.
    fn interrupted_close(
        interruptions: usize,
        calls: &mut usize,
    ) -> impl FnMut(RawFd) -> io::Result<()> + '_ {
        move |_| {
            *calls += 1;
            if *calls <= interruptions {
                Err(io::Error::from_raw_os_error(libc::EINTR))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn closes_and_resets_slot() {
        let temp = TempDir::new("fd-closer");
        let mut fd = open_fd(&temp);
        let raw = fd;

        {
            let closer = FdCloser::new(&mut fd);
            assert_eq!(closer.resource().fd(), raw);
        }
        assert_eq!(fd, CLOSED_FD);
    }

    #[test]
    fn eintr_safe_closer_closes_and_resets_slot() {
        let temp = TempDir::new("fd-closer-eintr");
        let mut fd = open_fd(&temp);
        assert!(is_open(fd));

        drop(EintrSafeFdCloser::new(&mut fd));
        assert_eq!(fd, CLOSED_FD);
    }

    #[test]
    fn disarmed_closer_leaves_descriptor_open() {
        let temp = TempDir::new("fd-closer-keep");
        let mut fd = open_fd(&temp);

        {
            let mut closer = FdCloser::new(&mut fd);
            closer.disarm();
        }
        assert!(is_open(fd));
        assert_eq!(unsafe { libc::close(fd) }, 0);
    }

    #[test]
    fn closed_slot_is_skipped() {
        let mut fd = CLOSED_FD;
        drop(FdCloser::new(&mut fd));
        assert_eq!(fd, CLOSED_FD);
    }

    #[test]
    fn eintr_safe_close_retries_interrupted_close() {
        let mut fd: RawFd = 42;
        let mut calls = 0;
        close_slot(&mut fd, true, interrupted_close(2, &mut calls));
        assert_eq!(calls, 3);
        assert_eq!(fd, CLOSED_FD);
    }

    #[test]
    fn plain_close_gives_up_when_interrupted() {
        let mut fd: RawFd = 42;
        let mut calls = 0;
        close_slot(&mut fd, false, interrupted_close(1, &mut calls));
        assert_eq!(calls, 1);
        assert_eq!(fd, 42);
    }
}
