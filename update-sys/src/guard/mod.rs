// SPDX-License-Identifier: GPL-3.0-only

//! Scoped resource guards
//!
//! A [`Guard`] owns one resource and releases it exactly once: when it is
//! dropped, or earlier through [`Guard::release_now`]. [`Guard::disarm`]
//! cancels the release for good. Guards are move-only, so a release can
//! never fire from two copies.
//!
//! Release failures are logged by the resource and never propagate out of
//! `drop`.

pub mod action;
pub mod fd;
pub mod mount;
pub mod path;

pub use action::{ActionCompleter, CompleteAction};
pub use fd::{CLOSED_FD, CloseFd, CloseFdEintrSafe, EintrSafeFdCloser, FdCloser};
pub use mount::{FilesystemUnmounter, TempUnmount, TempUnmounter, Unmount};
pub use path::{DirRemover, PathUnlinker, RemoveDir, Unlink};

/// Cleanup performed by a [`Guard`].
pub trait Release {
    /// Release the resource. Errors are reported here, not returned.
    fn release(&mut self);
}

#[derive(Debug)]
pub struct Guard<R: Release> {
    resource: R,
    armed: bool,
}

impl<R: Release> Guard<R> {
    pub fn armed(resource: R) -> Self {
        Self {
            resource,
            armed: true,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Skip the release. Cannot be undone.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Release now instead of at scope exit.
    pub fn release_now(&mut self) {
        if self.armed {
            self.armed = false;
            self.resource.release();
        }
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut R {
        &mut self.resource
    }
}

impl<R: Release> Drop for Guard<R> {
    fn drop(&mut self) {
        self.release_now();
    }
}
