//! # nnb-module — Backend implementations
//!
//! This crate provides the implementations behind the `nnb-core` traits.
//! The default is self-contained and needs nothing installed; the real
//! library binding lives behind a feature flag.
//!
//! ## Default stack
//!
//! | Trait / concern  | Default Impl    | Feature-gated alternative    |
//! |------------------|-----------------|------------------------------|
//! | Backend          | MemoryBackend   | NanomsgBackend (`nanomsg`)   |
//! | Wait-handle      | EventFd         | library-owned fds (`nanomsg`)|
//! | Error text       | errno::describe | `nn_strerror` (`nanomsg`)    |
//!
//! [`DefaultBackend`] names whichever backend the build selected.

pub mod errno;
pub mod eventfd;
pub mod memory;

#[cfg(feature = "nanomsg")]
pub mod nanomsg;

pub use memory::MemoryBackend;
#[cfg(feature = "nanomsg")]
pub use nanomsg::NanomsgBackend;

cfg_if::cfg_if! {
    if #[cfg(feature = "nanomsg")] {
        pub type DefaultBackend = NanomsgBackend;
    } else {
        pub type DefaultBackend = MemoryBackend;
    }
}
