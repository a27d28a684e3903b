//! Embedding layer for guests built against the `hello` C ABI.
//!
//! The guest owns its allocator and exports `memory`, `alloc`, `dealloc`
//! and `hello`. [`WasmHost`] resolves those, copies arguments in, and reads
//! the length-prefixed result back out.
//!
//! ```no_run
//! use hello_host::{HostConfig, WasmHost};
//!
//! let bytes = std::fs::read("hello_abi.wasm")?;
//! let mut host = WasmHost::load(&bytes, &HostConfig::default())?;
//! assert_eq!(host.call(Some("world"))?, "hello, world!");
//! # Ok::<(), anyhow::Error>(())
//! ```

mod config;
mod guest;
mod inspect;

pub use config::{HostConfig, DEFAULT_MAX_INPUT_LEN};
pub use guest::WasmHost;
pub use inspect::{start_function, text_exports, validate_wasm};
