//! 内置探测实现模块
//!
//! 提供HTTP可达性、DNS解析、TCP拨号与自定义函数探测

pub mod custom;
pub mod dns;
pub mod http;
pub mod ping;

pub use custom::CustomCheck;
pub use dns::{host_resolve_check, ResolveCheck};
pub use http::{HttpCheck, HttpCheckConfig};
pub use ping::{DialPinger, PingCheck, Pinger};
