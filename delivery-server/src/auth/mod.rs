//! 认证模块 - JWT 验证与请求身份提取
//!
//! 登录/口令等认证机制由外部层负责；这里只验证令牌并提取身份。

pub mod extractor;
pub mod jwt;

pub use extractor::{CurrentAdmin, CurrentDriver, CustomerPhone};
pub use jwt::{Claims, JwtService};
