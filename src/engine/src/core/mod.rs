//! 核心业务逻辑模块

pub mod cache;
pub mod clock;
pub mod notification;
pub mod prize;
pub mod provider;
pub mod schedule;
pub mod verification;
