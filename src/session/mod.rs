//! 学习会话与测试的内存状态机
//!
//! 两个控制器都只持有当前会话的工作集和游标，不访问存储；
//! 结束后的会话记录由调用方交给 [`crate::progress::ProgressService`] 持久化。

pub mod study;

pub use study::StudySessionState;
pub use test::{TestScore, TestSessionState, PASSING_SCORE};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("学习会话的单词列表为空")]
    EmptyWordList,
}

pub type SessionResult<T> = Result<T, SessionError>;
