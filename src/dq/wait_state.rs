// 動作モードの切り替えを待つ
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::dq::{DeviceMode, DeviceSession, StatusCode, session};
use std::io;
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("session")]
    Session(#[from] session::Error),
    #[error("{mode} モードに切り替えられませんでした。 {attempts} 回試行, 最後の状態 {last}")]
    Exhausted {
        mode: DeviceMode,
        attempts: usize,
        last: StatusCode,
    },
}

/// 再試行の方針
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 60,
            interval: Duration::from_secs(1),
        }
    }
}

/// SUCCESSが返るまで set_state を繰り返す
///
/// 試行回数は attempts 回まで。0回なら1回だけ試す。
pub fn wait_for_state<C: io::Read + io::Write>(
    session: &mut DeviceSession<C>,
    mode: DeviceMode,
    policy: &RetryPolicy,
) -> Result<StatusCode, PollError> {
    let attempts = policy.attempts.max(1);
    let mut n = 0;
    loop {
        n += 1;
        let status = session.set_state(mode)?;
        tracing::debug!("set_state({mode}) #{n}: {status}");
        if status.is_success() {
            return Ok(status);
        }
        if n >= attempts {
            return Err(PollError::Exhausted {
                mode,
                attempts,
                last: status,
            });
        }
        thread::sleep(policy.interval);
    }
}

#[cfg(test)]
use crate::dq::session::Loopback;

#[test]
fn test1() {
    let policy = RetryPolicy {
        attempts: 5,
        interval: Duration::ZERO,
    };
    let mut session = DeviceSession::new(Loopback::new(b"zb\x87\x05zb\x87\x06zb\x87\x00"));
    assert_eq!(
        wait_for_state(&mut session, DeviceMode::Rx, &policy).unwrap(),
        StatusCode::Success
    );
    assert_eq!(session.into_inner().tx, b"zb\x07\x02zb\x07\x02zb\x07\x02");
}

#[test]
fn test2() {
    // 試行回数で打ち切る
    let policy = RetryPolicy {
        attempts: 3,
        interval: Duration::ZERO,
    };
    let responses = b"zb\x87\x05".repeat(10);
    let mut session = DeviceSession::new(Loopback::new(&responses));
    match wait_for_state(&mut session, DeviceMode::Rx, &policy) {
        Err(PollError::Exhausted {
            mode,
            attempts,
            last,
        }) => {
            assert_eq!(mode, DeviceMode::Rx);
            assert_eq!(attempts, 3);
            assert_eq!(last, StatusCode::Busy);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(session.into_inner().tx.len(), 3 * 4);
}

#[test]
fn test3() {
    let mut session = DeviceSession::new(Loopback::new(b"zb\x81\x00"));
    assert!(matches!(
        wait_for_state(&mut session, DeviceMode::Idle, &RetryPolicy::default()),
        Err(PollError::Session(session::Error::Protocol {
            expected: 0x87,
            got: 0x81
        }))
    ));
}
