// チャンネル毎にエネルギー検出を行う
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::dq::wait_state::{self, PollError};
use crate::dq::{DeviceMode, DeviceSession, StatusCode};
use crate::scan_settings::ScanSettings;
use anyhow::{Context, bail};
use serde::Serialize;
use std::io;
use std::thread;

/// 1チャンネル分の検出結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdReading {
    pub channel: u8,
    pub status: StatusCode,
    pub status_name: Option<&'static str>,
    pub level: u8,
}

/// EDスキャンを実行する
pub fn ed_scan<C: io::Read + io::Write>(
    session: &mut DeviceSession<C>,
    settings: &ScanSettings,
) -> anyhow::Result<Vec<EdReading>> {
    let policy = settings.retry_policy();
    let mut found = Vec::<EdReading>::new();
    for channel in settings.FirstChannel..=settings.LastChannel {
        let status = session
            .set_channel(channel)
            .with_context(|| format!("set_channel({channel}) failed!"))?;
        tracing::info!("Result of set_channel {channel}: {status}");
        thread::sleep(settings.settle_time());

        // 受信モードに切り替わるまで待つ
        match wait_state::wait_for_state(session, DeviceMode::Rx, &policy) {
            Ok(_) => {}
            Err(PollError::Exhausted { last, .. }) if !last.is_failure() => {
                tracing::warn!("channel {channel}: RX mode not confirmed, last status {last}");
            }
            Err(e @ PollError::Exhausted { .. }) => bail!("Unable to set RX mode: {e}"),
            Err(PollError::Session(e)) => return Err(e).context("set_state failed!"),
        }

        let (status, level) = session.ed().context("ed failed!")?;
        tracing::info!("Result of ed for {channel} is {status} 0x{level:02x}");
        found.push(EdReading {
            channel,
            status,
            status_name: status.name(),
            level,
        });
    }
    Ok(found)
}

#[cfg(test)]
use crate::dq::session::Loopback;

#[cfg(test)]
fn quick_settings(first: u8, last: u8) -> ScanSettings {
    ScanSettings {
        FirstChannel: first,
        LastChannel: last,
        SettleMillis: 0,
        RetryLimit: 3,
        RetryIntervalMillis: 0,
        ..Default::default()
    }
}

#[test]
fn test1() {
    let responses = [
        &b"zb\x84\x00zb\x87\x05zb\x87\x00zb\x85\x00\x10"[..],
        &b"zb\x84\x00zb\x87\x00zb\x85\x00\x42"[..],
    ]
    .concat();
    let mut session = DeviceSession::new(Loopback::new(&responses));
    let found = ed_scan(&mut session, &quick_settings(4, 5)).unwrap();
    assert_eq!(
        found,
        vec![
            EdReading {
                channel: 4,
                status: StatusCode::Success,
                status_name: Some("SUCCESS"),
                level: 0x10,
            },
            EdReading {
                channel: 5,
                status: StatusCode::Success,
                status_name: Some("SUCCESS"),
                level: 0x42,
            },
        ]
    );
    let tx = session.into_inner().tx;
    assert!(tx.starts_with(b"zb\x04\x04zb\x07\x02zb\x07\x02zb\x05zb\x04\x05"));
}

#[test]
fn test2() {
    // ERRのままなら中断する
    let responses = [&b"zb\x84\x00"[..], &b"zb\x87\x08".repeat(3)].concat();
    let mut session = DeviceSession::new(Loopback::new(&responses));
    assert!(ed_scan(&mut session, &quick_settings(1, 2)).is_err());
    // ED は送っていない
    let tx = session.into_inner().tx;
    assert_eq!(tx.len(), 4 + 3 * 4);
}
