// トランシーバーの状態コード
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use serde::Serialize;
use std::fmt;

/// 状態コード値から名前への対応表
const STATUS_NAMES: [&str; 9] = [
    "SUCCESS", // 0
    "RX_ON",   // 1
    "TX_ON",   // 2
    "TRX_OFF", // 3
    "IDLE",    // 4
    "BUSY",    // 5
    "BUSY_RX", // 6
    "BUSY_TX", // 7
    "ERR",     // 8
];

/// 応答フレームに含まれる状態コード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum StatusCode {
    Success,
    RxOn,
    TxOn,
    TrxOff,
    Idle,
    Busy,
    BusyRx,
    BusyTx,
    Err,
    /// 対応表にない値(9以上)
    Unknown(u8),
}

impl StatusCode {
    /// 記号名(対応表にない値はNone)
    pub fn name(&self) -> Option<&'static str> {
        STATUS_NAMES.get(u8::from(*self) as usize).copied()
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        *self == StatusCode::Success
    }

    /// BUSY または ERR
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, StatusCode::Busy | StatusCode::Err)
    }
}

impl From<u8> for StatusCode {
    fn from(value: u8) -> Self {
        match value {
            0 => StatusCode::Success,
            1 => StatusCode::RxOn,
            2 => StatusCode::TxOn,
            3 => StatusCode::TrxOff,
            4 => StatusCode::Idle,
            5 => StatusCode::Busy,
            6 => StatusCode::BusyRx,
            7 => StatusCode::BusyTx,
            8 => StatusCode::Err,
            n => StatusCode::Unknown(n),
        }
    }
}

impl From<StatusCode> for u8 {
    fn from(status: StatusCode) -> u8 {
        match status {
            StatusCode::Success => 0,
            StatusCode::RxOn => 1,
            StatusCode::TxOn => 2,
            StatusCode::TrxOff => 3,
            StatusCode::Idle => 4,
            StatusCode::Busy => 5,
            StatusCode::BusyRx => 6,
            StatusCode::BusyTx => 7,
            StatusCode::Err => 8,
            StatusCode::Unknown(n) => n,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "0x{:02x} ({})", u8::from(*self), name),
            None => write!(f, "0x{:02x}", u8::from(*self)),
        }
    }
}

#[test]
fn test1() {
    for n in 0..=8u8 {
        let status = StatusCode::from(n);
        assert_eq!(u8::from(status), n);
        assert_eq!(status.name(), Some(STATUS_NAMES[n as usize]));
    }
    assert_eq!(StatusCode::from(0), StatusCode::Success);
    assert_eq!(StatusCode::from(5).name(), Some("BUSY"));
    assert_eq!(StatusCode::from(8), StatusCode::Err);
}

#[test]
fn test2() {
    // 対応表にない値でもパニックしない
    let status = StatusCode::from(9);
    assert_eq!(status, StatusCode::Unknown(9));
    assert_eq!(status.name(), None);
    assert_eq!(u8::from(status), 9);
    assert_eq!(StatusCode::from(0xff).name(), None);
    assert_eq!(format!("{}", StatusCode::from(0xff)), "0xff");
    assert_eq!(format!("{}", StatusCode::Busy), "0x05 (BUSY)");
}

#[test]
fn test3() {
    assert!(StatusCode::Busy.is_failure());
    assert!(StatusCode::Err.is_failure());
    assert!(!StatusCode::BusyRx.is_failure());
    assert!(StatusCode::Success.is_success());
    assert_eq!(serde_json::to_string(&StatusCode::BusyTx).unwrap(), "7");
}
