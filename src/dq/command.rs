// トランシーバーへのコマンド
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use thiserror::Error;

/// フレーム同期マーカー "zb"
pub const SYNC: [u8; 2] = *b"zb";

/// 回線が送ってくる埋め草
pub const FILL: u8 = 0x00;

/// 応答IDはコマンド番号にこのビットを立てたもの
pub const ACK_FLAG: u8 = 0x80;

/// SendBlockで送れる最大長
pub const MAX_BLOCK_LEN: usize = u8::MAX as usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("payload too long. {0} bytes (max 255)")]
    PayloadTooLong(usize),
}

/// 動作モード(1は欠番)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceMode {
    Idle = 0,
    Rx = 2,
    Tx = 3,
}

impl std::fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DeviceMode::Idle => write!(f, "IDLE"),
            DeviceMode::Rx => write!(f, "RX"),
            DeviceMode::Tx => write!(f, "TX"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Open,
    Close,
    SetChannel(u8),
    Ed,
    Cca,
    SetState(DeviceMode),
    SendBlock(&'a [u8]),
}

impl<'a> Command<'a> {
    /// コマンド番号
    pub fn opcode(&self) -> u8 {
        match self {
            Command::Open => 0x01,
            Command::Close => 0x02,
            Command::SetChannel(_) => 0x04,
            Command::Ed => 0x05,
            Command::Cca => 0x06,
            Command::SetState(_) => 0x07,
            Command::SendBlock(_) => 0x09,
        }
    }

    /// このコマンドに対する応答ID
    #[inline]
    pub fn ack_id(&self) -> u8 {
        self.opcode() | ACK_FLAG
    }

    /// 送信するバイト列にする
    pub fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        let mut bytes = Vec::with_capacity(4);
        bytes.extend_from_slice(&SYNC);
        bytes.push(self.opcode());
        match self {
            Command::Open | Command::Close | Command::Ed | Command::Cca => {}
            Command::SetChannel(channel) => bytes.push(*channel),
            Command::SetState(mode) => bytes.push(*mode as u8),
            Command::SendBlock(payload) => {
                // 切り詰めずに拒否する
                let len = u8::try_from(payload.len())
                    .map_err(|_| EncodingError::PayloadTooLong(payload.len()))?;
                bytes.push(len);
                bytes.extend_from_slice(payload);
            }
        }
        Ok(bytes)
    }
}

#[test]
fn test1() {
    assert_eq!(Command::Open.encode().unwrap(), b"zb\x01");
    assert_eq!(Command::Close.encode().unwrap(), b"zb\x02");
    assert_eq!(
        Command::SetChannel(4).encode().unwrap(),
        vec![0x7a, 0x62, 0x04, 0x04]
    );
    assert_eq!(Command::Ed.encode().unwrap(), vec![0x7a, 0x62, 0x05]);
    assert_eq!(Command::Cca.encode().unwrap(), b"zb\x06");
    assert_eq!(
        Command::SetState(DeviceMode::Rx).encode().unwrap(),
        b"zb\x07\x02"
    );
    assert_eq!(
        Command::SendBlock(b"zzz").encode().unwrap(),
        b"zb\x09\x03zzz"
    );
}

#[test]
fn test2() {
    assert_eq!(DeviceMode::Idle as u8, 0);
    assert_eq!(DeviceMode::Rx as u8, 2);
    assert_eq!(DeviceMode::Tx as u8, 3);

    assert_eq!(Command::Open.ack_id(), 0x81);
    assert_eq!(Command::Close.ack_id(), 0x82);
    assert_eq!(Command::SetChannel(11).ack_id(), 0x84);
    assert_eq!(Command::Ed.ack_id(), 0x85);
    assert_eq!(Command::Cca.ack_id(), 0x86);
    assert_eq!(Command::SetState(DeviceMode::Tx).ack_id(), 0x87);
    assert_eq!(Command::SendBlock(&[]).ack_id(), 0x89);
}

#[test]
fn test3() {
    let max = [0xaau8; MAX_BLOCK_LEN];
    let encoded = Command::SendBlock(&max).encode().unwrap();
    assert_eq!(encoded.len(), 3 + 1 + 255);
    assert_eq!(encoded[3], 0xff);

    let too_long = [0u8; 256];
    assert_eq!(
        Command::SendBlock(&too_long).encode(),
        Err(EncodingError::PayloadTooLong(256))
    );

    // 空のブロックは長さ0で送る
    assert_eq!(Command::SendBlock(&[]).encode().unwrap(), b"zb\x09\x00");
}
