// トランシーバーからの応答
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::dq::StatusCode;
use std::fmt;

/// EDの応答ID(状態 + 1バイト)
pub const ED_RESPONSE: u8 = 0x85;

/// 可変長ブロックの応答ID(状態 + 長さ + データ)
pub const BLOCK_RESPONSE: u8 = 0x8b;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub frame_type: u8,        // 応答ID
    pub status: StatusCode,    // 状態コード
    pub data: Option<Vec<u8>>, // 0x85, 0x8Bのみ
}

impl ResponseFrame {
    /// ED応答のエネルギー値
    pub fn energy_level(&self) -> Option<u8> {
        match self.frame_type {
            ED_RESPONSE => self.data.as_deref().and_then(|d| d.first().copied()),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "id=0x{:02X} status={}", self.frame_type, self.status)?;
        if let Some(data) = &self.data {
            write!(
                f,
                " data=[{}]",
                data.iter()
                    .map(|x| format!("{:02X}", x))
                    .collect::<Vec<String>>()
                    .join(" ")
            )?;
        }
        Ok(())
    }
}

#[test]
fn test1() {
    let frame = ResponseFrame {
        frame_type: 0x85,
        status: StatusCode::Busy,
        data: Some(vec![0x2a]),
    };
    assert_eq!(frame.energy_level(), Some(0x2a));
    assert_eq!(frame.to_string(), "id=0x85 status=0x05 (BUSY) data=[2A]");

    let ack = ResponseFrame {
        frame_type: 0x84,
        status: StatusCode::Success,
        data: None,
    };
    assert_eq!(ack.energy_level(), None);
    assert_eq!(ack.to_string(), "id=0x84 status=0x00 (SUCCESS)");
}
