// 応答フレームのパーサー
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::dq::{BLOCK_RESPONSE, ED_RESPONSE, FILL, ResponseFrame, SYNC, StatusCode};
use nom::Parser;
use nom::bytes::streaming::take;
use nom::combinator::map;
use nom::number::streaming::u8 as byte;
use std::mem;

/// 応答IDに続く本体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub status: u8,
    pub data: Option<Vec<u8>>,
}

// 状態 + 1バイト
fn ed_body(input: &[u8]) -> nom::IResult<&[u8], Body> {
    map((byte, byte), |(status, level)| Body {
        status,
        data: Some(vec![level]),
    })
    .parse(input)
}

// 状態 + 長さ + データ
fn block_body(input: &[u8]) -> nom::IResult<&[u8], Body> {
    let (input, status) = byte(input)?;
    let (input, len) = byte(input)?;
    let (input, data) = take(len).parse(input)?;
    Ok((
        input,
        Body {
            status,
            data: Some(data.to_vec()),
        },
    ))
}

// 状態のみ
fn ack_body(input: &[u8]) -> nom::IResult<&[u8], Body> {
    map(byte, |status| Body { status, data: None }).parse(input)
}

/// 応答IDに従って本体を解析する
pub fn parse_body(frame_type: u8, input: &[u8]) -> nom::IResult<&[u8], Body> {
    match frame_type {
        ED_RESPONSE => ed_body(input),
        BLOCK_RESPONSE => block_body(input),
        _ => ack_body(input),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    SeekSync1,
    SeekSync2,
    ReadType,
    ReadBody { frame_type: u8, body: Vec<u8> },
}

/// 1バイトずつ与えて応答フレームを取り出す状態機械
///
/// 同期が崩れたバイトは読み捨てて、次のバイトから同期を探し直す。
/// 読んだバイトを押し戻すことはない。
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: State,
    anomalies: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: State::SeekSync1,
            anomalies: 0,
        }
    }

    /// 同期探索中に捨てた不正バイトの数
    pub fn anomalies(&self) -> usize {
        self.anomalies
    }

    /// 同期マーカーを待っているか
    pub fn is_idle(&self) -> bool {
        self.state == State::SeekSync1
    }

    fn anomaly(&mut self, val: u8) {
        self.anomalies += 1;
        tracing::warn!(target:"parser", "Bad character: {:?} {:02x}", val as char, val);
    }

    /// 1バイト与える。フレームが完成したら返す。
    pub fn push(&mut self, val: u8) -> Option<ResponseFrame> {
        match mem::replace(&mut self.state, State::SeekSync1) {
            State::SeekSync1 => {
                if val == SYNC[0] {
                    self.state = State::SeekSync2;
                } else if val != FILL {
                    self.anomaly(val);
                }
                None
            }
            State::SeekSync2 => {
                if val == SYNC[1] {
                    self.state = State::ReadType;
                } else if val != FILL {
                    self.anomaly(val);
                }
                None
            }
            State::ReadType => {
                self.state = State::ReadBody {
                    frame_type: val,
                    body: Vec::with_capacity(2),
                };
                None
            }
            State::ReadBody {
                frame_type,
                mut body,
            } => {
                body.push(val);
                match parse_body(frame_type, &body) {
                    Ok((_rest, Body { status, data })) => Some(ResponseFrame {
                        frame_type,
                        status: StatusCode::from(status),
                        data,
                    }),
                    Err(nom::Err::Incomplete(_)) => {
                        // つづけて次のバイトを読み込む
                        self.state = State::ReadBody { frame_type, body };
                        None
                    }
                    Err(e) => {
                        tracing::trace!(target:"parser", "{:?}", e);
                        None
                    }
                }
            }
        }
    }
}

#[cfg(test)]
fn feed(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<ResponseFrame> {
    bytes.iter().filter_map(|b| decoder.push(*b)).collect()
}

#[test]
fn test1() {
    assert_eq!(
        parse_body(0x84, &[0x00]).unwrap(),
        (
            &[][..],
            Body {
                status: 0,
                data: None
            }
        )
    );
    assert_eq!(
        parse_body(0x85, &[0x05, 0x2a]).unwrap(),
        (
            &[][..],
            Body {
                status: 5,
                data: Some(vec![0x2a])
            }
        )
    );
    assert_eq!(
        parse_body(0x8b, &[0x00, 0x03, 1, 2, 3]).unwrap(),
        (
            &[][..],
            Body {
                status: 0,
                data: Some(vec![1, 2, 3])
            }
        )
    );
    assert_eq!(
        parse_body(0x8b, &[0x01, 0x00]).unwrap(),
        (
            &[][..],
            Body {
                status: 1,
                data: Some(vec![])
            }
        )
    );
}

#[test]
fn test2() {
    // 足りない時は Incomplete
    assert!(matches!(
        parse_body(0x85, &[0x05]),
        Err(nom::Err::Incomplete(_))
    ));
    assert!(matches!(
        parse_body(0x8b, &[0x00, 0x03, 1, 2]),
        Err(nom::Err::Incomplete(_))
    ));
    assert!(matches!(
        parse_body(0x81, &[]),
        Err(nom::Err::Incomplete(_))
    ));
}

#[test]
fn test3() {
    let mut decoder = FrameDecoder::new();
    assert_eq!(
        feed(&mut decoder, &[0x7a, 0x62, 0x84, 0x00]),
        vec![ResponseFrame {
            frame_type: 0x84,
            status: StatusCode::Success,
            data: None,
        }]
    );
    assert!(decoder.is_idle());

    assert_eq!(
        feed(&mut decoder, &[0x7a, 0x62, 0x85, 0x05, 0x2a]),
        vec![ResponseFrame {
            frame_type: 0x85,
            status: StatusCode::Busy,
            data: Some(vec![0x2a]),
        }]
    );
    assert_eq!(decoder.anomalies(), 0);
}

#[test]
fn test4() {
    // 埋め草と不正バイトの後ろにあるフレームを取り出せる
    let frame = [0x7a, 0x62, 0x8b, 0x00, 0x02, 0xde, 0xad];
    for fills in [0usize, 1, 7] {
        for junk in [&[][..], &[0xff][..], &[0x01, b'b', 0x62, 0x85, 0x7b][..]] {
            let mut bytes = vec![FILL; fills];
            bytes.extend_from_slice(junk);
            bytes.extend(std::iter::repeat_n(FILL, fills));
            bytes.extend_from_slice(&frame);

            let mut decoder = FrameDecoder::new();
            assert_eq!(
                feed(&mut decoder, &bytes),
                vec![ResponseFrame {
                    frame_type: 0x8b,
                    status: StatusCode::Success,
                    data: Some(vec![0xde, 0xad]),
                }]
            );
            assert_eq!(decoder.anomalies(), junk.len());
        }
    }
}

#[test]
fn test5() {
    // 'z' 'z' では READ_TYPE に進まない
    let mut decoder = FrameDecoder::new();
    assert_eq!(feed(&mut decoder, b"zzb\x81\x00"), vec![]);
    assert_eq!(decoder.anomalies(), 3);
    assert!(decoder.is_idle());

    // 2つ目の 'z' の次から同期を探し直す
    let mut decoder = FrameDecoder::new();
    let frames = feed(&mut decoder, b"zzzb\x81\x00");
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].frame_type, 0x81);
    assert_eq!(decoder.anomalies(), 1);
}

#[test]
fn test6() {
    // SEEK_SYNC2 の埋め草は SEEK_SYNC1 に戻る
    let mut decoder = FrameDecoder::new();
    assert_eq!(feed(&mut decoder, b"z\x00b\x82\x00"), vec![]);
    assert_eq!(decoder.anomalies(), 2);

    // 同期後の 0x00 や 'z' は本体の値として読む
    let mut decoder = FrameDecoder::new();
    let frames = feed(&mut decoder, b"zb\x85\x00z");
    assert_eq!(
        frames,
        vec![ResponseFrame {
            frame_type: 0x85,
            status: StatusCode::Success,
            data: Some(vec![b'z']),
        }]
    );

    // 未知の状態コード
    let frames = feed(&mut decoder, b"zb\x87\x2a");
    assert_eq!(frames[0].status, StatusCode::Unknown(0x2a));
}
