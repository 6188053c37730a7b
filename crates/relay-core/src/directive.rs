//! 제어 채널 요청 및 지시(Directive).
//!
//! 제어 요청은 `flag`(요청 출처), `sign`(시그니처), `key`(명령 코드), `stamp`(타임스탬프)
//! 네 개의 문자열로 전달됩니다. 이 모듈은 문자열 파싱만 담당하며,
//! 수락 여부 판단은 포지션 상태를 소유한 컨트롤러에서 수행합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{RelayError, Result, Target};

/// 제어 명령 코드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCode {
    /// `1` 롱 신규
    OpenLong,
    /// `2` 숏 신규
    OpenShort,
    /// `9` 전체 취소
    CancelAll,
    /// `0` 전체 청산
    CloseAll,
    /// `3`/`5` 롱 측 청산 요청 (목표가 0이 아닐 때만)
    CloseLongVariant,
    /// `4`/`6` 숏 측 청산 요청 (목표가 0이 아닐 때만)
    CloseShortVariant,
}

impl CommandCode {
    /// `key` 문자열에서 변환. 알 수 없는 코드는 `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "1" => Some(Self::OpenLong),
            "2" => Some(Self::OpenShort),
            "9" => Some(Self::CancelAll),
            "0" => Some(Self::CloseAll),
            "3" | "5" => Some(Self::CloseLongVariant),
            "4" | "6" => Some(Self::CloseShortVariant),
            _ => None,
        }
    }

    /// 명령이 의미하는 목표 포지션.
    pub fn target(self) -> Target {
        match self {
            Self::OpenLong => Target::Long,
            Self::OpenShort => Target::Short,
            Self::CancelAll => Target::Cancel,
            Self::CloseAll | Self::CloseLongVariant | Self::CloseShortVariant => Target::Flat,
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenLong => "open_long",
            Self::OpenShort => "open_short",
            Self::CancelAll => "cancel_all",
            Self::CloseAll => "close_all",
            Self::CloseLongVariant => "close_long",
            Self::CloseShortVariant => "close_short",
        };
        f.write_str(name)
    }
}

/// 파싱된 제어 요청.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRequest {
    /// 요청 출처. 파싱 불가한 값은 `None`(0이 아닌 출처로 취급)
    pub origin: Option<i64>,
    /// 요청 시그니처
    pub signature: i64,
    /// 명령 코드 (알 수 없는 코드는 `None`)
    pub command: Option<CommandCode>,
    /// 원본 명령 코드 문자열 (로그용)
    pub key: String,
    /// 요청 타임스탬프 (해석하지 않고 로그에만 사용)
    pub stamp: String,
}

impl ControlRequest {
    /// 쿼리 문자열 값에서 요청 생성.
    ///
    /// # Errors
    ///
    /// `sign`이 정수가 아니면 `RelayError::InvalidRequest`를 반환합니다.
    pub fn parse(flag: &str, sign: &str, key: &str, stamp: &str) -> Result<Self> {
        let signature = sign
            .trim()
            .parse::<i64>()
            .map_err(|_| RelayError::InvalidRequest(format!("sign 파싱 실패: {:?}", sign)))?;

        Ok(Self {
            origin: flag.trim().parse::<i64>().ok(),
            signature,
            command: CommandCode::from_key(key),
            key: key.to_string(),
            stamp: stamp.to_string(),
        })
    }

    /// 출처가 0(충돌 검사 면제)인지 여부.
    pub fn is_privileged_origin(&self) -> bool {
        self.origin == Some(0)
    }
}

/// 큐에 적재되는 지시.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// 목표 포지션
    pub target: Target,
    /// 시그니처
    pub signature: i64,
    /// 원본 명령
    pub command: CommandCode,
}

impl Directive {
    /// 명령 코드에서 지시 생성.
    pub fn new(command: CommandCode, signature: i64) -> Self {
        Self {
            target: command.target(),
            signature,
            command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_codes() {
        assert_eq!(CommandCode::from_key("1"), Some(CommandCode::OpenLong));
        assert_eq!(CommandCode::from_key("2"), Some(CommandCode::OpenShort));
        assert_eq!(CommandCode::from_key("9"), Some(CommandCode::CancelAll));
        assert_eq!(CommandCode::from_key("0"), Some(CommandCode::CloseAll));
        assert_eq!(CommandCode::from_key("5"), Some(CommandCode::CloseLongVariant));
        assert_eq!(CommandCode::from_key("6"), Some(CommandCode::CloseShortVariant));
        assert_eq!(CommandCode::from_key("7"), None);
        assert_eq!(CommandCode::from_key(""), None);
    }

    #[test]
    fn test_command_targets() {
        assert_eq!(CommandCode::OpenLong.target(), Target::Long);
        assert_eq!(CommandCode::OpenShort.target(), Target::Short);
        assert_eq!(CommandCode::CancelAll.target(), Target::Cancel);
        assert_eq!(CommandCode::CloseShortVariant.target(), Target::Flat);
    }

    #[test]
    fn test_parse_request() {
        let request = ControlRequest::parse("3", "17", "1", "1718000000").unwrap();
        assert_eq!(request.origin, Some(3));
        assert_eq!(request.signature, 17);
        assert_eq!(request.command, Some(CommandCode::OpenLong));
        assert!(!request.is_privileged_origin());

        let privileged = ControlRequest::parse("0", "-1", "0", "").unwrap();
        assert!(privileged.is_privileged_origin());
        assert_eq!(privileged.signature, -1);
    }

    #[test]
    fn test_parse_unparsable_flag_is_not_privileged() {
        let request = ControlRequest::parse("", "4", "2", "").unwrap();
        assert_eq!(request.origin, None);
        assert!(!request.is_privileged_origin());
    }

    #[test]
    fn test_parse_invalid_sign() {
        let result = ControlRequest::parse("1", "abc", "1", "");
        assert!(matches!(result, Err(RelayError::InvalidRequest(_))));
    }

    #[test]
    fn test_parse_unknown_key_keeps_raw() {
        let request = ControlRequest::parse("1", "8", "42", "").unwrap();
        assert_eq!(request.command, None);
        assert_eq!(request.key, "42");
    }
}
