//! 제어 요청 수락 판단.
//!
//! 출처가 0이 아닌 요청은 진행 중인 시그니처와 다르면 거부됩니다.
//! 서로 다른 출처가 같은 포지션을 동시에 제어하지 못하게 하기 위함입니다.

use relay_core::{signature_from_raw, CommandCode, ControlRequest, Directive, Target};
use tracing::{debug, info, warn};

use crate::state::PositionState;

/// 수락 판단 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// 수락됨 (큐에 적재할 지시)
    Admitted(Directive),
    /// 진행 중인 시그니처와 충돌
    Conflict { current: i64, received: i64 },
    /// 알 수 없는 코드이거나 현재 상태에서 의미 없는 요청
    Ignored,
}

/// 제어 요청을 현재 상태에 비추어 판단하고, 수락 시 시그니처를 즉시 갱신.
///
/// 거부/무시된 요청은 상태를 변경하지 않습니다.
pub fn admit(state: &mut PositionState, request: &ControlRequest) -> Admission {
    debug!(
        signature = ?state.current_signature,
        target = %state.target,
        long = state.long_open_pending,
        short = state.short_open_pending,
        key = %request.key,
        sign = request.signature,
        "제어 요청 수신"
    );

    if let Some(current) = state.current_signature {
        if !request.is_privileged_origin() && request.signature != current {
            warn!(
                current,
                received = request.signature,
                key = %request.key,
                target = %state.target,
                "요청 충돌 - 진행 중인 지시와 시그니처가 다름"
            );
            return Admission::Conflict {
                current,
                received: request.signature,
            };
        }
    }

    let Some(command) = request.command else {
        debug!(key = %request.key, "알 수 없는 명령 코드 - 무시");
        return Admission::Ignored;
    };

    let allowed = match command {
        CommandCode::OpenLong => !state.long_open_pending,
        CommandCode::OpenShort => !state.short_open_pending,
        CommandCode::CancelAll | CommandCode::CloseAll => true,
        CommandCode::CloseLongVariant | CommandCode::CloseShortVariant => {
            state.target != Target::Flat
        }
    };

    if !allowed {
        debug!(%command, target = %state.target, "현재 상태에서 의미 없는 요청 - 무시");
        return Admission::Ignored;
    }

    let directive = Directive::new(command, request.signature);
    state.current_signature = signature_from_raw(request.signature);

    info!(
        %command,
        sign = request.signature,
        stamp = %request.stamp,
        bid = %state.last_bid,
        ask = %state.last_ask,
        "요청 수락"
    );

    Admission::Admitted(directive)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(flag: &str, sign: &str, key: &str) -> ControlRequest {
        ControlRequest::parse(flag, sign, key, "0").unwrap()
    }

    #[test]
    fn test_open_long_admitted_when_flat() {
        let mut state = PositionState::new();
        let admission = admit(&mut state, &request("1", "5", "1"));

        assert!(matches!(
            admission,
            Admission::Admitted(Directive { target: Target::Long, signature: 5, .. })
        ));
        assert_eq!(state.current_signature, Some(5));
        // 목표는 큐에서 꺼낼 때 변경됨
        assert_eq!(state.target, Target::Flat);
    }

    #[test]
    fn test_open_long_ignored_when_long_pending() {
        let mut state = PositionState::new();
        state.long_open_pending = true;
        state.target = Target::Long;

        assert_eq!(admit(&mut state, &request("1", "5", "1")), Admission::Ignored);
        assert_eq!(state.current_signature, None);
    }

    #[test]
    fn test_open_short_guard() {
        let mut state = PositionState::new();
        state.short_open_pending = true;
        assert_eq!(admit(&mut state, &request("1", "3", "2")), Admission::Ignored);

        state.short_open_pending = false;
        assert!(matches!(
            admit(&mut state, &request("1", "3", "2")),
            Admission::Admitted(Directive { target: Target::Short, .. })
        ));
    }

    #[test]
    fn test_conflicting_signature_rejected() {
        let mut state = PositionState::new();
        state.current_signature = Some(5);
        let before = state.clone();

        let admission = admit(&mut state, &request("1", "7", "0"));
        assert_eq!(
            admission,
            Admission::Conflict {
                current: 5,
                received: 7
            }
        );
        assert_eq!(state, before);

        // 같은 시그니처는 정상 처리
        assert!(matches!(
            admit(&mut state, &request("1", "5", "0")),
            Admission::Admitted(_)
        ));
    }

    #[test]
    fn test_privileged_origin_bypasses_conflict() {
        let mut state = PositionState::new();
        state.current_signature = Some(5);

        let admission = admit(&mut state, &request("0", "7", "9"));
        assert!(matches!(
            admission,
            Admission::Admitted(Directive { target: Target::Cancel, signature: 7, .. })
        ));
        assert_eq!(state.current_signature, Some(7));
    }

    #[test]
    fn test_close_variants_require_active_target() {
        let mut state = PositionState::new();
        for key in ["3", "4", "5", "6"] {
            assert_eq!(admit(&mut state, &request("1", "2", key)), Admission::Ignored);
        }

        state.target = Target::Short;
        for key in ["3", "4", "5", "6"] {
            assert!(matches!(
                admit(&mut state, &request("1", "2", key)),
                Admission::Admitted(Directive { target: Target::Flat, .. })
            ));
        }
    }

    #[test]
    fn test_close_all_always_admitted() {
        let mut state = PositionState::new();
        assert!(matches!(
            admit(&mut state, &request("1", "6", "0")),
            Admission::Admitted(Directive { target: Target::Flat, .. })
        ));
    }

    #[test]
    fn test_unknown_code_ignored() {
        let mut state = PositionState::new();
        assert_eq!(admit(&mut state, &request("1", "6", "8")), Admission::Ignored);
        assert_eq!(state.current_signature, None);
    }
}
