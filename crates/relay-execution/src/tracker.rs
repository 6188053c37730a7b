//! 미체결 주문 추적.
//!
//! 주문 유형별(롱 신규/롱 청산/숏 신규/숏 청산)로 거래소가 아직 종료 상태를
//! 보고하지 않은 주문 ID를 관리합니다. 하나의 ID는 최대 한 집합에만 속합니다.

use std::collections::{BTreeMap, BTreeSet};

use relay_core::{OrderCategory, OrderId};

/// 유형별 미체결 주문 ID 집합.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderTracker {
    open_long_ids: BTreeSet<OrderId>,
    close_long_ids: BTreeSet<OrderId>,
    open_short_ids: BTreeSet<OrderId>,
    close_short_ids: BTreeSet<OrderId>,
}

impl OrderTracker {
    /// 빈 추적기 생성.
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, category: OrderCategory) -> &BTreeSet<OrderId> {
        match category {
            OrderCategory::OpenLong => &self.open_long_ids,
            OrderCategory::CloseLong => &self.close_long_ids,
            OrderCategory::OpenShort => &self.open_short_ids,
            OrderCategory::CloseShort => &self.close_short_ids,
        }
    }

    fn set_mut(&mut self, category: OrderCategory) -> &mut BTreeSet<OrderId> {
        match category {
            OrderCategory::OpenLong => &mut self.open_long_ids,
            OrderCategory::CloseLong => &mut self.close_long_ids,
            OrderCategory::OpenShort => &mut self.open_short_ids,
            OrderCategory::CloseShort => &mut self.close_short_ids,
        }
    }

    /// 유형의 집합을 주어진 ID로 교체.
    ///
    /// 다른 유형에 같은 ID가 있으면 먼저 제거합니다.
    pub fn replace(&mut self, category: OrderCategory, ids: impl IntoIterator<Item = OrderId>) {
        let ids: BTreeSet<OrderId> = ids.into_iter().collect();
        for other in OrderCategory::ALL {
            if other != category {
                let set = self.set_mut(other);
                set.retain(|id| !ids.contains(id));
            }
        }
        *self.set_mut(category) = ids;
    }

    /// ID 제거. 포함되어 있던 유형을 반환하며, 없으면 `None` (반복 호출 안전).
    pub fn remove(&mut self, order_id: &str) -> Option<OrderCategory> {
        OrderCategory::ALL
            .into_iter()
            .find(|&category| self.set_mut(category).remove(order_id))
    }

    /// 유형에 미체결 주문이 있는지 여부.
    pub fn is_outstanding(&self, category: OrderCategory) -> bool {
        !self.set(category).is_empty()
    }

    /// 유형의 집합 비우기.
    pub fn clear(&mut self, category: OrderCategory) {
        self.set_mut(category).clear();
    }

    /// 유형별 미체결 개수.
    pub fn len(&self, category: OrderCategory) -> usize {
        self.set(category).len()
    }

    /// 전체 미체결 주문이 없는지 여부.
    pub fn is_empty(&self) -> bool {
        OrderCategory::ALL
            .into_iter()
            .all(|category| self.set(category).is_empty())
    }

    /// 전체 미체결 주문 ID (추적 순서: 롱 신규 → 롱 청산 → 숏 신규 → 숏 청산).
    pub fn outstanding_ids(&self) -> Vec<OrderId> {
        OrderCategory::ALL
            .into_iter()
            .flat_map(|category| self.set(category).iter().cloned())
            .collect()
    }

    /// 유형별 미체결 개수 맵 (스냅샷용).
    pub fn counts(&self) -> BTreeMap<OrderCategory, usize> {
        OrderCategory::ALL
            .into_iter()
            .map(|category| (category, self.len(category)))
            .collect()
    }
}
