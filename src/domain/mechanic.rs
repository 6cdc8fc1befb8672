// ==========================================
// 汽车维修派工系统 - 技师领域模型
// ==========================================
// 红线: current_load 只能由派工引擎提交修改
// 红线: 状态 (Available/Busy) 永不落库,始终由负载推导
// ==========================================

use crate::domain::types::MechanicStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Mechanic - 技师
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mechanic {
    // ===== 主键与身份 =====
    pub mechanic_id: String,      // 技师ID
    pub name: String,             // 姓名
    pub specialization: String,   // 专长 (发动机/变速箱/制动等)
    pub experience_years: i32,    // 从业年限
    pub rating: f64,              // 评分 [0,5]

    // ===== 负载 =====
    pub current_load: i32,        // 当前在修工单数 (>= 0)
    pub max_load: i32,            // 最大并行工单数 (> 0)

    // ===== 审计字段 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Mechanic {
    /// 推导技师状态
    ///
    /// 不存储、不缓存: `current_load < max_load` 即可接单
    pub fn status(&self) -> MechanicStatus {
        if self.current_load < self.max_load {
            MechanicStatus::Available
        } else {
            MechanicStatus::Busy
        }
    }
}

// ==========================================
// Trait: CapacityCheck
// ==========================================
// 用途: 派工引擎产能校验接口
pub trait CapacityCheck {
    /// 是否还能接单
    fn can_take_order(&self) -> bool;

    /// 剩余产能 (可再接工单数)
    fn remaining_slots(&self) -> i32;

    /// 是否已满载
    fn is_at_capacity(&self) -> bool;
}

impl CapacityCheck for Mechanic {
    fn can_take_order(&self) -> bool {
        self.current_load < self.max_load
    }

    fn remaining_slots(&self) -> i32 {
        (self.max_load - self.current_load).max(0)
    }

    fn is_at_capacity(&self) -> bool {
        self.current_load >= self.max_load
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_mechanic(current_load: i32, max_load: i32) -> Mechanic {
        Mechanic {
            mechanic_id: "M001".to_string(),
            name: "Bennet".to_string(),
            specialization: "Engine".to_string(),
            experience_years: 8,
            rating: 4.7,
            current_load,
            max_load,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_status_derived_from_load() {
        assert_eq!(make_mechanic(0, 4).status(), MechanicStatus::Available);
        assert_eq!(make_mechanic(3, 4).status(), MechanicStatus::Available);
        assert_eq!(make_mechanic(4, 4).status(), MechanicStatus::Busy);
    }

    #[test]
    fn test_capacity_check() {
        let m = make_mechanic(3, 4);
        assert!(m.can_take_order());
        assert_eq!(m.remaining_slots(), 1);
        assert!(!m.is_at_capacity());

        let full = make_mechanic(4, 4);
        assert!(!full.can_take_order());
        assert_eq!(full.remaining_slots(), 0);
        assert!(full.is_at_capacity());
    }
}
