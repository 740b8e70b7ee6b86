// ==========================================
// 设备维修工单系统 - 领域类型定义
// ==========================================
// 依据: 工单生命周期状态机
// 红线: 离开 CLOSED 只能走 Reopen,不能走普通状态更新
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工单状态 (Ticket Status)
// ==========================================
// 状态机: OPEN → {IN_PROGRESS, PENDING, CLOSED}
//         IN_PROGRESS → {PENDING, CLOSED}
//         PENDING → {IN_PROGRESS, CLOSED}
//         CLOSED → {IN_PROGRESS} (仅限 Reopen)
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,       // 新建
    InProgress, // 处理中
    Pending,    // 挂起等待
    Closed,     // 已关闭
}

impl TicketStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Pending => "PENDING",
            TicketStatus::Closed => "CLOSED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(TicketStatus::Open),
            "IN_PROGRESS" => Some(TicketStatus::InProgress),
            "PENDING" => Some(TicketStatus::Pending),
            "CLOSED" => Some(TicketStatus::Closed),
            _ => None,
        }
    }

    /// 判断普通状态更新 (SetStatus) 是否允许 from → to
    ///
    /// 说明:
    /// - 进入 CLOSED 属于正常转换 (关单)
    /// - 离开 CLOSED 一律禁止,只能通过 Reopen
    /// - CLOSED → CLOSED 允许进入引擎,由引擎做幂等无操作
    pub fn can_transition_to(&self, to: TicketStatus) -> bool {
        match (self, to) {
            (TicketStatus::Closed, TicketStatus::Closed) => true,
            (TicketStatus::Closed, _) => false,
            (_, _) => true,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 优先级 (Priority)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,    // 低
    Medium, // 中
    High,   // 高
}

impl Priority {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Priority::Low),
            "MEDIUM" => Some(Priority::Medium),
            "HIGH" => Some(Priority::High),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 故障类别 (Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Mechanical, // 机械
    Electrical, // 电气
    It,         // 信息系统
}

impl Category {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Category::Mechanical => "MECHANICAL",
            Category::Electrical => "ELECTRICAL",
            Category::It => "IT",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "MECHANICAL" => Some(Category::Mechanical),
            "ELECTRICAL" => Some(Category::Electrical),
            "IT" => Some(Category::It),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::from_str::<Priority>("\"MEDIUM\"").unwrap(),
            Priority::Medium
        );
        assert_eq!(
            serde_json::to_string(&Category::It).unwrap(),
            "\"IT\""
        );
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            TicketStatus::Open,
            TicketStatus::InProgress,
            TicketStatus::Pending,
            TicketStatus::Closed,
        ] {
            assert_eq!(TicketStatus::from_db_str(s.to_db_str()), Some(s));
        }
        assert_eq!(TicketStatus::from_db_str("RESOLVED"), None);
    }

    #[test]
    fn test_closed_only_leaves_via_reopen() {
        assert!(!TicketStatus::Closed.can_transition_to(TicketStatus::Open));
        assert!(!TicketStatus::Closed.can_transition_to(TicketStatus::InProgress));
        assert!(!TicketStatus::Closed.can_transition_to(TicketStatus::Pending));
        assert!(TicketStatus::Closed.can_transition_to(TicketStatus::Closed));
    }

    #[test]
    fn test_open_states_transition_freely() {
        for from in [
            TicketStatus::Open,
            TicketStatus::InProgress,
            TicketStatus::Pending,
        ] {
            for to in [
                TicketStatus::Open,
                TicketStatus::InProgress,
                TicketStatus::Pending,
                TicketStatus::Closed,
            ] {
                assert!(from.can_transition_to(to), "{} → {} 应当允许", from, to);
            }
        }
    }
}
